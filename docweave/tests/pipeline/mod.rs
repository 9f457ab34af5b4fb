//! Pipeline tests
//!
//! End-to-end markdown → document conversions, limits, caching and the flat writer.

mod caching;
mod flat;
mod limits;
mod marks;
mod scenarios;
