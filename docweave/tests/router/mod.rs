//! Router tests
//!
//! Deployment detection, rollout bucketing and the routed conversion envelope.

mod detection;
mod rollout;
mod routing;
