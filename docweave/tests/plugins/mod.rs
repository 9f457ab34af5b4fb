//! Plugin tests
//!
//! Built-in plugin rendering through the full pipeline and registry behavior with
//! custom plugins.

mod builtin;
mod registry;
