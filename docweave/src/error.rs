//! Error types for conversion operations
//!
//! Only failures that prevent producing any document live here. Recoverable problems
//! (parse anomalies, content-rule violations, truncation, advisory validation) are
//! reported as [`crate::diagnostics::Diagnostic`]s next to a successful result.

use crate::model::schema::SchemaError;
use thiserror::Error;

/// Errors that abort a structured conversion
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ConversionError {
    /// Block nesting went past the configured guard
    #[error("nesting depth exceeded the limit of {limit}")]
    NestingTooDeep { limit: usize },

    /// A container was built with children its kind does not permit
    #[error("schema violation: {0}")]
    Schema(#[from] SchemaError),

    /// Strict validation rejected the produced document
    #[error("document failed validation: {}", .0.join("; "))]
    Validation(Vec<String>),

    /// A plugin could not render its data
    #[error("plugin '{plugin}' failed: {message}")]
    Plugin { plugin: String, message: String },

    /// The pipeline panicked; the payload message is captured
    #[error("internal error: {0}")]
    Internal(String),
}

impl ConversionError {
    /// Create a plugin failure
    pub fn plugin(plugin: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Plugin {
            plugin: plugin.into(),
            message: message.into(),
        }
    }
}
