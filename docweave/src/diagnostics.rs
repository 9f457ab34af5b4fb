//! Warnings collected while converting.

use serde::Serialize;
use std::fmt;

/// Which recoverable condition produced a diagnostic.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum DiagnosticKind {
    /// Malformed or ambiguous input recovered as literal text
    Parse,
    /// A child was placed where its parent forbids it and was downgraded
    ContentRule,
    /// A size or nesting limit cut content short
    Truncation,
    /// A mark was dropped because it cannot combine with an enclosing one
    MarkConflict,
    /// Advisory validation found a problem in the produced document
    Validation,
}

impl DiagnosticKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            DiagnosticKind::Parse => "parse",
            DiagnosticKind::ContentRule => "content-rule",
            DiagnosticKind::Truncation => "truncation",
            DiagnosticKind::MarkConflict => "mark-conflict",
            DiagnosticKind::Validation => "validation",
        }
    }
}

/// A single warning.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Diagnostic {
    pub kind: DiagnosticKind,
    pub message: String,
}

impl Diagnostic {
    pub fn new(kind: DiagnosticKind, message: impl Into<String>) -> Self {
        Diagnostic {
            kind,
            message: message.into(),
        }
    }

    pub fn parse(message: impl Into<String>) -> Self {
        Self::new(DiagnosticKind::Parse, message)
    }

    pub fn content_rule(message: impl Into<String>) -> Self {
        Self::new(DiagnosticKind::ContentRule, message)
    }

    pub fn truncation(message: impl Into<String>) -> Self {
        Self::new(DiagnosticKind::Truncation, message)
    }

    pub fn mark_conflict(message: impl Into<String>) -> Self {
        Self::new(DiagnosticKind::MarkConflict, message)
    }

    pub fn validation(message: impl Into<String>) -> Self {
        Self::new(DiagnosticKind::Validation, message)
    }
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}] {}", self.kind.as_str(), self.message)
    }
}
