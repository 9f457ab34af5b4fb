//! Structural validation of finished documents.
//!
//! The checks mirror the rules in [`crate::model::schema`]: supported version and root
//! type, required attributes, permitted children and child counts, and mark
//! combinations on text. Every problem is reported with the path of the offending node.
//!
//! [`ValidationMode::Advisory`] only reports. [`ValidationMode::Strict`] turns a failed
//! report into [`ConversionError::Validation`] through [`Validator::check`].

use crate::error::ConversionError;
use crate::model::schema::{self, ContentModel};
use crate::model::{Document, Node, NodeKind, DOCUMENT_TYPE, DOCUMENT_VERSION};
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// How validation failures are treated.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ValidationMode {
    /// Report problems and keep the document.
    #[default]
    Advisory,
    /// Reject documents with problems.
    Strict,
}

/// Outcome of validating one document.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ValidationReport {
    pub valid: bool,
    pub errors: Vec<String>,
}

impl ValidationReport {
    fn from_errors(errors: Vec<String>) -> Self {
        ValidationReport {
            valid: errors.is_empty(),
            errors,
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Validator {
    mode: ValidationMode,
}

impl Validator {
    pub fn new(mode: ValidationMode) -> Self {
        Validator { mode }
    }

    pub fn strict() -> Self {
        Self::new(ValidationMode::Strict)
    }

    pub fn mode(&self) -> ValidationMode {
        self.mode
    }

    /// Check a document and list every problem found.
    pub fn validate(&self, document: &Document) -> ValidationReport {
        let mut errors = Vec::new();
        if document.version != DOCUMENT_VERSION {
            errors.push(format!(
                "unsupported document version {} (expected {DOCUMENT_VERSION})",
                document.version
            ));
        }
        if document.kind != DOCUMENT_TYPE {
            errors.push(format!(
                "root type must be '{DOCUMENT_TYPE}', found '{}'",
                document.kind
            ));
        }
        for (index, child) in document.content.iter().enumerate() {
            let path = format!("doc.content[{index}]");
            if !schema::permits_at_root(child) {
                errors.push(format!("{path}: '{}' is not permitted at the top level", child.kind));
            }
            check_node(child, &path, &mut errors);
        }
        ValidationReport::from_errors(errors)
    }

    /// Check raw JSON. Problems that keep it from being read as a document at all
    /// (unknown node types, missing version, wrong shapes) are reported as errors.
    pub fn validate_json(&self, value: &Value) -> ValidationReport {
        match Document::deserialize(value) {
            Ok(document) => self.validate(&document),
            Err(err) => ValidationReport::from_errors(vec![format!(
                "document does not match the node model: {err}"
            )]),
        }
    }

    /// Validate and apply the mode: strict mode fails on any problem.
    pub fn check(&self, document: &Document) -> Result<ValidationReport, ConversionError> {
        let report = self.validate(document);
        if !report.valid && self.mode == ValidationMode::Strict {
            return Err(ConversionError::Validation(report.errors));
        }
        Ok(report)
    }
}

fn check_node(node: &Node, path: &str, errors: &mut Vec<String>) {
    for problem in schema::check_attrs(node) {
        errors.push(format!("{path}: {problem}"));
    }

    if node.kind == NodeKind::Text {
        check_marks(node, path, errors);
    } else if !node.marks.is_empty() {
        errors.push(format!("{path}: '{}' must not carry marks", node.kind));
    }

    if schema::content_model(node.kind) == ContentModel::Leaf && !node.content.is_empty() {
        errors.push(format!("{path}: '{}' must not have content", node.kind));
    } else {
        for child in node.content.iter().filter(|c| !schema::permits(node.kind, c)) {
            errors.push(format!(
                "{path}: '{}' is not permitted inside '{}'",
                child.kind, node.kind
            ));
        }
        let (min, max) = schema::cardinality(node.kind);
        let count = node.content.len();
        if count < min {
            errors.push(format!(
                "{path}: '{}' needs at least {min} child node(s), has {count}",
                node.kind
            ));
        }
        if let Some(max) = max.filter(|max| count > *max) {
            errors.push(format!(
                "{path}: '{}' allows at most {max} child node(s), has {count}",
                node.kind
            ));
        }
    }

    for (index, child) in node.content.iter().enumerate() {
        check_node(child, &format!("{path}.content[{index}]"), errors);
    }
}

fn check_marks(node: &Node, path: &str, errors: &mut Vec<String>) {
    for (index, mark) in node.marks.iter().enumerate() {
        if let Some(problem) = schema::check_mark_attrs(mark) {
            errors.push(format!("{path}: {problem}"));
        }
        for other in &node.marks[index + 1..] {
            if other.kind == mark.kind {
                errors.push(format!("{path}: duplicate '{}' mark", mark.kind));
            } else if !schema::marks_compatible(mark.kind, other.kind) {
                errors.push(format!(
                    "{path}: marks '{}' and '{}' cannot be combined",
                    mark.kind, other.kind
                ));
            }
        }
    }
}
