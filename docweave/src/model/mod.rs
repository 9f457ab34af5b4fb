//! The structured document model.
//!
//! `nodes` is the pure data contract (what gets serialized). `schema` holds the rules a
//! valid document satisfies: permitted content per kind, required attributes and mark
//! compatibility.

pub mod nodes;
pub mod schema;

pub use nodes::{Attrs, Document, Mark, MarkKind, Node, NodeKind, DOCUMENT_TYPE, DOCUMENT_VERSION};
pub use schema::SchemaError;
