//! Intermediate Representation (IR) of parsed markdown.
//!
//! The parser turns markdown (plus plugin syntax) into this tree. Both outputs are
//! rendered from it: the structured document (`pipeline::render`) and the legacy flat
//! markup (`formats::wiki`). Keeping the two renderers on one tree means plugin matching
//! and markdown quirks are resolved exactly once.

pub mod nodes;
