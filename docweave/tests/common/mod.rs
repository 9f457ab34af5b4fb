//! Helpers shared by the integration tests.

#![allow(dead_code)]

use docweave::{
    Conversion, Document, Limits, Node, NodeKind, Pipeline, PipelineOptions, PluginRegistry,
};

/// A pipeline with the built-in plugins and default options.
pub fn pipeline() -> Pipeline {
    Pipeline::default()
}

/// A pipeline with the built-in plugins and the given limits.
pub fn pipeline_with_limits(limits: Limits) -> Pipeline {
    Pipeline::new(
        PluginRegistry::with_defaults(),
        PipelineOptions {
            limits,
            ..PipelineOptions::default()
        },
    )
}

pub fn convert(markdown: &str) -> Conversion {
    docweave::convert(markdown).expect("conversion to succeed")
}

/// Every node of `kind`, depth first.
pub fn nodes_of(document: &Document, kind: NodeKind) -> Vec<&Node> {
    document.walk().filter(|n| n.kind == kind).collect()
}

/// Concatenated text of the whole document.
pub fn all_text(document: &Document) -> String {
    document
        .walk()
        .filter_map(|n| n.text.as_deref())
        .collect::<Vec<_>>()
        .join("")
}

/// Builds a markdown table with a header and `rows` body rows.
pub fn table_markdown(rows: usize, columns: usize) -> String {
    let header: Vec<String> = (0..columns).map(|c| format!("h{c}")).collect();
    let mut md = format!("| {} |\n", header.join(" | "));
    md.push_str(&format!("|{}\n", "---|".repeat(columns)));
    for r in 0..rows {
        let cells: Vec<String> = (0..columns).map(|c| format!("r{r}c{c}")).collect();
        md.push_str(&format!("| {} |\n", cells.join(" | ")));
    }
    md
}
