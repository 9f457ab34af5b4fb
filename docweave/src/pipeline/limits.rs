//! Size and nesting limits enforced while rendering.

use serde::{Deserialize, Serialize};

/// Bounds applied to a single conversion.
///
/// Table, list and text limits truncate content with a visible marker and a warning.
/// `max_nesting_depth` is different: exceeding it aborts the structured conversion.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Limits {
    /// Rows kept per table, header row included.
    pub max_table_rows: usize,
    /// Cells kept per table row.
    pub max_table_cells: usize,
    /// Items kept per list.
    pub max_list_items: usize,
    /// Deepest list nesting rendered; deeper lists become a marker paragraph.
    pub max_list_depth: usize,
    /// Characters kept per text run.
    pub max_text_length: usize,
    /// Deepest block/inline nesting the pipeline will recurse into.
    pub max_nesting_depth: usize,
}

impl Default for Limits {
    fn default() -> Self {
        Limits {
            max_table_rows: 50,
            max_table_cells: 20,
            max_list_items: 100,
            max_list_depth: 10,
            max_text_length: 1000,
            max_nesting_depth: 64,
        }
    }
}

/// Marker text placed where content was cut.
pub const TRUNCATION_MARKER: &str = "content truncated";

/// Marker text with a detail, e.g. `[content truncated: 150 more rows]`.
pub fn marker(detail: &str) -> String {
    format!("[{TRUNCATION_MARKER}: {detail}]")
}

/// Appended to text runs cut at `max_text_length`.
pub const ELLIPSIS: char = '\u{2026}';
