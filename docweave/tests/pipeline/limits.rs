use crate::common::{nodes_of, pipeline, pipeline_with_limits, table_markdown};
use docweave::{DiagnosticKind, Limits, NodeKind, Validator};

fn truncation_warnings(warnings: &[docweave::Diagnostic]) -> usize {
    warnings
        .iter()
        .filter(|w| w.kind == DiagnosticKind::Truncation)
        .count()
}

#[test]
fn table_rows_are_bounded() {
    let conversion = pipeline().convert(&table_markdown(200, 3)).unwrap();
    let rows = nodes_of(&conversion.document, NodeKind::TableRow);
    assert!(rows.len() <= Limits::default().max_table_rows + 1, "{} rows", rows.len());
    assert!(crate::common::all_text(&conversion.document).contains("[content truncated"));
    assert!(truncation_warnings(&conversion.warnings) >= 1);
    assert!(Validator::default().validate(&conversion.document).valid);
}

#[test]
fn table_cells_are_bounded() {
    let conversion = pipeline().convert(&table_markdown(2, 30)).unwrap();
    for row in nodes_of(&conversion.document, NodeKind::TableRow) {
        assert!(row.content.len() <= Limits::default().max_table_cells + 1);
    }
    assert!(truncation_warnings(&conversion.warnings) >= 1);
}

#[test]
fn list_items_are_bounded() {
    let md: String = (0..500).map(|i| format!("- item {i}\n")).collect();
    let conversion = pipeline().convert(&md).unwrap();
    let lists = nodes_of(&conversion.document, NodeKind::BulletList);
    assert_eq!(lists.len(), 1);
    assert!(lists[0].content.len() <= Limits::default().max_list_items + 1);
    assert_eq!(truncation_warnings(&conversion.warnings), 1);
    assert!(Validator::default().validate(&conversion.document).valid);
}

#[test]
fn custom_limits_apply() {
    let limits = Limits {
        max_table_rows: 3,
        max_list_items: 2,
        ..Limits::default()
    };
    let pipeline = pipeline_with_limits(limits);

    let table = pipeline.convert(&table_markdown(10, 2)).unwrap();
    assert_eq!(nodes_of(&table.document, NodeKind::TableRow).len(), 4);

    let list = pipeline.convert("1. a\n2. b\n3. c\n4. d\n").unwrap();
    assert_eq!(list.document.content[0].content.len(), 3);
}

#[test]
fn long_text_is_cut_with_ellipsis() {
    let limits = Limits {
        max_text_length: 10,
        ..Limits::default()
    };
    let conversion = pipeline_with_limits(limits)
        .convert("abcdefghijklmnopqrstuvwxyz")
        .unwrap();
    let text = conversion.document.content[0].content[0].text.clone().unwrap();
    assert_eq!(text, "abcdefghij\u{2026}");
    assert_eq!(truncation_warnings(&conversion.warnings), 1);
}

#[test]
fn deep_lists_collapse_to_marker() {
    let limits = Limits {
        max_list_depth: 2,
        ..Limits::default()
    };
    let md = "- a\n  - b\n    - c\n      - d\n";
    let conversion = pipeline_with_limits(limits).convert(md).unwrap();
    assert_eq!(nodes_of(&conversion.document, NodeKind::BulletList).len(), 2);
    assert!(truncation_warnings(&conversion.warnings) >= 1);
    assert!(Validator::default().validate(&conversion.document).valid);
}
