use crate::common::{convert, nodes_of};
use docweave::{DiagnosticKind, MarkKind, NodeKind, Validator};
use serde_json::json;

#[test]
fn bold_then_plain_text() {
    let conversion = convert("**bold** text");
    let document = &conversion.document;

    assert_eq!(document.content.len(), 1);
    let paragraph = &document.content[0];
    assert_eq!(paragraph.kind, NodeKind::Paragraph);
    assert_eq!(paragraph.content.len(), 2);

    let bold = &paragraph.content[0];
    assert_eq!(bold.text.as_deref(), Some("bold"));
    assert_eq!(bold.marks.len(), 1);
    assert_eq!(bold.marks[0].kind, MarkKind::Strong);

    let plain = &paragraph.content[1];
    assert_eq!(plain.text.as_deref(), Some(" text"));
    assert!(plain.marks.is_empty());
    assert!(conversion.warnings.is_empty());
}

#[test]
fn info_panel_wraps_paragraph() {
    let conversion = convert(":::panel type=\"info\"\nHello\n:::");
    let document = &conversion.document;

    assert_eq!(document.content.len(), 1);
    let panel = &document.content[0];
    assert_eq!(panel.kind, NodeKind::Panel);
    assert_eq!(panel.attr_str("panelType"), Some("info"));
    assert_eq!(panel.content.len(), 1);
    assert_eq!(panel.content[0].kind, NodeKind::Paragraph);
    assert_eq!(panel.content[0].content[0].text.as_deref(), Some("Hello"));
}

#[test]
fn serialized_shape() {
    let value = convert("# Title\n\nBody").document.to_value().unwrap();
    assert_eq!(
        value,
        json!({
            "version": 1,
            "type": "doc",
            "content": [
                {
                    "type": "heading",
                    "attrs": {"level": 1},
                    "content": [{"type": "text", "text": "Title"}]
                },
                {
                    "type": "paragraph",
                    "content": [{"type": "text", "text": "Body"}]
                }
            ]
        })
    );
}

#[test]
fn kitchen_sink_is_valid() {
    let md = r#"# Release notes

Intro with **bold**, _em_, `code`, ~~strike~~ and a [link](https://example.com).

:::panel type="warning"
Check the {status:color=yellow}beta{/status} flag before {date:2024-03-15}.
:::

:::expand title="Details"
- first
- second

:::expand title="More"
Nested body
:::
:::

:::layout columns=2
::: column
Left side
:::
::: column
Right side @alice :tada:
:::
:::

| Name | Value |
|------|-------|
| a    | 1     |

> quoted

```rust
fn main() {}
```

---
"#;
    let conversion = convert(md);
    let report = Validator::default().validate(&conversion.document);
    assert!(report.valid, "{:?}", report.errors);
    assert!(
        !conversion
            .warnings
            .iter()
            .any(|w| w.kind == DiagnosticKind::Validation),
        "{:?}",
        conversion.warnings
    );

    assert_eq!(nodes_of(&conversion.document, NodeKind::Panel).len(), 1);
    assert_eq!(nodes_of(&conversion.document, NodeKind::Expand).len(), 1);
    assert_eq!(nodes_of(&conversion.document, NodeKind::NestedExpand).len(), 1);
    assert_eq!(nodes_of(&conversion.document, NodeKind::LayoutColumn).len(), 2);
    assert_eq!(nodes_of(&conversion.document, NodeKind::Status).len(), 1);
    assert_eq!(nodes_of(&conversion.document, NodeKind::Date).len(), 1);
    assert_eq!(nodes_of(&conversion.document, NodeKind::Mention).len(), 1);
    assert_eq!(nodes_of(&conversion.document, NodeKind::Emoji).len(), 1);
    assert_eq!(nodes_of(&conversion.document, NodeKind::Table).len(), 1);
    assert_eq!(nodes_of(&conversion.document, NodeKind::CodeBlock).len(), 1);
}

#[test]
fn unterminated_directive_is_literal_text() {
    let conversion = convert(":::panel type=\"info\"\nnever closed");
    assert!(nodes_of(&conversion.document, NodeKind::Panel).is_empty());
    assert!(conversion
        .warnings
        .iter()
        .any(|w| w.kind == DiagnosticKind::Parse));
}

#[test]
fn unknown_panel_type_is_recovered() {
    let conversion = convert(":::panel type=\"purple\"\nHello\n:::");
    assert!(nodes_of(&conversion.document, NodeKind::Panel).is_empty());
    assert!(!conversion.warnings.is_empty());
    assert!(Validator::default().validate(&conversion.document).valid);
}

#[test]
fn empty_link_destination_is_valid() {
    let conversion = convert("[text]()");
    let report = Validator::default().validate(&conversion.document);
    assert!(report.valid, "{:?}", report.errors);
    assert!(nodes_of(&conversion.document, NodeKind::Text)
        .iter()
        .all(|n| !n.has_mark(MarkKind::Link)));
    assert_eq!(conversion.warnings[0].kind, DiagnosticKind::Parse);
}

#[test]
fn image_without_source_is_valid() {
    for md in ["![alt]()", "before ![alt]() after"] {
        let conversion = convert(md);
        let report = Validator::default().validate(&conversion.document);
        assert!(report.valid, "{md}: {:?}", report.errors);
        assert!(nodes_of(&conversion.document, NodeKind::Media).is_empty());
        assert!(conversion.document.content[0].plain_text().contains("alt"));
    }
}

#[test]
fn unsupported_media_type_is_literal_text() {
    let conversion = convert(":::media type=\"bogus\" id=\"a\"\n:::");
    assert!(nodes_of(&conversion.document, NodeKind::Media).is_empty());
    assert!(!conversion.warnings.is_empty());
    let report = Validator::default().validate(&conversion.document);
    assert!(report.valid, "{:?}", report.errors);
}

#[test]
fn empty_input_is_an_empty_document() {
    let conversion = convert("");
    assert!(conversion.document.is_empty());
    assert!(conversion.warnings.is_empty());
}

#[test]
fn deep_nesting_is_a_pipeline_failure() {
    let md = format!("{}deep", "> ".repeat(100));
    assert!(matches!(
        docweave::convert(&md),
        Err(docweave::ConversionError::NestingTooDeep { limit: 64 })
    ));
}
