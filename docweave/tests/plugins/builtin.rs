use crate::common::{convert, nodes_of};
use docweave::{NodeKind, Validator};

#[test]
fn status_lozenge() {
    let doc = convert("Build is {status:color=green}passing{/status}").document;
    let status = nodes_of(&doc, NodeKind::Status);
    assert_eq!(status.len(), 1);
    assert_eq!(status[0].attr_str("text"), Some("passing"));
    assert_eq!(status[0].attr_str("color"), Some("green"));
}

#[test]
fn date_is_epoch_milliseconds() {
    let doc = convert("Ship on {date:2024-03-15}").document;
    let date = nodes_of(&doc, NodeKind::Date);
    assert_eq!(date[0].attr_str("timestamp"), Some("1710460800000"));
}

#[test]
fn invalid_date_stays_text() {
    let conversion = convert("Ship on {date:2024-13-45}");
    assert!(nodes_of(&conversion.document, NodeKind::Date).is_empty());
    assert!(crate::common::all_text(&conversion.document).contains("{date:2024-13-45}"));
    assert!(!conversion.warnings.is_empty());
}

#[test]
fn mention_and_emoji() {
    let doc = convert("Thanks @alice.smith :tada:").document;
    let mention = nodes_of(&doc, NodeKind::Mention);
    assert_eq!(mention[0].attr_str("id"), Some("alice.smith"));
    let emoji = nodes_of(&doc, NodeKind::Emoji);
    assert_eq!(emoji[0].attr_str("shortName"), Some(":tada:"));
}

#[test]
fn email_is_not_a_mention() {
    let doc = convert("Mail bob@example.org").document;
    assert!(nodes_of(&doc, NodeKind::Mention).is_empty());
}

#[test]
fn layout_has_declared_columns() {
    let doc = convert(":::layout columns=3\n::: column\nA\n:::\n::: column\nB\n:::\n:::").document;
    let section = nodes_of(&doc, NodeKind::LayoutSection);
    assert_eq!(section.len(), 1);
    assert_eq!(section[0].content.len(), 3);
    assert!(section[0]
        .content
        .iter()
        .all(|column| column.kind == NodeKind::LayoutColumn));
    assert!(Validator::default().validate(&doc).valid);
}

#[test]
fn media_single_and_group() {
    let single = convert(":::media id=\"f1\" collection=\"uploads\"\n:::").document;
    assert_eq!(single.content[0].kind, NodeKind::MediaSingle);
    assert_eq!(single.content[0].content[0].attr_str("id"), Some("f1"));

    let group =
        convert(":::media\nid=\"a\" collection=\"c\"\nid=\"b\" collection=\"c\"\n:::").document;
    assert_eq!(group.content[0].kind, NodeKind::MediaGroup);
    assert_eq!(group.content[0].content.len(), 2);
}

#[test]
fn markdown_image_paragraph_is_media_single() {
    let doc = convert("![diagram](https://example.com/d.png)").document;
    assert_eq!(doc.content[0].kind, NodeKind::MediaSingle);
    let media = &doc.content[0].content[0];
    assert_eq!(media.attr_str("type"), Some("external"));
    assert_eq!(media.attr_str("url"), Some("https://example.com/d.png"));
}

#[test]
fn bare_link_is_inline_card() {
    let doc = convert("https://example.com/page").document;
    let cards = nodes_of(&doc, NodeKind::InlineCard);
    assert_eq!(cards.len(), 1);
    assert_eq!(cards[0].attr_str("url"), Some("https://example.com/page"));
}

#[test]
fn expand_in_expand_becomes_nested_expand() {
    let doc =
        convert(":::expand title=\"Outer\"\n:::expand title=\"Inner\"\nbody\n:::\n:::").document;
    assert_eq!(doc.content[0].kind, NodeKind::Expand);
    assert_eq!(doc.content[0].content[0].kind, NodeKind::NestedExpand);
    assert_eq!(doc.content[0].content[0].attr_str("title"), Some("Inner"));
}

#[test]
fn panel_inside_panel_degrades() {
    let conversion = convert(":::panel type=\"info\"\n:::panel type=\"note\"\ninner\n:::\n:::");
    let panels = nodes_of(&conversion.document, NodeKind::Panel);
    assert_eq!(panels.len(), 1);
    assert!(crate::common::all_text(&conversion.document).contains("inner"));
    assert!(conversion
        .warnings
        .iter()
        .any(|w| w.kind == docweave::DiagnosticKind::ContentRule));
    assert!(Validator::default().validate(&conversion.document).valid);
}
