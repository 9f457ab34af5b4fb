use crate::common::convert;
use docweave::{MarkKind, NodeKind, Validator};
use proptest::prelude::*;

fn fragment() -> impl Strategy<Value = &'static str> {
    prop::sample::select(vec![
        "word",
        " ",
        "**",
        "_",
        "~~",
        "`code`",
        "<u>",
        "</u>",
        "<sup>",
        "</sup>",
        "<span style=\"color: #ff0000\">",
        "<span style=\"background-color: yellow\">",
        "</span>",
        "[link](https://example.com)",
        "[`code link`](https://example.com)",
        "**`bold code`**",
        "\n",
        "@bob",
        ":smile:",
    ])
}

fn markdown() -> impl Strategy<Value = String> {
    prop::collection::vec(fragment(), 0..24).prop_map(|parts| parts.concat())
}

proptest! {
    #[test]
    fn text_marks_are_always_compatible(md in markdown()) {
        let conversion = convert(&md);
        for node in conversion.document.walk().filter(|n| n.kind == NodeKind::Text) {
            let kinds: Vec<MarkKind> = node.marks.iter().map(|m| m.kind).collect();
            if kinds.contains(&MarkKind::Code) {
                prop_assert!(
                    kinds.iter().all(|k| matches!(k, MarkKind::Code | MarkKind::Link)),
                    "code combined with {:?} in {:?}", kinds, md
                );
            }
            let mut unique = kinds.clone();
            unique.sort_by_key(|k| k.as_str());
            unique.dedup();
            prop_assert_eq!(unique.len(), kinds.len());
        }
    }

    #[test]
    fn generated_documents_validate(md in markdown()) {
        let conversion = convert(&md);
        let report = Validator::default().validate(&conversion.document);
        prop_assert!(report.valid, "{:?} for {:?}", report.errors, md);
    }
}
