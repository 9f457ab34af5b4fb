//! Structural rules of the document format.
//!
//! For each [`NodeKind`] this module declares what it may contain, how many children it
//! needs and which attributes it requires. It also holds the mark compatibility table.
//! The renderer uses these rules to degrade content it cannot place. The validator uses
//! them to check finished documents. [`build`] is the checked constructor for containers.

use crate::model::nodes::{Attrs, Mark, MarkKind, Node, NodeKind};
use serde_json::Value;
use thiserror::Error;

/// Allowed `panelType` values.
pub const PANEL_TYPES: &[&str] = &["info", "note", "warning", "success", "error"];

/// Allowed `status` colors.
pub const STATUS_COLORS: &[&str] = &["neutral", "purple", "blue", "red", "yellow", "green"];

/// Allowed `media` types.
pub const MEDIA_TYPES: &[&str] = &["file", "link", "external"];

/// A permitted child kind. `no_marks` restricts it to instances that carry no node marks.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ChildRule {
    pub kind: NodeKind,
    pub no_marks: bool,
}

const fn any(kind: NodeKind) -> ChildRule {
    ChildRule {
        kind,
        no_marks: false,
    }
}

const fn bare(kind: NodeKind) -> ChildRule {
    ChildRule {
        kind,
        no_marks: true,
    }
}

/// What a node kind may contain.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ContentModel {
    /// No children at all.
    Leaf,
    /// Inline nodes; text may carry marks.
    Inline,
    /// Only unmarked text nodes (code blocks).
    PlainText,
    /// The listed block kinds.
    Blocks(&'static [ChildRule]),
}

const TOP_LEVEL: &[ChildRule] = &[
    any(NodeKind::Paragraph),
    any(NodeKind::Heading),
    any(NodeKind::BulletList),
    any(NodeKind::OrderedList),
    any(NodeKind::Blockquote),
    any(NodeKind::CodeBlock),
    any(NodeKind::Rule),
    any(NodeKind::Table),
    any(NodeKind::Panel),
    any(NodeKind::Expand),
    any(NodeKind::MediaGroup),
    any(NodeKind::MediaSingle),
    any(NodeKind::LayoutSection),
    any(NodeKind::Extension),
    any(NodeKind::BodiedExtension),
];

const EXPAND: &[ChildRule] = &[
    any(NodeKind::Paragraph),
    any(NodeKind::Heading),
    any(NodeKind::BulletList),
    any(NodeKind::OrderedList),
    any(NodeKind::Blockquote),
    any(NodeKind::CodeBlock),
    any(NodeKind::Rule),
    any(NodeKind::Table),
    any(NodeKind::Panel),
    any(NodeKind::NestedExpand),
    any(NodeKind::MediaGroup),
    any(NodeKind::MediaSingle),
    any(NodeKind::Extension),
    any(NodeKind::BodiedExtension),
];

const LAYOUT_COLUMN: &[ChildRule] = &[
    any(NodeKind::Paragraph),
    any(NodeKind::Heading),
    any(NodeKind::BulletList),
    any(NodeKind::OrderedList),
    any(NodeKind::Blockquote),
    any(NodeKind::CodeBlock),
    any(NodeKind::Rule),
    any(NodeKind::Table),
    any(NodeKind::Panel),
    any(NodeKind::Expand),
    any(NodeKind::MediaGroup),
    any(NodeKind::MediaSingle),
    any(NodeKind::Extension),
    any(NodeKind::BodiedExtension),
];

const NESTED_EXPAND: &[ChildRule] = &[
    any(NodeKind::Paragraph),
    any(NodeKind::Heading),
    any(NodeKind::BulletList),
    any(NodeKind::OrderedList),
    any(NodeKind::Blockquote),
    any(NodeKind::CodeBlock),
    any(NodeKind::Rule),
    any(NodeKind::Panel),
    any(NodeKind::MediaGroup),
    any(NodeKind::MediaSingle),
];

const TABLE_CELL: &[ChildRule] = &[
    any(NodeKind::Paragraph),
    any(NodeKind::Heading),
    any(NodeKind::BulletList),
    any(NodeKind::OrderedList),
    any(NodeKind::Blockquote),
    any(NodeKind::CodeBlock),
    any(NodeKind::Rule),
    any(NodeKind::Panel),
    any(NodeKind::NestedExpand),
    any(NodeKind::MediaGroup),
    any(NodeKind::MediaSingle),
    any(NodeKind::Extension),
];

const PANEL: &[ChildRule] = &[
    bare(NodeKind::Paragraph),
    bare(NodeKind::Heading),
    any(NodeKind::BulletList),
    any(NodeKind::OrderedList),
];

const BLOCKQUOTE: &[ChildRule] = &[
    bare(NodeKind::Paragraph),
    any(NodeKind::BulletList),
    any(NodeKind::OrderedList),
    any(NodeKind::CodeBlock),
    any(NodeKind::MediaGroup),
    any(NodeKind::MediaSingle),
];

const LIST_ITEM: &[ChildRule] = &[
    bare(NodeKind::Paragraph),
    any(NodeKind::BulletList),
    any(NodeKind::OrderedList),
    bare(NodeKind::CodeBlock),
    any(NodeKind::MediaSingle),
];

const LIST: &[ChildRule] = &[any(NodeKind::ListItem)];
const TABLE: &[ChildRule] = &[any(NodeKind::TableRow)];
const TABLE_ROW: &[ChildRule] = &[any(NodeKind::TableCell), any(NodeKind::TableHeader)];
const MEDIA: &[ChildRule] = &[any(NodeKind::Media)];
const LAYOUT_SECTION: &[ChildRule] = &[any(NodeKind::LayoutColumn)];

/// Children allowed directly under the document root.
pub fn root_rules() -> &'static [ChildRule] {
    TOP_LEVEL
}

/// The content model of `kind`.
pub fn content_model(kind: NodeKind) -> ContentModel {
    match kind {
        NodeKind::Paragraph | NodeKind::Heading => ContentModel::Inline,
        NodeKind::CodeBlock => ContentModel::PlainText,
        NodeKind::BulletList | NodeKind::OrderedList => ContentModel::Blocks(LIST),
        NodeKind::ListItem => ContentModel::Blocks(LIST_ITEM),
        NodeKind::Blockquote => ContentModel::Blocks(BLOCKQUOTE),
        NodeKind::Table => ContentModel::Blocks(TABLE),
        NodeKind::TableRow => ContentModel::Blocks(TABLE_ROW),
        NodeKind::TableCell | NodeKind::TableHeader => ContentModel::Blocks(TABLE_CELL),
        NodeKind::Panel => ContentModel::Blocks(PANEL),
        NodeKind::Expand | NodeKind::BodiedExtension => ContentModel::Blocks(EXPAND),
        NodeKind::NestedExpand => ContentModel::Blocks(NESTED_EXPAND),
        NodeKind::MediaGroup | NodeKind::MediaSingle => ContentModel::Blocks(MEDIA),
        NodeKind::LayoutSection => ContentModel::Blocks(LAYOUT_SECTION),
        NodeKind::LayoutColumn => ContentModel::Blocks(LAYOUT_COLUMN),
        NodeKind::Rule
        | NodeKind::Media
        | NodeKind::Extension
        | NodeKind::Text
        | NodeKind::HardBreak
        | NodeKind::Status
        | NodeKind::Date
        | NodeKind::Emoji
        | NodeKind::Mention
        | NodeKind::InlineCard
        | NodeKind::InlineExtension => ContentModel::Leaf,
    }
}

/// Minimum and optional maximum number of children.
pub fn cardinality(kind: NodeKind) -> (usize, Option<usize>) {
    match kind {
        NodeKind::MediaSingle => (1, Some(1)),
        NodeKind::BulletList
        | NodeKind::OrderedList
        | NodeKind::ListItem
        | NodeKind::Blockquote
        | NodeKind::Table
        | NodeKind::TableRow
        | NodeKind::TableCell
        | NodeKind::TableHeader
        | NodeKind::Panel
        | NodeKind::Expand
        | NodeKind::NestedExpand
        | NodeKind::MediaGroup
        | NodeKind::LayoutSection
        | NodeKind::LayoutColumn
        | NodeKind::BodiedExtension => (1, None),
        _ => (0, None),
    }
}

fn rules_permit(rules: &[ChildRule], child: &Node) -> bool {
    rules
        .iter()
        .any(|rule| rule.kind == child.kind && (!rule.no_marks || child.marks.is_empty()))
}

/// Whether `child` may appear in the content of a `parent` node.
pub fn permits(parent: NodeKind, child: &Node) -> bool {
    match content_model(parent) {
        ContentModel::Leaf => false,
        ContentModel::Inline => child.kind.is_inline(),
        ContentModel::PlainText => child.kind == NodeKind::Text && child.marks.is_empty(),
        ContentModel::Blocks(rules) => rules_permit(rules, child),
    }
}

/// Whether `child` may appear at the document root.
pub fn permits_at_root(child: &Node) -> bool {
    rules_permit(TOP_LEVEL, child)
}

/// Whether a bare child of `kind` is allowed under `parent` (`None` = document root).
pub fn allows_kind(parent: Option<NodeKind>, kind: NodeKind) -> bool {
    let probe = Node::new(kind);
    match parent {
        Some(parent) => permits(parent, &probe),
        None => permits_at_root(&probe),
    }
}

/// A kind that stands in for `kind` in contexts that do not allow it.
///
/// Only `expand` has one: it becomes `nestedExpand` wherever that is permitted.
pub fn substitute(parent: Option<NodeKind>, kind: NodeKind) -> Option<NodeKind> {
    match kind {
        NodeKind::Expand if allows_kind(parent, NodeKind::NestedExpand) => {
            Some(NodeKind::NestedExpand)
        }
        _ => None,
    }
}

/// Error returned when a container is built with children it does not permit.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SchemaError {
    #[error("'{child}' is not permitted inside '{parent}'")]
    DisallowedChild { parent: NodeKind, child: NodeKind },

    #[error("'{kind}' needs at least {min} child node(s), got {actual}")]
    TooFewChildren {
        kind: NodeKind,
        min: usize,
        actual: usize,
    },

    #[error("'{kind}' allows at most {max} child node(s), got {actual}")]
    TooManyChildren {
        kind: NodeKind,
        max: usize,
        actual: usize,
    },
}

/// Checked constructor for container nodes.
///
/// Every child must be permitted by `kind`'s content model and the child count must
/// satisfy [`cardinality`]. An invalid combination is an error, never a silently
/// accepted node.
pub fn build(kind: NodeKind, attrs: Attrs, content: Vec<Node>) -> Result<Node, SchemaError> {
    if let Some(child) = content.iter().find(|child| !permits(kind, child)) {
        return Err(SchemaError::DisallowedChild {
            parent: kind,
            child: child.kind,
        });
    }
    let (min, max) = cardinality(kind);
    if content.len() < min {
        return Err(SchemaError::TooFewChildren {
            kind,
            min,
            actual: content.len(),
        });
    }
    if let Some(max) = max {
        if content.len() > max {
            return Err(SchemaError::TooManyChildren {
                kind,
                max,
                actual: content.len(),
            });
        }
    }
    let mut node = Node::new(kind).with_content(content);
    node.attrs = attrs;
    Ok(node)
}

fn excludes(a: MarkKind, b: MarkKind) -> bool {
    match a {
        MarkKind::Code => b != MarkKind::Link,
        MarkKind::TextColor => matches!(b, MarkKind::Code | MarkKind::Link),
        MarkKind::BackgroundColor => b == MarkKind::Code,
        _ => false,
    }
}

/// Whether two marks may sit on the same text node. The relation is symmetric.
pub fn marks_compatible(a: MarkKind, b: MarkKind) -> bool {
    !(excludes(a, b) || excludes(b, a))
}

/// The first mark in `existing` that `candidate` cannot be combined with.
pub fn first_conflict(existing: &[Mark], candidate: MarkKind) -> Option<MarkKind> {
    existing
        .iter()
        .map(|m| m.kind)
        .find(|kind| !marks_compatible(*kind, candidate))
}

fn int_attr(node: &Node, key: &str) -> Option<i64> {
    node.attr(key).and_then(Value::as_i64)
}

fn require_str<'a>(node: &'a Node, key: &str, errors: &mut Vec<String>) -> Option<&'a str> {
    match node.attr(key) {
        Some(Value::String(s)) if !s.is_empty() => Some(s.as_str()),
        Some(_) => {
            errors.push(format!("'{}' attribute '{key}' must be a non-empty string", node.kind));
            None
        }
        None => {
            errors.push(format!("'{}' is missing required attribute '{key}'", node.kind));
            None
        }
    }
}

fn require_one_of(node: &Node, key: &str, allowed: &[&str], errors: &mut Vec<String>) {
    if let Some(value) = require_str(node, key, errors) {
        if !allowed.contains(&value) {
            errors.push(format!(
                "'{}' attribute '{key}' has unsupported value '{value}'",
                node.kind
            ));
        }
    }
}

/// Attribute problems of a single node (children are not inspected).
pub fn check_attrs(node: &Node) -> Vec<String> {
    let mut errors = Vec::new();
    match node.kind {
        NodeKind::Heading => match int_attr(node, "level") {
            Some(level) if (1..=6).contains(&level) => {}
            Some(level) => errors.push(format!("heading level {level} is outside 1..=6")),
            None => errors.push("'heading' is missing required attribute 'level'".to_string()),
        },
        NodeKind::OrderedList => {
            if let Some(order) = node.attr("order") {
                if order.as_u64().is_none() {
                    errors.push("orderedList 'order' must be a non-negative integer".to_string());
                }
            }
        }
        NodeKind::Panel => require_one_of(node, "panelType", PANEL_TYPES, &mut errors),
        NodeKind::Status => {
            require_str(node, "text", &mut errors);
            require_one_of(node, "color", STATUS_COLORS, &mut errors);
        }
        NodeKind::Date => {
            if let Some(ts) = require_str(node, "timestamp", &mut errors) {
                if ts.parse::<i64>().is_err() {
                    errors.push(format!("date timestamp '{ts}' is not an integer"));
                }
            }
        }
        NodeKind::Emoji => {
            require_str(node, "shortName", &mut errors);
        }
        NodeKind::Mention => {
            require_str(node, "id", &mut errors);
        }
        NodeKind::InlineCard => {
            require_str(node, "url", &mut errors);
        }
        NodeKind::Media => {
            require_one_of(node, "type", MEDIA_TYPES, &mut errors);
            if node.attr_str("type") == Some("external") {
                require_str(node, "url", &mut errors);
            } else {
                require_str(node, "id", &mut errors);
            }
        }
        NodeKind::LayoutColumn => match node.attr("width").and_then(Value::as_f64) {
            Some(width) if width > 0.0 && width <= 100.0 => {}
            _ => errors.push("layoutColumn 'width' must be a number in (0, 100]".to_string()),
        },
        NodeKind::Extension | NodeKind::BodiedExtension | NodeKind::InlineExtension => {
            require_str(node, "extensionType", &mut errors);
            require_str(node, "extensionKey", &mut errors);
        }
        NodeKind::Text => match node.text.as_deref() {
            Some(text) if !text.is_empty() => {}
            _ => errors.push("text node must carry a non-empty 'text'".to_string()),
        },
        _ => {}
    }
    if node.kind != NodeKind::Text && node.text.is_some() {
        errors.push(format!("'{}' must not carry a 'text' field", node.kind));
    }
    errors
}

/// Attribute problems of a single mark.
pub fn check_mark_attrs(mark: &Mark) -> Option<String> {
    let str_attr = |key: &str| mark.attrs.get(key).and_then(Value::as_str);
    match mark.kind {
        MarkKind::Link if str_attr("href").map_or(true, str::is_empty) => {
            Some("link mark is missing 'href'".to_string())
        }
        MarkKind::TextColor | MarkKind::BackgroundColor
            if str_attr("color").map_or(true, str::is_empty) =>
        {
            Some(format!("{} mark is missing 'color'", mark.kind))
        }
        MarkKind::Subsup if !matches!(str_attr("type"), Some("sub") | Some("sup")) => {
            Some("subsup mark 'type' must be 'sub' or 'sup'".to_string())
        }
        _ => None,
    }
}
