//! Core data structures for the structured document format.
//!
//! Every type here serializes to the JSON shape consumed by the content APIs:
//!
//! ```text
//! { "version": 1, "type": "doc", "content": [ { "type": "paragraph", "content": [...] } ] }
//! ```
//!
//! Nodes share one struct. The `kind` tag decides which of `attrs`, `content`, `text`
//! and `marks` are meaningful; [`crate::model::schema`] holds the rules.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// The only document format version this crate produces or accepts.
pub const DOCUMENT_VERSION: u32 = 1;

/// Root type tag of every document.
pub const DOCUMENT_TYPE: &str = "doc";

/// Attribute bag attached to nodes and marks.
pub type Attrs = Map<String, Value>;

/// The root of a structured document.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Document {
    pub version: u32,
    #[serde(rename = "type")]
    pub kind: String,
    #[serde(default)]
    pub content: Vec<Node>,
}

impl Document {
    /// Create a document holding the given top-level blocks.
    pub fn new(content: Vec<Node>) -> Self {
        Document {
            version: DOCUMENT_VERSION,
            kind: DOCUMENT_TYPE.to_string(),
            content,
        }
    }

    /// Create an empty document (valid, just has no blocks).
    pub fn empty() -> Self {
        Self::new(Vec::new())
    }

    pub fn is_empty(&self) -> bool {
        self.content.is_empty()
    }

    /// Serialize to the compact JSON wire form.
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(self)
    }

    /// Serialize to a `serde_json::Value`.
    pub fn to_value(&self) -> Result<Value, serde_json::Error> {
        serde_json::to_value(self)
    }

    /// Depth-first iterator over every node in the document.
    pub fn walk(&self) -> impl Iterator<Item = &Node> {
        let mut stack: Vec<&Node> = self.content.iter().rev().collect();
        std::iter::from_fn(move || {
            let node = stack.pop()?;
            stack.extend(node.content.iter().rev());
            Some(node)
        })
    }
}

/// Every node kind the format knows about.
///
/// Plugins that need a kind outside this set use the extension kinds, which carry
/// `extensionType` and `extensionKey` attributes naming the plugin.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum NodeKind {
    // Blocks
    Paragraph,
    Heading,
    BulletList,
    OrderedList,
    ListItem,
    Blockquote,
    CodeBlock,
    Rule,
    Table,
    TableRow,
    TableCell,
    TableHeader,
    Panel,
    Expand,
    NestedExpand,
    MediaGroup,
    MediaSingle,
    Media,
    LayoutSection,
    LayoutColumn,
    Extension,
    BodiedExtension,
    // Inlines
    Text,
    HardBreak,
    Status,
    Date,
    Emoji,
    Mention,
    InlineCard,
    InlineExtension,
}

impl NodeKind {
    /// The wire name of the kind (`"bulletList"`, `"text"`, ...).
    pub fn as_str(&self) -> &'static str {
        match self {
            NodeKind::Paragraph => "paragraph",
            NodeKind::Heading => "heading",
            NodeKind::BulletList => "bulletList",
            NodeKind::OrderedList => "orderedList",
            NodeKind::ListItem => "listItem",
            NodeKind::Blockquote => "blockquote",
            NodeKind::CodeBlock => "codeBlock",
            NodeKind::Rule => "rule",
            NodeKind::Table => "table",
            NodeKind::TableRow => "tableRow",
            NodeKind::TableCell => "tableCell",
            NodeKind::TableHeader => "tableHeader",
            NodeKind::Panel => "panel",
            NodeKind::Expand => "expand",
            NodeKind::NestedExpand => "nestedExpand",
            NodeKind::MediaGroup => "mediaGroup",
            NodeKind::MediaSingle => "mediaSingle",
            NodeKind::Media => "media",
            NodeKind::LayoutSection => "layoutSection",
            NodeKind::LayoutColumn => "layoutColumn",
            NodeKind::Extension => "extension",
            NodeKind::BodiedExtension => "bodiedExtension",
            NodeKind::Text => "text",
            NodeKind::HardBreak => "hardBreak",
            NodeKind::Status => "status",
            NodeKind::Date => "date",
            NodeKind::Emoji => "emoji",
            NodeKind::Mention => "mention",
            NodeKind::InlineCard => "inlineCard",
            NodeKind::InlineExtension => "inlineExtension",
        }
    }

    /// Whether nodes of this kind live inside inline content.
    pub fn is_inline(&self) -> bool {
        matches!(
            self,
            NodeKind::Text
                | NodeKind::HardBreak
                | NodeKind::Status
                | NodeKind::Date
                | NodeKind::Emoji
                | NodeKind::Mention
                | NodeKind::InlineCard
                | NodeKind::InlineExtension
        )
    }

    pub fn is_block(&self) -> bool {
        !self.is_inline()
    }
}

impl std::fmt::Display for NodeKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Styling annotations carried by text nodes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum MarkKind {
    Strong,
    Em,
    Strike,
    Underline,
    Code,
    Link,
    Subsup,
    TextColor,
    BackgroundColor,
}

impl MarkKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            MarkKind::Strong => "strong",
            MarkKind::Em => "em",
            MarkKind::Strike => "strike",
            MarkKind::Underline => "underline",
            MarkKind::Code => "code",
            MarkKind::Link => "link",
            MarkKind::Subsup => "subsup",
            MarkKind::TextColor => "textColor",
            MarkKind::BackgroundColor => "backgroundColor",
        }
    }
}

impl std::fmt::Display for MarkKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A mark instance: its kind plus kind-specific attributes (link href, color, ...).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Mark {
    #[serde(rename = "type")]
    pub kind: MarkKind,
    #[serde(default, skip_serializing_if = "Map::is_empty")]
    pub attrs: Attrs,
}

impl Mark {
    pub fn new(kind: MarkKind) -> Self {
        Mark {
            kind,
            attrs: Attrs::new(),
        }
    }

    pub fn with_attr(mut self, key: &str, value: impl Into<Value>) -> Self {
        self.attrs.insert(key.to_string(), value.into());
        self
    }

    pub fn strong() -> Self {
        Self::new(MarkKind::Strong)
    }

    pub fn em() -> Self {
        Self::new(MarkKind::Em)
    }

    pub fn code() -> Self {
        Self::new(MarkKind::Code)
    }

    pub fn link(href: &str) -> Self {
        Self::new(MarkKind::Link).with_attr("href", href)
    }

    /// `subsup` with `type` set to `"sub"` or `"sup"`.
    pub fn subsup(sup: bool) -> Self {
        Self::new(MarkKind::Subsup).with_attr("type", if sup { "sup" } else { "sub" })
    }

    pub fn text_color(color: &str) -> Self {
        Self::new(MarkKind::TextColor).with_attr("color", color)
    }

    pub fn background_color(color: &str) -> Self {
        Self::new(MarkKind::BackgroundColor).with_attr("color", color)
    }
}

/// A block or inline node.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Node {
    #[serde(rename = "type")]
    pub kind: NodeKind,
    #[serde(default, skip_serializing_if = "Map::is_empty")]
    pub attrs: Attrs,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub content: Vec<Node>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub text: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub marks: Vec<Mark>,
}

impl Node {
    /// A node of the given kind with no attributes or content.
    ///
    /// Content is not checked here; containers built from untrusted children should go
    /// through [`crate::model::schema::build`].
    pub fn new(kind: NodeKind) -> Self {
        Node {
            kind,
            attrs: Attrs::new(),
            content: Vec::new(),
            text: None,
            marks: Vec::new(),
        }
    }

    /// A text node without marks.
    pub fn text(text: impl Into<String>) -> Self {
        Node {
            text: Some(text.into()),
            ..Self::new(NodeKind::Text)
        }
    }

    pub fn text_with_marks(text: impl Into<String>, marks: Vec<Mark>) -> Self {
        Node {
            marks,
            ..Self::text(text)
        }
    }

    pub fn hard_break() -> Self {
        Self::new(NodeKind::HardBreak)
    }

    /// A paragraph holding the given inline nodes.
    pub fn paragraph(content: Vec<Node>) -> Self {
        Self::new(NodeKind::Paragraph).with_content(content)
    }

    /// A paragraph holding a single unmarked text run (or nothing, if `text` is empty).
    pub fn plain_paragraph(text: &str) -> Self {
        if text.is_empty() {
            Self::paragraph(Vec::new())
        } else {
            Self::paragraph(vec![Self::text(text)])
        }
    }

    pub fn with_attr(mut self, key: &str, value: impl Into<Value>) -> Self {
        self.attrs.insert(key.to_string(), value.into());
        self
    }

    pub fn with_content(mut self, content: Vec<Node>) -> Self {
        self.content = content;
        self
    }

    pub fn attr(&self, key: &str) -> Option<&Value> {
        self.attrs.get(key)
    }

    pub fn attr_str(&self, key: &str) -> Option<&str> {
        self.attrs.get(key).and_then(Value::as_str)
    }

    pub fn has_mark(&self, kind: MarkKind) -> bool {
        self.marks.iter().any(|m| m.kind == kind)
    }

    /// Concatenated text of this node and its descendants.
    ///
    /// Inline atoms contribute their visible text (status label, mention name, ...), and
    /// block children are separated by newlines.
    pub fn plain_text(&self) -> String {
        let mut out = String::new();
        collect_plain_text(self, &mut out);
        out.trim_end_matches('\n').to_string()
    }
}

fn collect_plain_text(node: &Node, out: &mut String) {
    match node.kind {
        NodeKind::Text => out.push_str(node.text.as_deref().unwrap_or_default()),
        NodeKind::HardBreak => out.push('\n'),
        NodeKind::Status | NodeKind::Mention | NodeKind::Emoji => {
            let label = node
                .attr_str("text")
                .or_else(|| node.attr_str("shortName"))
                .unwrap_or_default();
            out.push_str(label);
        }
        NodeKind::Date => out.push_str(node.attr_str("timestamp").unwrap_or_default()),
        NodeKind::InlineCard | NodeKind::Media => {
            out.push_str(node.attr_str("url").unwrap_or_default())
        }
        _ => {
            for child in &node.content {
                collect_plain_text(child, out);
            }
            if node.kind.is_block() && !out.ends_with('\n') && !out.is_empty() {
                out.push('\n');
            }
        }
    }
}
