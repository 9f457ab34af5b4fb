//! Core data structures for the Intermediate Representation (IR).

use crate::plugin::PluginData;

/// The root of a parsed document.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Document {
    pub blocks: Vec<Block>,
}

/// A block-level element.
#[derive(Debug, Clone, PartialEq)]
pub enum Block {
    Paragraph(Vec<Inline>),
    Heading(Heading),
    List(List),
    BlockQuote(Vec<Block>),
    CodeBlock(CodeBlock),
    Rule,
    Table(Table),
    /// A paragraph that held nothing but an image.
    Image(Image),
    /// A paragraph that held nothing but a bare URL.
    Card(String),
    /// A region matched by a block plugin.
    Plugin(PluginCall),
    /// Input that could not be interpreted, kept verbatim.
    Literal(String),
}

/// Represents a heading with a specific level.
#[derive(Debug, Clone, PartialEq)]
pub struct Heading {
    pub level: u8,
    pub content: Vec<Inline>,
}

/// Represents a list of items.
#[derive(Debug, Clone, PartialEq)]
pub struct List {
    pub ordered: bool,
    pub start: usize,
    pub items: Vec<ListItem>,
}

/// Represents an item in a list.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct ListItem {
    pub children: Vec<Block>,
}

/// Represents a fenced or indented code block.
#[derive(Debug, Clone, PartialEq)]
pub struct CodeBlock {
    pub language: Option<String>,
    pub code: String,
}

/// Represents a table.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Table {
    pub rows: Vec<TableRow>,
}

/// Represents a table row.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct TableRow {
    pub header: bool,
    pub cells: Vec<Vec<Inline>>,
}

/// Represents an image.
#[derive(Debug, Clone, PartialEq)]
pub struct Image {
    pub src: String,
    pub alt: String,
    pub title: Option<String>,
}

/// A plugin match: which plugin claimed the text and what it parsed out of it.
#[derive(Debug, Clone, PartialEq)]
pub struct PluginCall {
    pub plugin: String,
    pub data: PluginData,
}

/// Inline-level content.
#[derive(Debug, Clone, PartialEq)]
pub enum Inline {
    Text(String),
    Strong(Vec<Inline>),
    Emphasis(Vec<Inline>),
    Strike(Vec<Inline>),
    Underline(Vec<Inline>),
    Superscript(Vec<Inline>),
    Subscript(Vec<Inline>),
    TextColor { color: String, content: Vec<Inline> },
    BackgroundColor { color: String, content: Vec<Inline> },
    Code(String),
    Link { url: String, content: Vec<Inline> },
    Image(Image),
    HardBreak,
    /// A span matched by an inline plugin.
    Plugin(PluginCall),
}

impl Inline {
    /// Visible text of this inline and its children, without any markup.
    pub fn plain_text(&self) -> String {
        let mut out = String::new();
        push_plain_text(self, &mut out);
        out
    }
}

fn push_plain_text(inline: &Inline, out: &mut String) {
    match inline {
        Inline::Text(text) | Inline::Code(text) => out.push_str(text),
        Inline::Strong(children)
        | Inline::Emphasis(children)
        | Inline::Strike(children)
        | Inline::Underline(children)
        | Inline::Superscript(children)
        | Inline::Subscript(children)
        | Inline::TextColor {
            content: children, ..
        }
        | Inline::BackgroundColor {
            content: children, ..
        }
        | Inline::Link {
            content: children, ..
        } => {
            for child in children {
                push_plain_text(child, out);
            }
        }
        Inline::Image(image) => out.push_str(&image.alt),
        Inline::HardBreak => out.push('\n'),
        Inline::Plugin(call) => out.push_str(&call.data.raw),
    }
}

/// Visible text of an inline sequence.
pub fn inlines_plain_text(inlines: &[Inline]) -> String {
    inlines.iter().map(Inline::plain_text).collect()
}
