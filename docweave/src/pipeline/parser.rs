//! Markdown parsing (markdown + plugin syntax → IR)
//!
//! Pipeline: source → block plugin regions and markdown segments → Comrak AST → IR.
//!
//! Block plugin regions are cut out of the source before the markdown grammar runs, so a
//! `:::panel` body is never reinterpreted by Comrak. Inside the markdown segments, inline
//! plugin syntax is matched only in unmarked text runs; `**@alice**` stays literal text.
//! Inline HTML for underline, sub/superscript and colors is folded into mark spans.

use crate::diagnostics::Diagnostic;
use crate::error::ConversionError;
use crate::ir::nodes::{
    Block, CodeBlock, Document, Heading, Image, Inline, List, ListItem, PluginCall, Table,
    TableRow,
};
use crate::pipeline::limits::Limits;
use crate::plugin::Plugin;
use crate::plugins::directive::{self, FenceState};
use crate::registry::PluginRegistry;
use comrak::nodes::{AstNode, ListType, NodeValue};
use comrak::{parse_document, Arena, ComrakOptions};
use once_cell::sync::Lazy;
use regex::Regex;
use tracing::trace;

static OPEN_TAG: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)^<(u|sub|sup|span)(\s[^>]*)?>$").expect("open tag pattern is valid")
});

static CLOSE_TAG: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)^</(u|sub|sup|span)\s*>$").expect("close tag pattern is valid"));

static BREAK_TAG: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)^<br\s*/?>$").expect("break tag pattern is valid"));

static STYLE_ATTR: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r#"(?i)style\s*=\s*(?:"([^"]*)"|'([^']*)')"#).expect("style pattern is valid")
});

static COLOR_DECL: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)(?:^|;)\s*(background-color|color)\s*:\s*([^;]+?)\s*(?:;|$)")
        .expect("color pattern is valid")
});

fn comrak_options() -> ComrakOptions<'static> {
    let mut options = ComrakOptions::default();
    options.extension.table = true;
    options.extension.strikethrough = true;
    options.extension.autolink = true;
    options.extension.superscript = true;
    options
}

fn check_depth(depth: usize, limit: usize) -> Result<(), ConversionError> {
    if depth > limit {
        Err(ConversionError::NestingTooDeep { limit })
    } else {
        Ok(())
    }
}

/// A top-level piece of the source: markdown for Comrak, or a claimed plugin region.
enum Segment {
    Markdown(String),
    Block(Block),
}

/// Parses markdown with the plugins of one registry.
pub struct Parser<'r> {
    registry: &'r PluginRegistry,
    max_depth: usize,
}

impl<'r> Parser<'r> {
    pub fn new(registry: &'r PluginRegistry, limits: &Limits) -> Self {
        Parser {
            registry,
            max_depth: limits.max_nesting_depth,
        }
    }

    /// Parse a block-level source. `depth` is the nesting level the source sits at
    /// (0 for a whole document, deeper for plugin bodies).
    pub fn parse(
        &self,
        source: &str,
        depth: usize,
        warnings: &mut Vec<Diagnostic>,
    ) -> Result<Document, ConversionError> {
        check_depth(depth, self.max_depth)?;
        let mut blocks = Vec::new();
        for segment in self.segments(source, warnings) {
            match segment {
                Segment::Markdown(markdown) => {
                    blocks.extend(self.parse_markdown(&markdown, depth, warnings)?)
                }
                Segment::Block(block) => blocks.push(block),
            }
        }
        Ok(Document { blocks })
    }

    /// Parse a source as a single run of inline content.
    ///
    /// Paragraphs are joined with hard breaks. Block constructs have no inline form and
    /// are dropped with a warning.
    pub fn parse_inline(
        &self,
        source: &str,
        depth: usize,
        warnings: &mut Vec<Diagnostic>,
    ) -> Result<Vec<Inline>, ConversionError> {
        check_depth(depth, self.max_depth)?;
        let mut inlines = Vec::new();
        for block in self.parse_markdown(source, depth, warnings)? {
            let content = match block {
                Block::Paragraph(content) => content,
                Block::Heading(heading) => heading.content,
                Block::CodeBlock(code) => vec![Inline::Code(code.code)],
                Block::Card(url) => vec![Inline::Text(url)],
                Block::Literal(text) => vec![Inline::Text(text)],
                Block::Image(image) => vec![Inline::Image(image)],
                _ => {
                    warnings.push(Diagnostic::content_rule(
                        "block content cannot appear in inline context; dropped",
                    ));
                    continue;
                }
            };
            if !inlines.is_empty() {
                inlines.push(Inline::HardBreak);
            }
            inlines.extend(content);
        }
        Ok(inlines)
    }

    /// Split the source into markdown runs and block plugin regions.
    fn segments(&self, source: &str, warnings: &mut Vec<Diagnostic>) -> Vec<Segment> {
        let lines: Vec<&str> = source.lines().collect();
        let mut segments = Vec::new();
        let mut pending: Vec<&str> = Vec::new();
        let mut fence = FenceState::default();
        let mut index = 0;

        while index < lines.len() {
            let line = lines[index];
            if !fence.observe(line) {
                let claimant = self
                    .registry
                    .block_plugins()
                    .find(|p| p.block_rule().is_some_and(|rule| rule.opens(line)));
                if let Some(plugin) = claimant {
                    match directive::find_close(&lines, index) {
                        Some(close) => {
                            if !pending.is_empty() {
                                segments.push(Segment::Markdown(pending.join("\n")));
                                pending.clear();
                            }
                            let raw = lines[index..=close].join("\n");
                            segments.push(Segment::Block(claim_block(plugin, raw, warnings)));
                            index = close + 1;
                            continue;
                        }
                        None => warnings.push(Diagnostic::parse(format!(
                            "'{}' block opened on line {} is never closed; kept as text",
                            plugin.name(),
                            index + 1
                        ))),
                    }
                }
            }
            pending.push(line);
            index += 1;
        }
        if !pending.is_empty() {
            segments.push(Segment::Markdown(pending.join("\n")));
        }
        segments
    }

    fn parse_markdown(
        &self,
        source: &str,
        depth: usize,
        warnings: &mut Vec<Diagnostic>,
    ) -> Result<Vec<Block>, ConversionError> {
        if source.trim().is_empty() {
            return Ok(Vec::new());
        }
        let arena = Arena::new();
        let options = comrak_options();
        let root = parse_document(&arena, source, &options);
        self.convert_blocks(root, depth, warnings)
    }

    fn convert_blocks<'a>(
        &self,
        node: &'a AstNode<'a>,
        depth: usize,
        warnings: &mut Vec<Diagnostic>,
    ) -> Result<Vec<Block>, ConversionError> {
        let mut blocks = Vec::new();
        for child in node.children() {
            if let Some(block) = self.convert_block(child, depth, warnings)? {
                blocks.push(block);
            }
        }
        Ok(blocks)
    }

    fn convert_block<'a>(
        &self,
        node: &'a AstNode<'a>,
        depth: usize,
        warnings: &mut Vec<Diagnostic>,
    ) -> Result<Option<Block>, ConversionError> {
        check_depth(depth, self.max_depth)?;
        let data = node.data.borrow();

        let block = match &data.value {
            NodeValue::Paragraph => {
                let inlines = self.convert_inlines(node, depth + 1, warnings)?;
                classify_paragraph(inlines)
            }

            NodeValue::Heading(heading) => Block::Heading(Heading {
                level: heading.level,
                content: self.convert_inlines(node, depth + 1, warnings)?,
            }),

            NodeValue::List(list) => {
                let mut items = Vec::new();
                for item in node.children() {
                    items.push(ListItem {
                        children: self.convert_blocks(item, depth + 2, warnings)?,
                    });
                }
                Block::List(List {
                    ordered: list.list_type == ListType::Ordered,
                    start: list.start,
                    items,
                })
            }

            NodeValue::BlockQuote => {
                Block::BlockQuote(self.convert_blocks(node, depth + 1, warnings)?)
            }

            NodeValue::CodeBlock(code_block) => Block::CodeBlock(CodeBlock {
                language: code_block
                    .info
                    .split_whitespace()
                    .next()
                    .map(str::to_string),
                code: code_block.literal.trim_end_matches('\n').to_string(),
            }),

            NodeValue::HtmlBlock(html) => Block::Literal(html.literal.trim_end().to_string()),

            NodeValue::ThematicBreak => Block::Rule,

            NodeValue::Table(_) => {
                let mut rows = Vec::new();
                for row in node.children() {
                    let header = matches!(row.data.borrow().value, NodeValue::TableRow(true));
                    let mut cells = Vec::new();
                    for cell in row.children() {
                        cells.push(self.convert_inlines(cell, depth + 2, warnings)?);
                    }
                    rows.push(TableRow { header, cells });
                }
                Block::Table(Table { rows })
            }

            _ => {
                let text = collect_text(node);
                if text.trim().is_empty() {
                    return Ok(None);
                }
                Block::Literal(text)
            }
        };
        Ok(Some(block))
    }

    /// Inline content of a leaf block, with inline plugins matched in its plain runs.
    fn convert_inlines<'a>(
        &self,
        node: &'a AstNode<'a>,
        depth: usize,
        warnings: &mut Vec<Diagnostic>,
    ) -> Result<Vec<Inline>, ConversionError> {
        let inlines = self.inline_children(node, depth, warnings)?;
        Ok(self.scan_plugins(inlines, warnings))
    }

    fn inline_children<'a>(
        &self,
        node: &'a AstNode<'a>,
        depth: usize,
        warnings: &mut Vec<Diagnostic>,
    ) -> Result<Vec<Inline>, ConversionError> {
        check_depth(depth, self.max_depth)?;
        let mut spans = HtmlSpans::default();
        for child in node.children() {
            let data = child.data.borrow();
            match &data.value {
                NodeValue::HtmlInline(html) => spans.tag(html, warnings),
                value => {
                    if let Some(inline) = self.convert_inline(child, value, depth, warnings)? {
                        spans.push(inline);
                    }
                }
            }
        }
        Ok(merge_text(spans.finish(warnings)))
    }

    fn convert_inline<'a>(
        &self,
        node: &'a AstNode<'a>,
        value: &NodeValue,
        depth: usize,
        warnings: &mut Vec<Diagnostic>,
    ) -> Result<Option<Inline>, ConversionError> {
        let inline = match value {
            NodeValue::Text(text) => Inline::Text(text.clone()),
            NodeValue::SoftBreak => Inline::Text(" ".to_string()),
            NodeValue::LineBreak => Inline::HardBreak,
            NodeValue::Code(code) => Inline::Code(code.literal.clone()),
            NodeValue::Strong => Inline::Strong(self.inline_children(node, depth + 1, warnings)?),
            NodeValue::Emph => Inline::Emphasis(self.inline_children(node, depth + 1, warnings)?),
            NodeValue::Strikethrough => {
                Inline::Strike(self.inline_children(node, depth + 1, warnings)?)
            }
            NodeValue::Superscript => {
                Inline::Superscript(self.inline_children(node, depth + 1, warnings)?)
            }
            NodeValue::Link(link) => Inline::Link {
                url: link.url.clone(),
                content: self.inline_children(node, depth + 1, warnings)?,
            },
            NodeValue::Image(link) => Inline::Image(Image {
                src: link.url.clone(),
                alt: collect_text(node),
                title: (!link.title.is_empty()).then(|| link.title.clone()),
            }),
            _ => {
                let text = collect_text(node);
                if text.is_empty() {
                    return Ok(None);
                }
                Inline::Text(text)
            }
        };
        Ok(Some(inline))
    }

    /// Split unmarked text runs around inline plugin matches.
    fn scan_plugins(&self, inlines: Vec<Inline>, warnings: &mut Vec<Diagnostic>) -> Vec<Inline> {
        let plugins: Vec<&dyn Plugin> = self.registry.inline_plugins().collect();
        if plugins.is_empty() {
            return inlines;
        }
        let mut out = Vec::with_capacity(inlines.len());
        for inline in inlines {
            match inline {
                Inline::Text(text) => split_text(&text, &plugins, &mut out, warnings),
                other => out.push(other),
            }
        }
        out
    }
}

fn claim_block(plugin: &dyn Plugin, raw: String, warnings: &mut Vec<Diagnostic>) -> Block {
    trace!(plugin = plugin.name(), "block plugin matched");
    match plugin.parse(&raw) {
        Ok(data) => Block::Plugin(PluginCall {
            plugin: plugin.name().to_string(),
            data,
        }),
        Err(err) => {
            warnings.push(Diagnostic::parse(format!(
                "{} block: {err}; kept as literal text",
                plugin.name()
            )));
            Block::Literal(raw)
        }
    }
}

/// Matches of all inline plugins in `text`, earliest first; ties go to the plugin
/// registered first. Overlapping later matches are skipped.
fn split_text(
    text: &str,
    plugins: &[&dyn Plugin],
    out: &mut Vec<Inline>,
    warnings: &mut Vec<Diagnostic>,
) {
    let mut matches: Vec<(usize, usize, usize)> = Vec::new();
    for (order, plugin) in plugins.iter().enumerate() {
        let Some(pattern) = plugin.inline_pattern() else {
            continue;
        };
        for caps in pattern.captures_iter(text) {
            let Some(span) = caps.name("span").or_else(|| caps.get(0)) else {
                continue;
            };
            if !span.is_empty() {
                matches.push((span.start(), order, span.end()));
            }
        }
    }
    matches.sort_unstable();

    let mut cursor = 0;
    for (start, order, end) in matches {
        if start < cursor {
            continue;
        }
        let plugin = plugins[order];
        let raw = &text[start..end];
        match plugin.parse(raw) {
            Ok(data) => {
                trace!(plugin = plugin.name(), raw, "inline plugin matched");
                if start > cursor {
                    out.push(Inline::Text(text[cursor..start].to_string()));
                }
                out.push(Inline::Plugin(PluginCall {
                    plugin: plugin.name().to_string(),
                    data,
                }));
                cursor = end;
            }
            Err(err) => warnings.push(Diagnostic::parse(format!(
                "{} '{raw}': {err}; kept as literal text",
                plugin.name()
            ))),
        }
    }
    if cursor < text.len() {
        out.push(Inline::Text(text[cursor..].to_string()));
    }
}

/// A paragraph holding only an image or only a bare URL gets its own block form.
fn classify_paragraph(mut inlines: Vec<Inline>) -> Block {
    if inlines.len() == 1 {
        match &inlines[0] {
            Inline::Image(_) => {
                if let Some(Inline::Image(image)) = inlines.pop() {
                    return Block::Image(image);
                }
            }
            Inline::Link { url, content } if is_bare_url(url, content) => {
                return Block::Card(url.clone());
            }
            _ => {}
        }
    }
    Block::Paragraph(inlines)
}

fn is_bare_url(url: &str, content: &[Inline]) -> bool {
    if !(url.starts_with("http://") || url.starts_with("https://")) {
        return false;
    }
    match content {
        [Inline::Text(text)] => text == url || format!("http://{text}") == url,
        _ => false,
    }
}

/// Concatenate adjacent text runs.
fn merge_text(inlines: Vec<Inline>) -> Vec<Inline> {
    let mut out: Vec<Inline> = Vec::with_capacity(inlines.len());
    for inline in inlines {
        match (out.last_mut(), inline) {
            (Some(Inline::Text(prev)), Inline::Text(text)) => prev.push_str(&text),
            (_, inline) => out.push(inline),
        }
    }
    out
}

fn collect_text<'a>(node: &'a AstNode<'a>) -> String {
    let mut text = String::new();
    collect_text_content(node, &mut text);
    text
}

fn collect_text_content<'a>(node: &'a AstNode<'a>, output: &mut String) {
    match &node.data.borrow().value {
        NodeValue::Text(text) => output.push_str(text),
        NodeValue::Code(code) => output.push_str(&code.literal),
        NodeValue::SoftBreak | NodeValue::LineBreak => output.push(' '),
        _ => {
            for child in node.children() {
                collect_text_content(child, output);
            }
        }
    }
}

/// A mark-bearing HTML tag.
#[derive(Debug, Clone, PartialEq)]
enum HtmlMark {
    Underline,
    Sub,
    Sup,
    TextColor(String),
    BackgroundColor(String),
    /// A `<span>` without a recognized style: its content is kept unmarked.
    Span,
}

impl HtmlMark {
    fn from_open_tag(html: &str) -> Option<Self> {
        let caps = OPEN_TAG.captures(html.trim())?;
        let mark = match caps[1].to_ascii_lowercase().as_str() {
            "u" => HtmlMark::Underline,
            "sub" => HtmlMark::Sub,
            "sup" => HtmlMark::Sup,
            _ => span_mark(caps.get(2).map_or("", |m| m.as_str())),
        };
        Some(mark)
    }

    fn tag_name(&self) -> &'static str {
        match self {
            HtmlMark::Underline => "u",
            HtmlMark::Sub => "sub",
            HtmlMark::Sup => "sup",
            HtmlMark::TextColor(_) | HtmlMark::BackgroundColor(_) | HtmlMark::Span => "span",
        }
    }

    fn wrap(self, content: Vec<Inline>) -> Vec<Inline> {
        let content = merge_text(content);
        if content.is_empty() {
            return content;
        }
        vec![match self {
            HtmlMark::Underline => Inline::Underline(content),
            HtmlMark::Sub => Inline::Subscript(content),
            HtmlMark::Sup => Inline::Superscript(content),
            HtmlMark::TextColor(color) => Inline::TextColor { color, content },
            HtmlMark::BackgroundColor(color) => Inline::BackgroundColor { color, content },
            HtmlMark::Span => return content,
        }]
    }
}

fn span_mark(attributes: &str) -> HtmlMark {
    let Some(style) = STYLE_ATTR
        .captures(attributes)
        .and_then(|caps| caps.get(1).or_else(|| caps.get(2)))
    else {
        return HtmlMark::Span;
    };
    // `background-color` wins over `color` when both are present.
    let mut mark = HtmlMark::Span;
    for decl in COLOR_DECL.captures_iter(style.as_str()) {
        let value = decl[2].to_string();
        match decl[1].to_ascii_lowercase().as_str() {
            "background-color" => return HtmlMark::BackgroundColor(value),
            _ => mark = HtmlMark::TextColor(value),
        }
    }
    mark
}

struct OpenSpan {
    mark: HtmlMark,
    raw: String,
    content: Vec<Inline>,
}

/// Folds inline HTML open/close tags into nested mark spans.
#[derive(Default)]
struct HtmlSpans {
    root: Vec<Inline>,
    open: Vec<OpenSpan>,
}

impl HtmlSpans {
    fn push(&mut self, inline: Inline) {
        match self.open.last_mut() {
            Some(span) => span.content.push(inline),
            None => self.root.push(inline),
        }
    }

    fn extend(&mut self, inlines: Vec<Inline>) {
        for inline in inlines {
            self.push(inline);
        }
    }

    fn tag(&mut self, html: &str, warnings: &mut Vec<Diagnostic>) {
        if let Some(mark) = HtmlMark::from_open_tag(html) {
            self.open.push(OpenSpan {
                mark,
                raw: html.to_string(),
                content: Vec::new(),
            });
        } else if let Some(caps) = CLOSE_TAG.captures(html.trim()) {
            let name = caps[1].to_ascii_lowercase();
            match self.open.last() {
                Some(span) if span.mark.tag_name() == name => {
                    if let Some(span) = self.open.pop() {
                        let wrapped = span.mark.wrap(span.content);
                        self.extend(wrapped);
                    }
                }
                _ => {
                    warnings.push(Diagnostic::parse(format!(
                        "closing tag '{html}' has no matching opening tag; kept as text"
                    )));
                    self.push(Inline::Text(html.to_string()));
                }
            }
        } else if BREAK_TAG.is_match(html.trim()) {
            self.push(Inline::HardBreak);
        } else {
            self.push(Inline::Text(html.to_string()));
        }
    }

    fn finish(mut self, warnings: &mut Vec<Diagnostic>) -> Vec<Inline> {
        while let Some(span) = self.open.pop() {
            warnings.push(Diagnostic::parse(format!(
                "tag '{}' is never closed; kept as text",
                span.raw
            )));
            self.push(Inline::Text(span.raw));
            self.extend(span.content);
        }
        self.root
    }
}
