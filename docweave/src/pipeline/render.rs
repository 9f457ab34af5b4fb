//! IR → document nodes.
//!
//! The renderer never fails on content it cannot place. A child a parent does not permit
//! is swapped for a permitted kind (`expand` → `nestedExpand`) or replaced by its plain
//! text, a mark that cannot combine with an enclosing mark is dropped, and oversized
//! tables, lists and text runs are cut with a visible marker. Each of these leaves a
//! [`Diagnostic`]. The only errors are the nesting guard and internal failures.

use crate::diagnostics::Diagnostic;
use crate::error::ConversionError;
use crate::ir::nodes::{Block, Document, Image, Inline, List, PluginCall, Table};
use crate::model::schema::{self, ContentModel};
use crate::model::{Attrs, Mark, MarkKind, Node, NodeKind};
use crate::pipeline::limits::{marker, Limits, ELLIPSIS};
use crate::pipeline::parser::Parser;
use crate::plugin::NestedRenderer;
use crate::registry::PluginRegistry;
use serde_json::Value;

/// Renders one conversion. Owns the warnings collected along the way.
pub struct Renderer<'a> {
    registry: &'a PluginRegistry,
    parser: &'a Parser<'a>,
    limits: Limits,
    warnings: Vec<Diagnostic>,
    depth: usize,
    list_depth: usize,
}

impl<'a> Renderer<'a> {
    pub fn new(
        registry: &'a PluginRegistry,
        parser: &'a Parser<'a>,
        limits: Limits,
        warnings: Vec<Diagnostic>,
    ) -> Self {
        Renderer {
            registry,
            parser,
            limits,
            warnings,
            depth: 0,
            list_depth: 0,
        }
    }

    /// Render a parsed document into top-level block nodes.
    pub fn render_document(&mut self, document: &Document) -> Result<Vec<Node>, ConversionError> {
        let nodes = self.render_block_list(&document.blocks)?;
        Ok(self.place(None, nodes))
    }

    pub fn into_warnings(self) -> Vec<Diagnostic> {
        self.warnings
    }

    fn enter(&mut self) -> Result<(), ConversionError> {
        if self.depth >= self.limits.max_nesting_depth {
            return Err(ConversionError::NestingTooDeep {
                limit: self.limits.max_nesting_depth,
            });
        }
        self.depth += 1;
        Ok(())
    }

    fn leave(&mut self) {
        self.depth = self.depth.saturating_sub(1);
    }

    fn render_block_list(&mut self, blocks: &[Block]) -> Result<Vec<Node>, ConversionError> {
        blocks.iter().map(|block| self.render_block(block)).collect()
    }

    fn render_block(&mut self, block: &Block) -> Result<Node, ConversionError> {
        match block {
            Block::Paragraph(inlines) => Ok(Node::paragraph(self.render_inlines(inlines)?)),

            Block::Heading(heading) => Ok(Node::new(NodeKind::Heading)
                .with_attr("level", heading.level.clamp(1, 6))
                .with_content(self.render_inlines(&heading.content)?)),

            Block::List(list) => {
                self.list_depth += 1;
                let result = self.render_list(list);
                self.list_depth -= 1;
                result
            }

            Block::BlockQuote(children) => {
                self.enter()?;
                let content = self.render_block_list(children)?;
                self.leave();
                self.container(NodeKind::Blockquote, Attrs::new(), content)
            }

            Block::CodeBlock(code) => {
                let mut node = Node::new(NodeKind::CodeBlock);
                if let Some(language) = &code.language {
                    node = node.with_attr("language", language.as_str());
                }
                let mut content = Vec::new();
                self.push_text(&code.code, &[], &mut content);
                Ok(node.with_content(content))
            }

            Block::Rule => Ok(Node::new(NodeKind::Rule)),

            Block::Table(table) => self.render_table(table),

            Block::Image(image) => self.render_image(image),

            Block::Card(url) => Ok(Node::paragraph(vec![
                Node::new(NodeKind::InlineCard).with_attr("url", url.as_str())
            ])),

            Block::Plugin(call) => match self.render_plugin(call)? {
                Some(node) if node.kind.is_inline() => Ok(Node::paragraph(vec![node])),
                Some(node) => Ok(node),
                None => Ok(self.text_paragraph(&call.data.raw)),
            },

            Block::Literal(text) => Ok(self.text_paragraph(text)),
        }
    }

    fn render_list(&mut self, list: &List) -> Result<Node, ConversionError> {
        if self.list_depth > self.limits.max_list_depth {
            self.warnings.push(Diagnostic::truncation(format!(
                "list nested deeper than {} levels was cut",
                self.limits.max_list_depth
            )));
            return Ok(Node::plain_paragraph(&marker("nested list")));
        }

        let kind = if list.ordered {
            NodeKind::OrderedList
        } else {
            NodeKind::BulletList
        };
        let keep = list.items.len().min(self.limits.max_list_items);
        let mut items = Vec::with_capacity(keep + 1);
        self.enter()?;
        for item in &list.items[..keep] {
            self.enter()?;
            let children = self.render_block_list(&item.children)?;
            self.leave();
            items.push(self.container(NodeKind::ListItem, Attrs::new(), children)?);
        }
        self.leave();

        if list.items.len() > keep {
            let dropped = list.items.len() - keep;
            self.warnings.push(Diagnostic::truncation(format!(
                "list of {} items was cut to {keep}",
                list.items.len()
            )));
            items.push(
                Node::new(NodeKind::ListItem).with_content(vec![Node::plain_paragraph(&marker(
                    &format!("{dropped} more items"),
                ))]),
            );
        }

        let mut attrs = Attrs::new();
        if list.ordered {
            attrs.insert("order".into(), list.start.into());
        }
        self.container(kind, attrs, items)
    }

    fn render_table(&mut self, table: &Table) -> Result<Node, ConversionError> {
        let max_rows = self.limits.max_table_rows;
        let max_cells = self.limits.max_table_cells;
        let keep_rows = table.rows.len().min(max_rows);
        let mut rows = Vec::with_capacity(keep_rows + 1);
        let mut width = 1;
        let mut cut_rows = 0;

        self.enter()?;
        for row in &table.rows[..keep_rows] {
            let kind = if row.header {
                NodeKind::TableHeader
            } else {
                NodeKind::TableCell
            };
            let keep_cells = row.cells.len().min(max_cells);
            let mut cells = Vec::with_capacity(keep_cells + 1);
            for cell in &row.cells[..keep_cells] {
                let paragraph = Node::paragraph(self.render_inlines(cell)?);
                cells.push(self.container(kind, Attrs::new(), vec![paragraph])?);
            }
            if row.cells.len() > keep_cells {
                cut_rows += 1;
                let dropped = row.cells.len() - keep_cells;
                cells.push(Node::new(kind).with_content(vec![Node::plain_paragraph(&marker(
                    &format!("{dropped} more cells"),
                ))]));
            }
            width = width.max(cells.len());
            rows.push(self.container(NodeKind::TableRow, Attrs::new(), cells)?);
        }
        self.leave();

        if cut_rows > 0 {
            self.warnings.push(Diagnostic::truncation(format!(
                "{cut_rows} table row(s) had more than {max_cells} cells and were cut"
            )));
        }
        if table.rows.len() > keep_rows {
            let dropped = table.rows.len() - keep_rows;
            self.warnings.push(Diagnostic::truncation(format!(
                "table of {} rows was cut to {keep_rows}",
                table.rows.len()
            )));
            let cell = Node::new(NodeKind::TableCell)
                .with_attr("colspan", width)
                .with_content(vec![Node::plain_paragraph(&marker(&format!(
                    "{dropped} more rows"
                )))]);
            rows.push(Node::new(NodeKind::TableRow).with_content(vec![cell]));
        }

        let mut attrs = Attrs::new();
        attrs.insert("isNumberColumnEnabled".into(), false.into());
        attrs.insert("layout".into(), "default".into());
        attrs.insert("displayMode".into(), "default".into());
        self.container(NodeKind::Table, attrs, rows)
    }

    fn render_image(&mut self, image: &Image) -> Result<Node, ConversionError> {
        if image.src.trim().is_empty() {
            self.warnings.push(Diagnostic::parse(format!(
                "image '{}' has no source; kept as its alt text",
                image.alt
            )));
            return Ok(self.text_paragraph(&image.alt));
        }
        let mut media = Node::new(NodeKind::Media)
            .with_attr("type", "external")
            .with_attr("url", image.src.as_str());
        if !image.alt.is_empty() {
            media = media.with_attr("alt", image.alt.as_str());
        }
        let mut attrs = Attrs::new();
        attrs.insert("layout".into(), "center".into());
        self.container(NodeKind::MediaSingle, attrs, vec![media])
    }

    /// Run a plugin's renderer. `None` means it failed recoverably and the caller should
    /// fall back to the matched text.
    fn render_plugin(&mut self, call: &PluginCall) -> Result<Option<Node>, ConversionError> {
        let registry = self.registry;
        let Some(plugin) = registry.get(&call.plugin) else {
            self.warnings.push(Diagnostic::content_rule(format!(
                "plugin '{}' is not registered; kept as literal text",
                call.plugin
            )));
            return Ok(None);
        };

        self.enter()?;
        let rendered = plugin.render(&call.data, self);
        self.leave();

        match rendered {
            Ok(node) => Ok(Some(node)),
            Err(err @ (ConversionError::NestingTooDeep { .. } | ConversionError::Internal(_))) => {
                Err(err)
            }
            Err(err) => {
                self.warnings.push(Diagnostic::content_rule(format!(
                    "plugin '{}' could not render ({err}); kept as literal text",
                    call.plugin
                )));
                Ok(None)
            }
        }
    }

    fn render_inlines(&mut self, inlines: &[Inline]) -> Result<Vec<Node>, ConversionError> {
        let mut out = Vec::new();
        self.render_marked(inlines, &[], &mut out)?;
        Ok(self.merge_text(out))
    }

    fn render_marked(
        &mut self,
        inlines: &[Inline],
        marks: &[Mark],
        out: &mut Vec<Node>,
    ) -> Result<(), ConversionError> {
        for inline in inlines {
            match inline {
                Inline::Text(text) => self.push_text(text, marks, out),
                Inline::Strong(content) => self.with_mark(Mark::strong(), content, marks, out)?,
                Inline::Emphasis(content) => self.with_mark(Mark::em(), content, marks, out)?,
                Inline::Strike(content) => {
                    self.with_mark(Mark::new(MarkKind::Strike), content, marks, out)?
                }
                Inline::Underline(content) => {
                    self.with_mark(Mark::new(MarkKind::Underline), content, marks, out)?
                }
                Inline::Superscript(content) => {
                    self.with_mark(Mark::subsup(true), content, marks, out)?
                }
                Inline::Subscript(content) => {
                    self.with_mark(Mark::subsup(false), content, marks, out)?
                }
                Inline::TextColor { color, content } => {
                    self.with_mark(Mark::text_color(color), content, marks, out)?
                }
                Inline::BackgroundColor { color, content } => {
                    self.with_mark(Mark::background_color(color), content, marks, out)?
                }
                Inline::Link { url, content } if url.trim().is_empty() => {
                    self.warnings.push(Diagnostic::parse(
                        "link has no destination; kept as plain text",
                    ));
                    self.enter()?;
                    self.render_marked(content, marks, out)?;
                    self.leave();
                }
                Inline::Link { url, content } => {
                    self.with_mark(Mark::link(url), content, marks, out)?
                }
                Inline::Code(code) => {
                    let combined = self.combine(marks, Mark::code());
                    self.push_text(code, &combined, out);
                }
                Inline::Image(image) if image.src.trim().is_empty() => {
                    self.warnings.push(Diagnostic::parse(format!(
                        "image '{}' has no source; kept as its alt text",
                        image.alt
                    )));
                    self.push_text(&image.alt, marks, out);
                }
                Inline::Image(image) => {
                    self.warnings.push(Diagnostic::content_rule(format!(
                        "image '{}' inside text is not permitted; replaced with a link",
                        image.src
                    )));
                    let label = if image.alt.is_empty() {
                        &image.src
                    } else {
                        &image.alt
                    };
                    let combined = self.combine(marks, Mark::link(&image.src));
                    self.push_text(label, &combined, out);
                }
                Inline::HardBreak => out.push(Node::hard_break()),
                Inline::Plugin(call) => match self.render_plugin(call)? {
                    Some(node) if node.kind.is_inline() => out.push(node),
                    Some(node) => {
                        self.warnings.push(Diagnostic::content_rule(format!(
                            "'{}' from plugin '{}' is not permitted inside text; \
                             replaced with plain text",
                            node.kind, call.plugin
                        )));
                        let text = node.plain_text();
                        let text = if text.is_empty() { &call.data.raw } else { &text };
                        self.push_text(text, marks, out);
                    }
                    None => self.push_text(&call.data.raw, marks, out),
                },
            }
        }
        Ok(())
    }

    fn with_mark(
        &mut self,
        mark: Mark,
        content: &[Inline],
        marks: &[Mark],
        out: &mut Vec<Node>,
    ) -> Result<(), ConversionError> {
        self.enter()?;
        let combined = self.combine(marks, mark);
        self.render_marked(content, &combined, out)?;
        self.leave();
        Ok(())
    }

    /// `marks` plus `mark`, unless `mark` conflicts with one of them (then it is dropped
    /// and reported) or is already present.
    fn combine(&mut self, marks: &[Mark], mark: Mark) -> Vec<Mark> {
        let mut combined = marks.to_vec();
        if marks.iter().any(|m| m.kind == mark.kind) {
            return combined;
        }
        match schema::first_conflict(marks, mark.kind) {
            Some(conflict) => self.warnings.push(Diagnostic::mark_conflict(format!(
                "'{}' mark cannot be combined with '{conflict}'; dropped",
                mark.kind
            ))),
            None => combined.push(mark),
        }
        combined
    }

    /// Push a text node, cutting it at the text length limit.
    fn push_text(&mut self, text: &str, marks: &[Mark], out: &mut Vec<Node>) {
        if text.is_empty() {
            return;
        }
        let max = self.limits.max_text_length;
        let length = text.chars().count();
        let text = if length > max {
            self.warnings.push(Diagnostic::truncation(format!(
                "text run of {length} characters was cut to {max}"
            )));
            let mut cut: String = text.chars().take(max).collect();
            cut.push(ELLIPSIS);
            cut
        } else {
            text.to_string()
        };
        out.push(Node::text_with_marks(text, marks.to_vec()));
    }

    /// Join neighbouring text nodes with identical marks, staying within the length limit.
    fn merge_text(&self, nodes: Vec<Node>) -> Vec<Node> {
        let max = self.limits.max_text_length;
        let mut out: Vec<Node> = Vec::with_capacity(nodes.len());
        for node in nodes {
            if let Some(prev) = out.last_mut() {
                if prev.kind == NodeKind::Text
                    && node.kind == NodeKind::Text
                    && prev.marks == node.marks
                {
                    if let (Some(a), Some(b)) = (prev.text.as_mut(), node.text.as_deref()) {
                        if a.chars().count() + b.chars().count() <= max {
                            a.push_str(b);
                            continue;
                        }
                    }
                }
            }
            out.push(node);
        }
        out
    }

    /// A paragraph showing `text` literally, one hard break per line break.
    fn text_paragraph(&mut self, text: &str) -> Node {
        let mut content = Vec::new();
        for (index, line) in text.lines().enumerate() {
            if index > 0 {
                content.push(Node::hard_break());
            }
            self.push_text(line, &[], &mut content);
        }
        Node::paragraph(content)
    }

    /// Build a container after fitting `children` to its content rules.
    fn container(
        &mut self,
        kind: NodeKind,
        attrs: Attrs,
        children: Vec<Node>,
    ) -> Result<Node, ConversionError> {
        let content = self.place(Some(kind), children);
        Ok(schema::build(kind, attrs, content)?)
    }

    /// Fit `children` to what `parent` (`None` = document root) permits.
    fn place(&mut self, parent: Option<NodeKind>, children: Vec<Node>) -> Vec<Node> {
        let mut placed = Vec::with_capacity(children.len());
        for child in children {
            if fits(parent, &child) {
                placed.push(child);
            } else if let Some(kind) = schema::substitute(parent, child.kind) {
                let Node {
                    attrs,
                    content,
                    marks,
                    ..
                } = child;
                let mut node = Node::new(kind).with_content(self.place(Some(kind), content));
                node.attrs = attrs;
                node.marks = marks;
                placed.push(node);
            } else if let Some(node) = self.degrade(parent, child) {
                placed.push(node);
            }
        }
        if let Some(kind) = parent {
            if placed.len() < schema::cardinality(kind).0 {
                placed.extend(filler(kind));
            }
        }
        placed
    }

    /// Replace a misplaced child with its plain text in a form `parent` accepts.
    fn degrade(&mut self, parent: Option<NodeKind>, child: Node) -> Option<Node> {
        if child.kind.is_inline() && allows(parent, NodeKind::Paragraph) {
            return Some(Node::paragraph(vec![child]));
        }
        let location =
            parent.map_or_else(|| "the document root".to_string(), |p| format!("'{p}'"));
        let text = child.plain_text();
        if text.trim().is_empty() {
            self.warnings.push(Diagnostic::content_rule(format!(
                "'{}' is not permitted inside {location}; dropped",
                child.kind
            )));
            return None;
        }

        let replacement = match parent.map(schema::content_model) {
            Some(ContentModel::Inline) | Some(ContentModel::PlainText) => {
                let mut nodes = Vec::new();
                self.push_text(&text, &[], &mut nodes);
                nodes.pop()
            }
            _ => {
                let paragraph = self.text_paragraph(&text);
                wrap_for(parent, paragraph)
            }
        };
        let outcome = if replacement.is_some() {
            "replaced with plain text"
        } else {
            "dropped"
        };
        self.warnings.push(Diagnostic::content_rule(format!(
            "'{}' is not permitted inside {location}; {outcome}",
            child.kind
        )));
        replacement
    }
}

impl NestedRenderer for Renderer<'_> {
    fn render_blocks(&mut self, markdown: &str) -> Result<Vec<Node>, ConversionError> {
        let parser = self.parser;
        let document = parser.parse(markdown, self.depth, &mut self.warnings)?;
        self.render_block_list(&document.blocks)
    }

    fn render_inline(&mut self, markdown: &str) -> Result<Vec<Node>, ConversionError> {
        let parser = self.parser;
        let inlines = parser.parse_inline(markdown, self.depth, &mut self.warnings)?;
        self.render_inlines(&inlines)
    }

    fn admit(&mut self, parent: NodeKind, children: Vec<Node>) -> Vec<Node> {
        self.place(Some(parent), children)
    }

    fn warn(&mut self, diagnostic: Diagnostic) {
        self.warnings.push(diagnostic);
    }
}

fn fits(parent: Option<NodeKind>, child: &Node) -> bool {
    match parent {
        Some(parent) => schema::permits(parent, child),
        None => schema::permits_at_root(child),
    }
}

fn allows(parent: Option<NodeKind>, kind: NodeKind) -> bool {
    schema::allows_kind(parent, kind)
}

/// Wrap a paragraph in the closest container `parent` accepts.
fn wrap_for(parent: Option<NodeKind>, paragraph: Node) -> Option<Node> {
    if allows(parent, NodeKind::Paragraph) {
        return Some(paragraph);
    }
    let wrappers = [
        NodeKind::ListItem,
        NodeKind::TableCell,
        NodeKind::LayoutColumn,
        NodeKind::TableRow,
    ];
    let wrapper = wrappers.into_iter().find(|kind| allows(parent, *kind))?;
    Some(wrap(wrapper, paragraph))
}

fn wrap(kind: NodeKind, paragraph: Node) -> Node {
    match kind {
        NodeKind::TableRow => {
            Node::new(kind).with_content(vec![wrap(NodeKind::TableCell, paragraph)])
        }
        NodeKind::LayoutColumn => Node::new(kind)
            .with_attr("width", Value::from(100.0))
            .with_content(vec![paragraph]),
        _ => Node::new(kind).with_content(vec![paragraph]),
    }
}

/// Minimal valid content for a container that ended up empty.
fn filler(parent: NodeKind) -> Option<Node> {
    wrap_for(Some(parent), Node::paragraph(Vec::new()))
}
