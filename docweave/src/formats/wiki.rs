//! Wiki markup serialization (IR → flat markup)
//!
//! The flat format is the line-oriented markup accepted by self-managed deployments:
//! `h1.` headings, `*bold*`, `_italic_`, `{{code}}`, `[text|url]` links, `*`/`#` list
//! prefixes, `||header||` table rows and `{code}`/`{quote}` blocks. Plugins render
//! themselves through [`Plugin::render_flat`](crate::plugin::Plugin::render_flat).

use crate::diagnostics::Diagnostic;
use crate::error::ConversionError;
use crate::ir::nodes::{Block, Document, Inline, List, PluginCall, Table};
use crate::pipeline::parser::Parser;
use crate::plugin::FlatRenderer;
use crate::registry::PluginRegistry;
use tracing::debug;

/// Writes IR as wiki markup. Owns the warnings collected along the way.
pub struct WikiWriter<'a> {
    registry: &'a PluginRegistry,
    parser: &'a Parser<'a>,
    warnings: Vec<Diagnostic>,
    depth: usize,
}

impl<'a> WikiWriter<'a> {
    pub fn new(
        registry: &'a PluginRegistry,
        parser: &'a Parser<'a>,
        warnings: Vec<Diagnostic>,
    ) -> Self {
        WikiWriter {
            registry,
            parser,
            warnings,
            depth: 0,
        }
    }

    pub fn write(&mut self, document: &Document) -> Result<String, ConversionError> {
        self.blocks(&document.blocks)
    }

    pub fn into_warnings(self) -> Vec<Diagnostic> {
        self.warnings
    }

    fn blocks(&mut self, blocks: &[Block]) -> Result<String, ConversionError> {
        let mut parts = Vec::with_capacity(blocks.len());
        for block in blocks {
            let text = self.block(block)?;
            if !text.is_empty() {
                parts.push(text);
            }
        }
        Ok(parts.join("\n\n"))
    }

    fn block(&mut self, block: &Block) -> Result<String, ConversionError> {
        Ok(match block {
            Block::Paragraph(inlines) => self.inlines(inlines)?,
            Block::Heading(heading) => {
                format!("h{}. {}", heading.level, self.inlines(&heading.content)?)
            }
            Block::List(list) => self.list(list, "")?,
            Block::BlockQuote(children) => {
                format!("{{quote}}\n{}\n{{quote}}", self.blocks(children)?)
            }
            Block::CodeBlock(code) => match &code.language {
                Some(language) => format!("{{code:{language}}}\n{}\n{{code}}", code.code),
                None => format!("{{code}}\n{}\n{{code}}", code.code),
            },
            Block::Rule => "----".to_string(),
            Block::Table(table) => self.table(table)?,
            Block::Image(image) => self.image(&image.src, &image.alt),
            Block::Card(url) => format!("[{url}]"),
            Block::Plugin(call) => self.plugin(call)?,
            Block::Literal(text) => text.clone(),
        })
    }

    fn list(&mut self, list: &List, prefix: &str) -> Result<String, ConversionError> {
        let prefix = format!("{prefix}{}", if list.ordered { '#' } else { '*' });
        let mut lines = Vec::new();
        for item in &list.items {
            let mut first = true;
            for child in &item.children {
                match child {
                    Block::List(nested) => lines.push(self.list(nested, &prefix)?),
                    other if first => lines.push(format!("{prefix} {}", self.block(other)?)),
                    other => lines.push(self.block(other)?),
                }
                first = false;
            }
            if item.children.is_empty() {
                lines.push(prefix.clone());
            }
        }
        Ok(lines.join("\n"))
    }

    fn table(&mut self, table: &Table) -> Result<String, ConversionError> {
        let mut lines = Vec::with_capacity(table.rows.len());
        for row in &table.rows {
            let separator = if row.header { "||" } else { "|" };
            let mut line = String::from(separator);
            for cell in &row.cells {
                let text = self.inlines(cell)?;
                line.push_str(if text.is_empty() { " " } else { &text });
                line.push_str(separator);
            }
            lines.push(line);
        }
        Ok(lines.join("\n"))
    }

    fn plugin(&mut self, call: &PluginCall) -> Result<String, ConversionError> {
        let registry = self.registry;
        let Some(plugin) = registry.get(&call.plugin) else {
            self.warnings.push(Diagnostic::content_rule(format!(
                "plugin '{}' is not registered; kept as literal text",
                call.plugin
            )));
            return Ok(call.data.raw.clone());
        };
        self.depth += 1;
        let rendered = plugin.render_flat(&call.data, self);
        self.depth -= 1;
        match rendered {
            Ok(text) => Ok(text),
            Err(err @ (ConversionError::NestingTooDeep { .. } | ConversionError::Internal(_))) => {
                Err(err)
            }
            Err(err) => {
                debug!(
                    plugin = %call.plugin,
                    error = %err,
                    "flat rendering failed; using raw text"
                );
                self.warnings.push(Diagnostic::content_rule(format!(
                    "plugin '{}' could not render ({err}); kept as literal text",
                    call.plugin
                )));
                Ok(call.data.raw.clone())
            }
        }
    }

    fn inlines(&mut self, inlines: &[Inline]) -> Result<String, ConversionError> {
        let mut out = String::new();
        for inline in inlines {
            match inline {
                Inline::Text(text) => out.push_str(text),
                Inline::Strong(content) => self.wrap(&mut out, "*", content, "*")?,
                Inline::Emphasis(content) => self.wrap(&mut out, "_", content, "_")?,
                Inline::Strike(content) => self.wrap(&mut out, "-", content, "-")?,
                Inline::Underline(content) => self.wrap(&mut out, "+", content, "+")?,
                Inline::Superscript(content) => self.wrap(&mut out, "^", content, "^")?,
                Inline::Subscript(content) => self.wrap(&mut out, "~", content, "~")?,
                Inline::TextColor { color, content } => {
                    self.wrap(&mut out, &format!("{{color:{color}}}"), content, "{color}")?
                }
                Inline::BackgroundColor { content, .. } => out.push_str(&self.inlines(content)?),
                Inline::Code(code) => {
                    out.push_str("{{");
                    out.push_str(code);
                    out.push_str("}}");
                }
                Inline::Link { url, content } if url.trim().is_empty() => {
                    self.warnings.push(Diagnostic::parse(
                        "link has no destination; kept as plain text",
                    ));
                    out.push_str(&self.inlines(content)?);
                }
                Inline::Link { url, content } => {
                    let text = self.inlines(content)?;
                    if text.is_empty() || text == *url {
                        out.push_str(&format!("[{url}]"));
                    } else {
                        out.push_str(&format!("[{text}|{url}]"));
                    }
                }
                Inline::Image(image) => {
                    let image = self.image(&image.src, &image.alt);
                    out.push_str(&image);
                }
                Inline::HardBreak => out.push('\n'),
                Inline::Plugin(call) => out.push_str(&self.plugin(call)?),
            }
        }
        Ok(out)
    }

    fn image(&mut self, src: &str, alt: &str) -> String {
        if src.trim().is_empty() {
            self.warnings.push(Diagnostic::parse(format!(
                "image '{alt}' has no source; kept as its alt text"
            )));
            return alt.to_string();
        }
        format!("!{src}!")
    }

    fn wrap(
        &mut self,
        out: &mut String,
        open: &str,
        content: &[Inline],
        close: &str,
    ) -> Result<(), ConversionError> {
        out.push_str(open);
        out.push_str(&self.inlines(content)?);
        out.push_str(close);
        Ok(())
    }
}

impl FlatRenderer for WikiWriter<'_> {
    fn render_blocks(&mut self, markdown: &str) -> Result<String, ConversionError> {
        let parser = self.parser;
        let document = parser.parse(markdown, self.depth, &mut self.warnings)?;
        self.blocks(&document.blocks)
    }

    fn render_inline(&mut self, markdown: &str) -> Result<String, ConversionError> {
        let parser = self.parser;
        let inlines = parser.parse_inline(markdown, self.depth, &mut self.warnings)?;
        self.inlines(&inlines)
    }
}
