//! Plugin trait definition
//!
//! A plugin adds syntax to the markdown dialect without touching the core parser. It is
//! a fixed-shape descriptor: a unique name, an optional block rule, an optional inline
//! pattern (at least one is required), a parse step turning the matched text into
//! [`PluginData`], and render steps turning that data into document nodes or flat markup.
//!
//! Patterns are compiled when the plugin is constructed, so registering a plugin is the
//! only time its regexes are built.

use crate::diagnostics::Diagnostic;
use crate::error::ConversionError;
use crate::model::{Node, NodeKind};
use regex::Regex;
use std::collections::BTreeMap;
use thiserror::Error;

/// Structured data a plugin extracted from the text it matched.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct PluginData {
    /// The exact matched text, used when the plugin output has to fall back to literal text.
    pub raw: String,
    /// Named parameters (`type="info"`, `color=green`, ...).
    pub attrs: BTreeMap<String, String>,
    /// Nested content: markdown for block plugins, inner text for inline plugins.
    pub body: Option<String>,
}

impl PluginData {
    pub fn new(raw: impl Into<String>) -> Self {
        PluginData {
            raw: raw.into(),
            ..Default::default()
        }
    }

    pub fn with_attr(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.attrs.insert(key.into(), value.into());
        self
    }

    pub fn with_body(mut self, body: impl Into<String>) -> Self {
        self.body = Some(body.into());
        self
    }

    pub fn attr(&self, key: &str) -> Option<&str> {
        self.attrs.get(key).map(String::as_str)
    }
}

/// Raised by [`Plugin::parse`] when matched text turns out not to be valid plugin syntax.
///
/// This is recoverable: the matched text stays in the document as literal text and a
/// parse warning is recorded.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{message}")]
pub struct PluginParseError {
    pub message: String,
}

impl PluginParseError {
    pub fn new(message: impl Into<String>) -> Self {
        PluginParseError {
            message: message.into(),
        }
    }
}

/// Block matching rule: a regex over the opening line of a `:::` directive.
///
/// The region extends from the opening line to its balanced closing `:::` line; nested
/// directives inside the body open and close their own levels.
#[derive(Debug, Clone)]
pub struct BlockRule {
    opener: Regex,
}

impl BlockRule {
    /// Rule matching `:::<name>` optionally followed by attributes.
    pub fn directive(name: &str) -> Self {
        let pattern = format!(r"^:::\s*{}(?:\s+.*)?\s*$", regex::escape(name));
        BlockRule {
            opener: Regex::new(&pattern).expect("directive pattern is valid"),
        }
    }

    /// Rule built from a custom opener pattern.
    pub fn from_regex(opener: Regex) -> Self {
        BlockRule { opener }
    }

    /// Whether `line` opens a region for this rule.
    pub fn opens(&self, line: &str) -> bool {
        self.opener.is_match(line.trim_end())
    }
}

/// Callback handed to [`Plugin::render`] for rendering embedded markdown.
pub trait NestedRenderer {
    /// Render markdown into block nodes, applying the full pipeline (plugins included).
    fn render_blocks(&mut self, markdown: &str) -> Result<Vec<Node>, ConversionError>;

    /// Render a single line of markdown into inline nodes.
    fn render_inline(&mut self, markdown: &str) -> Result<Vec<Node>, ConversionError>;

    /// Keep the children `parent` permits and degrade the rest to plain text, recording
    /// a warning for each. Pads containers that need at least one child.
    fn admit(&mut self, parent: NodeKind, children: Vec<Node>) -> Vec<Node>;

    /// Record a warning against the current conversion.
    fn warn(&mut self, diagnostic: Diagnostic);
}

/// Callback handed to [`Plugin::render_flat`] for rendering embedded markdown.
pub trait FlatRenderer {
    fn render_blocks(&mut self, markdown: &str) -> Result<String, ConversionError>;

    fn render_inline(&mut self, markdown: &str) -> Result<String, ConversionError>;
}

/// Trait for syntax plugins
///
/// # Examples
///
/// ```ignore
/// struct Shout {
///     pattern: Regex,
/// }
///
/// impl Plugin for Shout {
///     fn name(&self) -> &str {
///         "shout"
///     }
///
///     fn inline_pattern(&self) -> Option<&Regex> {
///         Some(&self.pattern)
///     }
///
///     fn parse(&self, raw: &str) -> Result<PluginData, PluginParseError> {
///         Ok(PluginData::new(raw).with_body(raw.trim_matches('!')))
///     }
///
///     fn render(&self, data: &PluginData, _: &mut dyn NestedRenderer) -> Result<Node, ConversionError> {
///         Ok(Node::text(data.body.clone().unwrap_or_default().to_uppercase()))
///     }
/// }
/// ```
pub trait Plugin: Send + Sync {
    /// Unique plugin name (e.g., "panel", "status")
    fn name(&self) -> &str;

    /// Optional description of this plugin
    fn description(&self) -> &str {
        ""
    }

    /// Rule matching block regions, if this plugin contributes block syntax.
    fn block_rule(&self) -> Option<&BlockRule> {
        None
    }

    /// Pattern matching inline spans, if this plugin contributes inline syntax.
    ///
    /// If the pattern has a capture group named `span`, only that group is replaced;
    /// the rest of the match is context (a leading boundary character, for instance).
    fn inline_pattern(&self) -> Option<&Regex> {
        None
    }

    /// Turn matched text into structured data.
    fn parse(&self, raw: &str) -> Result<PluginData, PluginParseError>;

    /// Render parsed data into a document node.
    ///
    /// Block plugins should return a block node and inline plugins an inline node.
    /// The renderer checks placement and degrades nodes that do not fit.
    fn render(
        &self,
        data: &PluginData,
        nested: &mut dyn NestedRenderer,
    ) -> Result<Node, ConversionError>;

    /// Render parsed data into the legacy flat markup.
    ///
    /// Default implementation renders the body (as blocks or inline text) or, without a
    /// body, returns the raw matched text.
    fn render_flat(
        &self,
        data: &PluginData,
        nested: &mut dyn FlatRenderer,
    ) -> Result<String, ConversionError> {
        match (&data.body, self.block_rule().is_some()) {
            (Some(body), true) => nested.render_blocks(body),
            (Some(body), false) => nested.render_inline(body),
            (None, _) => Ok(data.raw.clone()),
        }
    }
}
