//! `:::expand title="<text>"` collapsible sections.
//!
//! Renders an `expand`. Where the parent only allows `nestedExpand` (inside another
//! expand, a table cell, ...) the renderer swaps the kind when placing it.

use crate::error::ConversionError;
use crate::model::schema;
use crate::model::{Attrs, Node, NodeKind};
use crate::plugin::{BlockRule, FlatRenderer, NestedRenderer, Plugin, PluginData, PluginParseError};

pub struct ExpandPlugin {
    rule: BlockRule,
}

impl ExpandPlugin {
    pub fn new() -> Self {
        ExpandPlugin {
            rule: BlockRule::directive("expand"),
        }
    }
}

impl Default for ExpandPlugin {
    fn default() -> Self {
        Self::new()
    }
}

impl Plugin for ExpandPlugin {
    fn name(&self) -> &str {
        "expand"
    }

    fn description(&self) -> &str {
        "Collapsible section with a title"
    }

    fn block_rule(&self) -> Option<&BlockRule> {
        Some(&self.rule)
    }

    fn parse(&self, raw: &str) -> Result<PluginData, PluginParseError> {
        super::parse_directive(raw, "expand")
    }

    fn render(
        &self,
        data: &PluginData,
        nested: &mut dyn NestedRenderer,
    ) -> Result<Node, ConversionError> {
        let children = nested.render_blocks(data.body.as_deref().unwrap_or_default())?;
        let content = nested.admit(NodeKind::Expand, children);
        let mut attrs = Attrs::new();
        attrs.insert("title".into(), data.attr("title").unwrap_or_default().into());
        Ok(schema::build(NodeKind::Expand, attrs, content)?)
    }

    fn render_flat(
        &self,
        data: &PluginData,
        nested: &mut dyn FlatRenderer,
    ) -> Result<String, ConversionError> {
        let body = nested.render_blocks(data.body.as_deref().unwrap_or_default())?;
        match data.attr("title") {
            Some(title) if !title.is_empty() => {
                Ok(format!("{{expand:{title}}}\n{body}\n{{expand}}"))
            }
            _ => Ok(format!("{{expand}}\n{body}\n{{expand}}")),
        }
    }
}
