//! `{status:color=<c>}<text>{/status}` lozenges.

use super::directive::parse_attributes;
use crate::error::ConversionError;
use crate::model::schema::STATUS_COLORS;
use crate::model::{Node, NodeKind};
use crate::plugin::{FlatRenderer, NestedRenderer, Plugin, PluginData, PluginParseError};
use regex::Regex;

pub struct StatusPlugin {
    pattern: Regex,
}

impl StatusPlugin {
    pub fn new() -> Self {
        StatusPlugin {
            pattern: Regex::new(r"\{status(?::([^}]*))?\}(.*?)\{/status\}")
                .expect("status pattern is valid"),
        }
    }
}

impl Default for StatusPlugin {
    fn default() -> Self {
        Self::new()
    }
}

impl Plugin for StatusPlugin {
    fn name(&self) -> &str {
        "status"
    }

    fn description(&self) -> &str {
        "Colored status lozenge"
    }

    fn inline_pattern(&self) -> Option<&Regex> {
        Some(&self.pattern)
    }

    fn parse(&self, raw: &str) -> Result<PluginData, PluginParseError> {
        let caps = super::inline_captures(&self.pattern, raw, "status")?;
        let params = parse_attributes(caps.get(1).map_or("", |m| m.as_str()));
        let text = caps.get(2).map_or("", |m| m.as_str()).trim();
        if text.is_empty() {
            return Err(PluginParseError::new("status has no text"));
        }
        let color = params
            .get("color")
            .map_or("neutral", String::as_str)
            .to_ascii_lowercase();
        if !STATUS_COLORS.contains(&color.as_str()) {
            return Err(PluginParseError::new(format!(
                "unknown status color '{color}' (expected one of {})",
                STATUS_COLORS.join(", ")
            )));
        }
        Ok(PluginData::new(raw)
            .with_attr("color", color)
            .with_body(text))
    }

    fn render(
        &self,
        data: &PluginData,
        _nested: &mut dyn NestedRenderer,
    ) -> Result<Node, ConversionError> {
        Ok(Node::new(NodeKind::Status)
            .with_attr("text", data.body.as_deref().unwrap_or_default())
            .with_attr("color", data.attr("color").unwrap_or("neutral")))
    }

    fn render_flat(
        &self,
        data: &PluginData,
        _nested: &mut dyn FlatRenderer,
    ) -> Result<String, ConversionError> {
        let text = data.body.as_deref().unwrap_or_default().to_uppercase();
        Ok(format!("*[{text}]*"))
    }
}
