//! `:::panel type="<kind>"` blocks.
//!
//! Kind is one of info, note, warning, success, error (default info). Panel content is
//! restricted to unmarked paragraphs and headings plus lists; anything else in the body
//! is degraded to plain text by the renderer.

use crate::error::ConversionError;
use crate::model::schema::{self, PANEL_TYPES};
use crate::model::{Attrs, Node, NodeKind};
use crate::plugin::{BlockRule, FlatRenderer, NestedRenderer, Plugin, PluginData, PluginParseError};

pub struct PanelPlugin {
    rule: BlockRule,
}

impl PanelPlugin {
    pub fn new() -> Self {
        PanelPlugin {
            rule: BlockRule::directive("panel"),
        }
    }
}

impl Default for PanelPlugin {
    fn default() -> Self {
        Self::new()
    }
}

impl Plugin for PanelPlugin {
    fn name(&self) -> &str {
        "panel"
    }

    fn description(&self) -> &str {
        "Colored callout panel"
    }

    fn block_rule(&self) -> Option<&BlockRule> {
        Some(&self.rule)
    }

    fn parse(&self, raw: &str) -> Result<PluginData, PluginParseError> {
        let mut data = super::parse_directive(raw, "panel")?;
        let kind = data.attr("type").unwrap_or("info").to_ascii_lowercase();
        if !PANEL_TYPES.contains(&kind.as_str()) {
            return Err(PluginParseError::new(format!(
                "unknown panel type '{kind}' (expected one of {})",
                PANEL_TYPES.join(", ")
            )));
        }
        data.attrs.insert("type".to_string(), kind);
        Ok(data)
    }

    fn render(
        &self,
        data: &PluginData,
        nested: &mut dyn NestedRenderer,
    ) -> Result<Node, ConversionError> {
        let children = nested.render_blocks(data.body.as_deref().unwrap_or_default())?;
        let content = nested.admit(NodeKind::Panel, children);
        let mut attrs = Attrs::new();
        attrs.insert("panelType".into(), data.attr("type").unwrap_or("info").into());
        Ok(schema::build(NodeKind::Panel, attrs, content)?)
    }

    fn render_flat(
        &self,
        data: &PluginData,
        nested: &mut dyn FlatRenderer,
    ) -> Result<String, ConversionError> {
        let body = nested.render_blocks(data.body.as_deref().unwrap_or_default())?;
        let (open, close) = match data.attr("type").unwrap_or("info") {
            "note" => ("{note}", "{note}"),
            "warning" => ("{warning}", "{warning}"),
            "success" => ("{tip}", "{tip}"),
            "error" => ("{panel:bgColor=#ffebe6}", "{panel}"),
            _ => ("{info}", "{info}"),
        };
        Ok(format!("{open}\n{body}\n{close}"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_type_attribute() {
        let data = PanelPlugin::new()
            .parse(":::panel type=\"Warning\"\nCareful\n:::")
            .unwrap();
        assert_eq!(data.attr("type"), Some("warning"));
        assert_eq!(data.body.as_deref(), Some("Careful"));
    }

    #[test]
    fn defaults_to_info() {
        let data = PanelPlugin::new().parse(":::panel\nx\n:::").unwrap();
        assert_eq!(data.attr("type"), Some("info"));
    }

    #[test]
    fn rejects_unknown_type() {
        let err = PanelPlugin::new()
            .parse(":::panel type=\"danger\"\nx\n:::")
            .unwrap_err();
        assert!(err.message.contains("danger"));
    }
}
