//! `@name`, `@[Full Name]` and `@user.with.dots` mentions.
//!
//! A mention must start the text run or follow whitespace or an opening parenthesis, so
//! e-mail addresses and `a@b` fragments stay literal.

use crate::error::ConversionError;
use crate::model::{Node, NodeKind};
use crate::plugin::{FlatRenderer, NestedRenderer, Plugin, PluginData, PluginParseError};
use regex::Regex;

const HANDLE: &str = r"@(?:\[([^\]\n]+)\]|([A-Za-z0-9_][A-Za-z0-9_-]*(?:\.[A-Za-z0-9_-]+)*))";

pub struct MentionPlugin {
    pattern: Regex,
    handle: Regex,
}

impl MentionPlugin {
    pub fn new() -> Self {
        MentionPlugin {
            pattern: Regex::new(&format!(r"(?:^|[\s(])(?P<span>{HANDLE})"))
                .expect("mention pattern is valid"),
            handle: Regex::new(&format!("^{HANDLE}$")).expect("handle pattern is valid"),
        }
    }
}

impl Default for MentionPlugin {
    fn default() -> Self {
        Self::new()
    }
}

impl Plugin for MentionPlugin {
    fn name(&self) -> &str {
        "mention"
    }

    fn description(&self) -> &str {
        "User mention"
    }

    fn inline_pattern(&self) -> Option<&Regex> {
        Some(&self.pattern)
    }

    fn parse(&self, raw: &str) -> Result<PluginData, PluginParseError> {
        let caps = super::inline_captures(&self.handle, raw, "mention")?;
        let name = caps
            .get(1)
            .or_else(|| caps.get(2))
            .map(|m| m.as_str().trim())
            .unwrap_or_default();
        if name.is_empty() {
            return Err(PluginParseError::new("mention has no name"));
        }
        Ok(PluginData::new(raw).with_attr("id", name).with_body(name))
    }

    fn render(
        &self,
        data: &PluginData,
        _nested: &mut dyn NestedRenderer,
    ) -> Result<Node, ConversionError> {
        let name = data.attr("id").unwrap_or_default();
        Ok(Node::new(NodeKind::Mention)
            .with_attr("id", name)
            .with_attr("text", format!("@{name}")))
    }

    fn render_flat(
        &self,
        data: &PluginData,
        _nested: &mut dyn FlatRenderer,
    ) -> Result<String, ConversionError> {
        Ok(format!("[~{}]", data.attr("id").unwrap_or_default()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn spans(text: &str) -> Vec<String> {
        let plugin = MentionPlugin::new();
        plugin
            .pattern
            .captures_iter(text)
            .map(|c| c["span"].to_string())
            .collect()
    }

    #[test]
    fn matches_all_handle_forms() {
        assert_eq!(
            spans("@alice and @[Bob Smith] or (@carol.jones)."),
            vec!["@alice", "@[Bob Smith]", "@carol.jones"]
        );
    }

    #[test]
    fn ignores_email_addresses() {
        assert!(spans("mail me at alice@example.com").is_empty());
    }

    #[test]
    fn parse_extracts_name() {
        let plugin = MentionPlugin::new();
        assert_eq!(plugin.parse("@[Bob Smith]").unwrap().attr("id"), Some("Bob Smith"));
        assert_eq!(plugin.parse("@carol.jones").unwrap().attr("id"), Some("carol.jones"));
        assert!(plugin.parse("@").is_err());
    }
}
