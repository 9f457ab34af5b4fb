//! `:shortname:` emoji.
//!
//! Shortnames are looked up in a fixed table. Unknown shortnames are not an error: they
//! render as the literal text that was typed.

use crate::error::ConversionError;
use crate::model::{Node, NodeKind};
use crate::plugin::{FlatRenderer, NestedRenderer, Plugin, PluginData, PluginParseError};
use regex::Regex;

/// Shortname, unicode sequence.
const EMOJI: &[(&str, &str)] = &[
    ("+1", "\u{1F44D}"),
    ("-1", "\u{1F44E}"),
    ("100", "\u{1F4AF}"),
    ("angry", "\u{1F620}"),
    ("bug", "\u{1F41B}"),
    ("bulb", "\u{1F4A1}"),
    ("calendar", "\u{1F4C5}"),
    ("chart_with_upwards_trend", "\u{1F4C8}"),
    ("check", "\u{2714}\u{FE0F}"),
    ("clap", "\u{1F44F}"),
    ("coffee", "\u{2615}"),
    ("construction", "\u{1F6A7}"),
    ("cry", "\u{1F622}"),
    ("exclamation", "\u{2757}"),
    ("eyes", "\u{1F440}"),
    ("fire", "\u{1F525}"),
    ("gear", "\u{2699}\u{FE0F}"),
    ("grinning", "\u{1F600}"),
    ("heart", "\u{2764}\u{FE0F}"),
    ("hourglass", "\u{231B}"),
    ("info", "\u{2139}\u{FE0F}"),
    ("joy", "\u{1F602}"),
    ("laughing", "\u{1F606}"),
    ("link", "\u{1F517}"),
    ("lock", "\u{1F512}"),
    ("mag", "\u{1F50D}"),
    ("memo", "\u{1F4DD}"),
    ("muscle", "\u{1F4AA}"),
    ("ok_hand", "\u{1F44C}"),
    ("package", "\u{1F4E6}"),
    ("pray", "\u{1F64F}"),
    ("question", "\u{2753}"),
    ("red_circle", "\u{1F534}"),
    ("rocket", "\u{1F680}"),
    ("slight_smile", "\u{1F642}"),
    ("smile", "\u{1F604}"),
    ("smiley", "\u{1F603}"),
    ("sob", "\u{1F62D}"),
    ("sparkles", "\u{2728}"),
    ("star", "\u{2B50}"),
    ("sunglasses", "\u{1F60E}"),
    ("tada", "\u{1F389}"),
    ("thinking", "\u{1F914}"),
    ("thumbsdown", "\u{1F44E}"),
    ("thumbsup", "\u{1F44D}"),
    ("warning", "\u{26A0}\u{FE0F}"),
    ("wave", "\u{1F44B}"),
    ("white_check_mark", "\u{2705}"),
    ("wink", "\u{1F609}"),
    ("wrench", "\u{1F527}"),
    ("x", "\u{274C}"),
    ("zap", "\u{26A1}"),
];

/// Unicode text for a shortname (without colons), if known.
pub fn lookup(shortname: &str) -> Option<&'static str> {
    EMOJI
        .iter()
        .find(|(name, _)| *name == shortname)
        .map(|(_, text)| *text)
}

/// Hex code points of an emoji, joined with `-` (e.g. `1f44d`).
fn emoji_id(text: &str) -> String {
    text.chars()
        .filter(|c| *c != '\u{FE0F}')
        .map(|c| format!("{:x}", c as u32))
        .collect::<Vec<_>>()
        .join("-")
}

pub struct EmojiPlugin {
    pattern: Regex,
}

impl EmojiPlugin {
    pub fn new() -> Self {
        EmojiPlugin {
            pattern: Regex::new(r":([a-z0-9_+-]+):").expect("emoji pattern is valid"),
        }
    }
}

impl Default for EmojiPlugin {
    fn default() -> Self {
        Self::new()
    }
}

impl Plugin for EmojiPlugin {
    fn name(&self) -> &str {
        "emoji"
    }

    fn description(&self) -> &str {
        "Emoji shortnames"
    }

    fn inline_pattern(&self) -> Option<&Regex> {
        Some(&self.pattern)
    }

    fn parse(&self, raw: &str) -> Result<PluginData, PluginParseError> {
        let caps = super::inline_captures(&self.pattern, raw, "emoji")?;
        let data = PluginData::new(raw).with_attr("shortName", &caps[1]);
        Ok(match lookup(&caps[1]) {
            Some(text) => data.with_attr("text", text),
            None => data,
        })
    }

    fn render(
        &self,
        data: &PluginData,
        _nested: &mut dyn NestedRenderer,
    ) -> Result<Node, ConversionError> {
        let (Some(name), Some(text)) = (data.attr("shortName"), data.attr("text")) else {
            return Ok(Node::text(data.raw.as_str()));
        };
        Ok(Node::new(NodeKind::Emoji)
            .with_attr("shortName", format!(":{name}:"))
            .with_attr("id", emoji_id(text))
            .with_attr("text", text))
    }

    fn render_flat(
        &self,
        data: &PluginData,
        _nested: &mut dyn FlatRenderer,
    ) -> Result<String, ConversionError> {
        Ok(data.attr("text").unwrap_or(&data.raw).to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn known_shortname_resolves() {
        let data = EmojiPlugin::new().parse(":rocket:").unwrap();
        assert_eq!(data.attr("text"), Some("\u{1F680}"));
        assert_eq!(emoji_id("\u{1F680}"), "1f680");
        assert_eq!(emoji_id("\u{2764}\u{FE0F}"), "2764");
    }

    #[test]
    fn unknown_shortname_is_not_an_error() {
        let data = EmojiPlugin::new().parse(":not_an_emoji:").unwrap();
        assert_eq!(data.attr("text"), None);
        assert_eq!(data.raw, ":not_an_emoji:");
    }
}
