//! `:::media` blocks referencing stored files or external URLs.
//!
//! ```text
//! :::media id="f3a1" collection="uploads" layout="wide"
//! :::
//!
//! :::media
//! id="a1" collection="uploads"
//! id="b2" collection="uploads"
//! :::
//! ```
//!
//! The opener may describe one item; every non-empty body line describes another. One
//! item renders a `mediaSingle`, several a `mediaGroup`. An item with `url=` is external.

use super::directive::parse_attributes;
use crate::error::ConversionError;
use crate::model::schema;
use crate::model::{Attrs, Node, NodeKind};
use crate::plugin::{
    BlockRule, FlatRenderer, NestedRenderer, Plugin, PluginData, PluginParseError,
};
use std::collections::BTreeMap;

/// Item attributes copied onto the `media` node when present.
const PASSTHROUGH: &[&str] = &["alt", "width", "height"];

pub struct MediaPlugin {
    rule: BlockRule,
}

impl MediaPlugin {
    pub fn new() -> Self {
        MediaPlugin {
            rule: BlockRule::directive("media"),
        }
    }
}

impl Default for MediaPlugin {
    fn default() -> Self {
        Self::new()
    }
}

fn is_item(attrs: &BTreeMap<String, String>) -> bool {
    attrs.contains_key("id") || attrs.contains_key("url")
}

/// All media items of a parsed directive, opener first.
fn items(data: &PluginData) -> Vec<BTreeMap<String, String>> {
    let mut items = Vec::new();
    if is_item(&data.attrs) {
        items.push(data.attrs.clone());
    }
    for line in data.body.as_deref().unwrap_or_default().lines() {
        if !line.trim().is_empty() {
            items.push(parse_attributes(line));
        }
    }
    items
}

fn media_node(item: &BTreeMap<String, String>) -> Node {
    let mut node = Node::new(NodeKind::Media);
    match item.get("url") {
        Some(url) => {
            node = node.with_attr("type", "external").with_attr("url", url.as_str());
        }
        None => {
            let kind = item.get("type").map_or("file", String::as_str);
            node = node
                .with_attr("type", kind)
                .with_attr("id", item.get("id").map_or("", String::as_str))
                .with_attr("collection", item.get("collection").map_or("", String::as_str));
        }
    }
    for key in PASSTHROUGH {
        if let Some(value) = item.get(*key) {
            node = match value.parse::<u64>() {
                Ok(number) if *key != "alt" => node.with_attr(key, number),
                _ => node.with_attr(key, value.as_str()),
            };
        }
    }
    node
}

impl Plugin for MediaPlugin {
    fn name(&self) -> &str {
        "media"
    }

    fn description(&self) -> &str {
        "Attached files and external images"
    }

    fn block_rule(&self) -> Option<&BlockRule> {
        Some(&self.rule)
    }

    fn parse(&self, raw: &str) -> Result<PluginData, PluginParseError> {
        let data = super::parse_directive(raw, "media")?;
        let items = items(&data);
        if items.is_empty() {
            return Err(PluginParseError::new("media directive names no items"));
        }
        if let Some(bad) = items.iter().find(|item| !is_item(item)) {
            return Err(PluginParseError::new(format!(
                "media item {bad:?} needs an 'id' or a 'url'"
            )));
        }
        let unsupported = items
            .iter()
            .filter(|item| !item.contains_key("url"))
            .filter_map(|item| item.get("type"))
            .find(|kind| !schema::MEDIA_TYPES.contains(&kind.as_str()));
        if let Some(kind) = unsupported {
            return Err(PluginParseError::new(format!(
                "unsupported media type '{kind}' (expected one of {})",
                schema::MEDIA_TYPES.join(", ")
            )));
        }
        Ok(data)
    }

    fn render(
        &self,
        data: &PluginData,
        _nested: &mut dyn NestedRenderer,
    ) -> Result<Node, ConversionError> {
        let media: Vec<Node> = items(data).iter().map(media_node).collect();
        if media.len() == 1 {
            let mut attrs = Attrs::new();
            attrs.insert(
                "layout".into(),
                data.attr("layout").unwrap_or("center").into(),
            );
            Ok(schema::build(NodeKind::MediaSingle, attrs, media)?)
        } else {
            Ok(schema::build(NodeKind::MediaGroup, Attrs::new(), media)?)
        }
    }

    fn render_flat(
        &self,
        data: &PluginData,
        _nested: &mut dyn FlatRenderer,
    ) -> Result<String, ConversionError> {
        let lines: Vec<String> = items(data)
            .iter()
            .map(|item| {
                let target = item
                    .get("url")
                    .or_else(|| item.get("id"))
                    .map_or("", String::as_str);
                format!("!{target}!")
            })
            .collect();
        Ok(lines.join("\n"))
    }
}
