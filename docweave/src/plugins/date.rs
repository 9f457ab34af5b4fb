//! `{date:<ISO date>}` inline dates.
//!
//! The date node carries a millisecond UTC timestamp (as a string) for midnight of the
//! given day.

use crate::error::ConversionError;
use crate::model::{Node, NodeKind};
use crate::plugin::{FlatRenderer, NestedRenderer, Plugin, PluginData, PluginParseError};
use chrono::NaiveDate;
use regex::Regex;

pub struct DatePlugin {
    pattern: Regex,
}

impl DatePlugin {
    pub fn new() -> Self {
        DatePlugin {
            pattern: Regex::new(r"\{date:\s*([^}\s]+)\s*\}").expect("date pattern is valid"),
        }
    }
}

impl Default for DatePlugin {
    fn default() -> Self {
        Self::new()
    }
}

/// Milliseconds since the epoch at UTC midnight of `date`.
pub fn timestamp_millis(date: NaiveDate) -> i64 {
    date.and_hms_opt(0, 0, 0)
        .map(|dt| dt.and_utc().timestamp_millis())
        .unwrap_or_default()
}

impl Plugin for DatePlugin {
    fn name(&self) -> &str {
        "date"
    }

    fn description(&self) -> &str {
        "Inline calendar date"
    }

    fn inline_pattern(&self) -> Option<&Regex> {
        Some(&self.pattern)
    }

    fn parse(&self, raw: &str) -> Result<PluginData, PluginParseError> {
        let caps = super::inline_captures(&self.pattern, raw, "date")?;
        let iso = &caps[1];
        let date = NaiveDate::parse_from_str(iso, "%Y-%m-%d")
            .map_err(|e| PluginParseError::new(format!("invalid date '{iso}': {e}")))?;
        Ok(PluginData::new(raw)
            .with_attr("date", date.format("%Y-%m-%d").to_string())
            .with_attr("timestamp", timestamp_millis(date).to_string()))
    }

    fn render(
        &self,
        data: &PluginData,
        _nested: &mut dyn NestedRenderer,
    ) -> Result<Node, ConversionError> {
        Ok(Node::new(NodeKind::Date).with_attr("timestamp", data.attr("timestamp").unwrap_or("0")))
    }

    fn render_flat(
        &self,
        data: &PluginData,
        _nested: &mut dyn FlatRenderer,
    ) -> Result<String, ConversionError> {
        Ok(data.attr("date").unwrap_or_default().to_string())
    }
}
