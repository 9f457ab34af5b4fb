//! `:::layout columns=<n>` with `::: column` sections.
//!
//! The layout renders to a `layoutSection` whose children are exactly `n` columns of
//! equal width. Extra column sections are merged into the last column and missing ones
//! are padded with empty columns; both are reported. Markdown between column sections
//! is attached to the column that follows it (or the last column if it trails).

use super::directive::{self, Section};
use crate::diagnostics::Diagnostic;
use crate::error::ConversionError;
use crate::model::schema;
use crate::model::{Attrs, Node, NodeKind};
use crate::plugin::{BlockRule, FlatRenderer, NestedRenderer, Plugin, PluginData, PluginParseError};

/// Upper bound on `columns`.
pub const MAX_COLUMNS: usize = 6;

pub struct LayoutPlugin {
    rule: BlockRule,
}

impl LayoutPlugin {
    pub fn new() -> Self {
        LayoutPlugin {
            rule: BlockRule::directive("layout"),
        }
    }
}

impl Default for LayoutPlugin {
    fn default() -> Self {
        Self::new()
    }
}

/// Column bodies found in a layout body, before reconciling with the declared count.
fn column_bodies(body: &str) -> Vec<String> {
    let mut columns: Vec<String> = Vec::new();
    let mut pending: Vec<String> = Vec::new();

    for section in directive::sections(body) {
        match section {
            Section::Directive(d) if d.name == "column" => {
                pending.push(d.body);
                columns.push(pending.join("\n\n"));
                pending.clear();
            }
            Section::Directive(d) => {
                pending.push(format!(":::{} {}\n{}\n:::", d.name, d.params, d.body));
            }
            Section::Markdown(md) => pending.push(md),
        }
    }
    if !pending.is_empty() {
        match columns.last_mut() {
            Some(last) => {
                last.push_str("\n\n");
                last.push_str(&pending.join("\n\n"));
            }
            None => columns.push(pending.join("\n\n")),
        }
    }
    columns
}

/// Fit `bodies` to exactly `count` columns. Returns the bodies and a note if reshaped.
fn reconcile(mut bodies: Vec<String>, count: usize) -> (Vec<String>, Option<String>) {
    let found = bodies.len();
    if found > count {
        let extra = bodies.split_off(count);
        if let Some(last) = bodies.last_mut() {
            for body in extra {
                last.push_str("\n\n");
                last.push_str(&body);
            }
        }
        let note = format!(
            "layout declares {count} columns but has {found}; extra columns merged into the last"
        );
        (bodies, Some(note))
    } else if found < count {
        bodies.resize(count, String::new());
        let note =
            format!("layout declares {count} columns but has {found}; padded with empty columns");
        (bodies, Some(note))
    } else {
        (bodies, None)
    }
}

fn column_width(count: usize) -> f64 {
    ((10000.0 / count as f64).round()) / 100.0
}

impl Plugin for LayoutPlugin {
    fn name(&self) -> &str {
        "layout"
    }

    fn description(&self) -> &str {
        "Multi-column layout"
    }

    fn block_rule(&self) -> Option<&BlockRule> {
        Some(&self.rule)
    }

    fn parse(&self, raw: &str) -> Result<PluginData, PluginParseError> {
        let mut data = super::parse_directive(raw, "layout")?;
        let columns = match data.attr("columns") {
            Some(value) => value.parse::<usize>().map_err(|_| {
                PluginParseError::new(format!("layout columns '{value}' is not a number"))
            })?,
            None => column_bodies(data.body.as_deref().unwrap_or_default())
                .len()
                .max(1),
        };
        if columns == 0 || columns > MAX_COLUMNS {
            return Err(PluginParseError::new(format!(
                "layout columns must be between 1 and {MAX_COLUMNS}, got {columns}"
            )));
        }
        data.attrs.insert("columns".to_string(), columns.to_string());
        Ok(data)
    }

    fn render(
        &self,
        data: &PluginData,
        nested: &mut dyn NestedRenderer,
    ) -> Result<Node, ConversionError> {
        let count = data
            .attr("columns")
            .and_then(|c| c.parse::<usize>().ok())
            .unwrap_or(1);
        let bodies = column_bodies(data.body.as_deref().unwrap_or_default());
        let (bodies, note) = reconcile(bodies, count);
        if let Some(note) = note {
            nested.warn(Diagnostic::content_rule(note));
        }

        let width = column_width(count);
        let mut columns = Vec::with_capacity(count);
        for body in bodies {
            let children = nested.render_blocks(&body)?;
            let content = nested.admit(NodeKind::LayoutColumn, children);
            let mut attrs = Attrs::new();
            attrs.insert("width".into(), width.into());
            columns.push(schema::build(NodeKind::LayoutColumn, attrs, content)?);
        }
        Ok(schema::build(NodeKind::LayoutSection, Attrs::new(), columns)?)
    }

    fn render_flat(
        &self,
        data: &PluginData,
        nested: &mut dyn FlatRenderer,
    ) -> Result<String, ConversionError> {
        let mut parts = Vec::new();
        for body in column_bodies(data.body.as_deref().unwrap_or_default()) {
            let rendered = nested.render_blocks(&body)?;
            if !rendered.is_empty() {
                parts.push(rendered);
            }
        }
        Ok(parts.join("\n\n"))
    }
}
