//! Built-in syntax plugins
//!
//! Block plugins use the `:::name ... :::` directive form (see [`directive`]); inline
//! plugins match spans inside unmarked text runs.
//!
//! | Plugin  | Syntax                                      | Renders to                   |
//! |---------|---------------------------------------------|------------------------------|
//! | panel   | `:::panel type="info"` ... `:::`            | `panel`                      |
//! | expand  | `:::expand title="More"` ... `:::`          | `expand` / `nestedExpand`    |
//! | layout  | `:::layout columns=2` + `::: column` blocks | `layoutSection`              |
//! | media   | `:::media id="..." collection="..."`        | `mediaSingle` / `mediaGroup` |
//! | status  | `{status:color=green}Done{/status}`         | `status`                     |
//! | date    | `{date:2024-03-15}`                         | `date`                       |
//! | mention | `@name`, `@[Full Name]`, `@first.last`      | `mention`                    |
//! | emoji   | `:smile:`                                   | `emoji` (unknown: literal)   |
//!
//! Registration order matters for overlapping syntax; [`builtin_plugins`] returns them in
//! the order above.

pub mod date;
pub mod directive;
pub mod emoji;
pub mod expand;
pub mod layout;
pub mod media;
pub mod mention;
pub mod panel;
pub mod status;

pub use date::DatePlugin;
pub use emoji::EmojiPlugin;
pub use expand::ExpandPlugin;
pub use layout::LayoutPlugin;
pub use media::MediaPlugin;
pub use mention::MentionPlugin;
pub use panel::PanelPlugin;
pub use status::StatusPlugin;

use crate::plugin::{Plugin, PluginData, PluginParseError};

/// The built-in plugins, in registration order.
pub fn builtin_plugins() -> Vec<Box<dyn Plugin>> {
    vec![
        Box::new(PanelPlugin::new()),
        Box::new(ExpandPlugin::new()),
        Box::new(LayoutPlugin::new()),
        Box::new(MediaPlugin::new()),
        Box::new(StatusPlugin::new()),
        Box::new(DatePlugin::new()),
        Box::new(MentionPlugin::new()),
        Box::new(EmojiPlugin::new()),
    ]
}

/// Split a directive region into [`PluginData`], checking it names `expected`.
pub(crate) fn parse_directive(raw: &str, expected: &str) -> Result<PluginData, PluginParseError> {
    let directive = directive::split(raw)
        .ok_or_else(|| PluginParseError::new(format!("unterminated '{expected}' directive")))?;
    if directive.name != expected {
        return Err(PluginParseError::new(format!(
            "expected a '{expected}' directive, found '{}'",
            directive.name
        )));
    }
    let mut data = PluginData::new(raw).with_body(directive.body.clone());
    data.attrs = directive.attributes();
    Ok(data)
}

/// Captures of an inline pattern over the matched span, as a parse error if absent.
pub(crate) fn inline_captures<'t>(
    pattern: &regex::Regex,
    raw: &'t str,
    plugin: &str,
) -> Result<regex::Captures<'t>, PluginParseError> {
    pattern
        .captures(raw)
        .ok_or_else(|| PluginParseError::new(format!("'{raw}' is not valid {plugin} syntax")))
}
