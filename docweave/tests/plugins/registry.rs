use docweave::plugin::{NestedRenderer, Plugin, PluginData, PluginParseError};
use docweave::{
    ConversionError, DiagnosticKind, Node, NodeKind, Pipeline, PipelineOptions, PluginRegistry,
    RegistryError, ValidationMode,
};
use regex::Regex;

/// `!!word!!` → upper-cased text.
struct Shout {
    name: &'static str,
    pattern: Regex,
}

impl Shout {
    fn named(name: &'static str) -> Self {
        Shout {
            name,
            pattern: Regex::new(r"!!(\w+)!!").unwrap(),
        }
    }
}

impl Plugin for Shout {
    fn name(&self) -> &str {
        self.name
    }

    fn inline_pattern(&self) -> Option<&Regex> {
        Some(&self.pattern)
    }

    fn parse(&self, raw: &str) -> Result<PluginData, PluginParseError> {
        Ok(PluginData::new(raw).with_body(raw.trim_matches('!')))
    }

    fn render(
        &self,
        data: &PluginData,
        _: &mut dyn NestedRenderer,
    ) -> Result<Node, ConversionError> {
        Ok(Node::text(data.body.clone().unwrap_or_default().to_uppercase()))
    }
}

/// Renders a status node without its required attributes.
struct Broken;

impl Plugin for Broken {
    fn name(&self) -> &str {
        "broken"
    }

    fn inline_pattern(&self) -> Option<&Regex> {
        static PATTERN: once_cell::sync::Lazy<Regex> =
            once_cell::sync::Lazy::new(|| Regex::new(r"%%broken%%").unwrap());
        Some(&PATTERN)
    }

    fn parse(&self, raw: &str) -> Result<PluginData, PluginParseError> {
        Ok(PluginData::new(raw))
    }

    fn render(&self, _: &PluginData, _: &mut dyn NestedRenderer) -> Result<Node, ConversionError> {
        Ok(Node::new(NodeKind::Status))
    }
}

/// Has no match rule at all.
struct Inert;

impl Plugin for Inert {
    fn name(&self) -> &str {
        "inert"
    }

    fn parse(&self, raw: &str) -> Result<PluginData, PluginParseError> {
        Ok(PluginData::new(raw))
    }

    fn render(&self, _: &PluginData, _: &mut dyn NestedRenderer) -> Result<Node, ConversionError> {
        Ok(Node::text(""))
    }
}

#[test]
fn defaults_in_registration_order() {
    let registry = PluginRegistry::with_defaults();
    assert_eq!(
        registry.list_plugins(),
        vec!["panel", "expand", "layout", "media", "status", "date", "mention", "emoji"]
    );
}

#[test]
fn custom_plugin_renders_through_pipeline() {
    let mut registry = PluginRegistry::with_defaults();
    registry.register(Shout::named("shout")).unwrap();
    let pipeline = Pipeline::new(registry, PipelineOptions::default());
    let conversion = pipeline.convert("say !!hello!! now").unwrap();
    assert_eq!(
        conversion.document.content[0].content[0].text.as_deref(),
        Some("say HELLO now")
    );
}

#[test]
fn last_registration_wins_and_keeps_position() {
    let mut registry = PluginRegistry::with_defaults();
    let replaced = registry.register(Shout::named("status")).unwrap();
    assert!(replaced.is_some());
    assert_eq!(registry.len(), 8);
    assert_eq!(registry.list_plugins()[4], "status");

    let pipeline = Pipeline::new(registry, PipelineOptions::default());
    let conversion = pipeline.convert("!!loud!!").unwrap();
    assert_eq!(
        conversion.document.content[0].content[0].text.as_deref(),
        Some("LOUD")
    );
}

#[test]
fn plugin_without_match_rule_is_rejected() {
    let mut registry = PluginRegistry::new();
    assert!(matches!(
        registry.register(Inert),
        Err(RegistryError::NoMatchRule(name)) if name == "inert"
    ));
    assert!(registry.is_empty());
}

#[test]
fn unregistered_plugin_leaves_text() {
    let mut registry = PluginRegistry::with_defaults();
    assert!(registry.unregister("status").is_some());
    assert!(!registry.has("status"));
    let pipeline = Pipeline::new(registry, PipelineOptions::default());
    let conversion = pipeline.convert("{status}Todo{/status}").unwrap();
    assert_eq!(
        conversion.document.content[0].content[0].text.as_deref(),
        Some("{status}Todo{/status}")
    );
}

#[test]
fn advisory_validation_reports_invalid_plugin_output() {
    let mut registry = PluginRegistry::new();
    registry.register(Broken).unwrap();
    let pipeline = Pipeline::new(registry, PipelineOptions::default());
    let conversion = pipeline.convert("x %%broken%%").unwrap();
    assert!(conversion
        .warnings
        .iter()
        .any(|w| w.kind == DiagnosticKind::Validation));
}

#[test]
fn strict_validation_rejects_invalid_plugin_output() {
    let mut registry = PluginRegistry::new();
    registry.register(Broken).unwrap();
    let pipeline = Pipeline::new(
        registry,
        PipelineOptions {
            validation: ValidationMode::Strict,
            ..PipelineOptions::default()
        },
    );
    assert!(matches!(
        pipeline.convert("x %%broken%%"),
        Err(ConversionError::Validation(_))
    ));
}
