use docweave::{
    Content, DeploymentType, DiagnosticKind, FormatRouter, Limits, NodeKind, OutputFormat,
    Pipeline, PipelineOptions, PluginRegistry, RouterConfig, ValidationMode,
};
use serde_json::json;

const HOSTED: &str = "https://acme.example-hosted.net";
const SELF_MANAGED: &str = "https://jira.acme-internal.com";

fn router(config: RouterConfig) -> FormatRouter {
    FormatRouter::new(Pipeline::default(), config)
}

#[test]
fn forcing_flat_skips_detection() {
    let router = FormatRouter::default();
    let result = router.convert("**bold**", HOSTED, Some("u1"), Some(OutputFormat::Flat));
    assert_eq!(result.format, OutputFormat::Flat);
    assert_eq!(result.deployment_type, DeploymentType::Unknown);
    assert!(!result.rollout_applied);
    assert_eq!(result.content.as_flat(), Some("*bold*"));
    assert_eq!(router.detector().cached(HOSTED), None);
}

#[test]
fn forcing_structured_on_self_managed() {
    let result = FormatRouter::default().convert(
        "hello",
        SELF_MANAGED,
        None,
        Some(OutputFormat::Structured),
    );
    assert_eq!(result.format, OutputFormat::Structured);
    let document = result.content.as_document().unwrap();
    assert_eq!(document.content[0].kind, NodeKind::Paragraph);
}

#[test]
fn envelope_serialization() {
    let result = FormatRouter::default().convert("hi", SELF_MANAGED, Some("u"), None);
    let value = serde_json::to_value(&result).unwrap();
    assert_eq!(
        value,
        json!({
            "content": "hi",
            "format": "flat",
            "deploymentType": "self-managed",
            "rolloutApplied": false,
            "warnings": []
        })
    );

    let structured = FormatRouter::default().convert("hi", HOSTED, Some("u"), None);
    let value = serde_json::to_value(&structured).unwrap();
    assert_eq!(value["format"], "structured");
    assert_eq!(value["deploymentType"], "hosted");
    assert_eq!(value["rolloutApplied"], true);
    assert_eq!(value["content"]["type"], "doc");
    assert!(value.get("error").is_none());
}

#[test]
fn zero_percent_rollout_is_flat_for_hosted() {
    let config = RouterConfig {
        rollout_percentage: 0,
        ..RouterConfig::default()
    };
    let result = router(config).convert("x", HOSTED, Some("u1"), None);
    assert_eq!(result.format, OutputFormat::Flat);
    assert!(result.rollout_applied);
}

#[test]
fn unknown_target_is_flat() {
    let result = FormatRouter::default().convert("x", "", Some("u1"), None);
    assert_eq!(result.deployment_type, DeploymentType::Unknown);
    assert_eq!(result.format, OutputFormat::Flat);
}

#[test]
fn force_enable_applies_everywhere() {
    let config = RouterConfig {
        force_enable: true,
        ..RouterConfig::default()
    };
    let result = router(config).convert("x", SELF_MANAGED, None, None);
    assert_eq!(result.format, OutputFormat::Structured);
    assert_eq!(result.deployment_type, DeploymentType::SelfManaged);
}

#[test]
fn pipeline_failure_returns_flat_with_error() {
    let options = PipelineOptions {
        limits: Limits {
            max_nesting_depth: 4,
            ..Limits::default()
        },
        ..PipelineOptions::default()
    };
    let router = FormatRouter::new(
        Pipeline::new(PluginRegistry::with_defaults(), options),
        RouterConfig::default(),
    );
    let input = format!("{}deep", "> ".repeat(10));
    let result = router.convert(&input, HOSTED, Some("u1"), None);
    assert_eq!(result.format, OutputFormat::Flat);
    assert_eq!(result.deployment_type, DeploymentType::Hosted);
    assert!(result.error.as_deref().unwrap().contains("nesting depth"));
    assert!(matches!(result.content, Content::Flat(_)));
}

#[test]
fn metrics_count_formats_hits_and_errors() {
    let router = FormatRouter::default();
    router.convert("a", HOSTED, Some("u"), None);
    router.convert("a", HOSTED, Some("u"), None);
    router.convert("a", SELF_MANAGED, Some("u"), None);
    router.convert("a", SELF_MANAGED, Some("u"), None);

    let metrics = router.metrics();
    assert_eq!(metrics.total_conversions, 4);
    assert_eq!(metrics.structured_conversions, 2);
    assert_eq!(metrics.flat_conversions, 2);
    assert_eq!(metrics.errors, 0);
    assert!((metrics.cache_hit_rate - 0.5).abs() < 1e-9);
    assert_eq!(metrics.error_rate, 0.0);
}

#[test]
fn clearing_caches() {
    let router = FormatRouter::default();
    router.convert("a", HOSTED, Some("u"), None);
    assert_eq!(router.detector().cached(HOSTED), Some(DeploymentType::Hosted));
    assert_eq!(router.pipeline().cache_stats().entries, 1);

    router.clear_caches();
    assert_eq!(router.detector().cached(HOSTED), None);
    assert_eq!(router.pipeline().cache_stats().entries, 0);
}

#[test]
fn flat_results_carry_parse_warnings() {
    let router = FormatRouter::default();
    let input = ":::panel\nunterminated";
    for _ in 0..2 {
        let result = router.convert(input, SELF_MANAGED, Some("u"), None);
        assert_eq!(result.format, OutputFormat::Flat);
        assert_eq!(result.warnings.len(), 1);
        assert_eq!(result.warnings[0].kind, DiagnosticKind::Parse);
        assert!(result.warnings[0].message.contains("never closed"));
    }
    assert!((router.metrics().cache_hit_rate - 0.5).abs() < 1e-9);
}

#[test]
fn empty_link_stays_structured_under_strict_validation() {
    let options = PipelineOptions {
        validation: ValidationMode::Strict,
        ..PipelineOptions::default()
    };
    let router = FormatRouter::new(
        Pipeline::new(PluginRegistry::with_defaults(), options),
        RouterConfig::default(),
    );
    let result = router.convert("[text]() and ![alt]()", HOSTED, Some("u1"), None);
    assert_eq!(result.format, OutputFormat::Structured);
    assert!(result.error.is_none());
    assert!(result.warnings.iter().all(|w| w.kind == DiagnosticKind::Parse));
}
