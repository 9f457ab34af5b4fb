//! Format routing
//!
//! [`FormatRouter::convert`] decides per call whether a target gets the structured
//! document or flat markup, runs the matching converter and always returns a
//! [`RoutedContent`]. A structured conversion that fails (or panics) falls back to flat
//! markup with `error` set.
//!
//! Decision order, first match wins:
//!
//! 1. an explicit `force` format (detection skipped, deployment reported as unknown)
//! 2. global `force_disable` → flat, global `force_enable` → structured
//! 3. user on the exclude list → flat, on the include list → structured
//! 4. hosted deployment → percentage rollout on the user id
//! 5. self-managed or unknown deployment → flat

pub mod deployment;
pub mod metrics;
pub mod rollout;

use crate::cache::ConversionCache;
use crate::diagnostics::Diagnostic;
use crate::error::ConversionError;
use crate::formats::OutputFormat;
use crate::model::Document;
use crate::pipeline::{FlatConversion, Pipeline};
use deployment::{DeploymentDetector, DeploymentType, DEFAULT_HOSTED_SUFFIXES};
use metrics::{MetricsSnapshot, RouterMetrics};
use serde::{Deserialize, Serialize};
use std::any::Any;
use std::panic::{self, AssertUnwindSafe};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::{debug, warn};

/// Routing settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RouterConfig {
    /// Share of hosted users (0-100) that get structured output.
    pub rollout_percentage: u8,
    pub include_users: Vec<String>,
    pub exclude_users: Vec<String>,
    /// Structured output for everyone.
    pub force_enable: bool,
    /// Flat output for everyone; wins over `force_enable`.
    pub force_disable: bool,
    pub hosted_suffixes: Vec<String>,
    pub detection_ttl_secs: u64,
    pub detection_cache_capacity: usize,
    pub flat_cache_capacity: usize,
}

impl Default for RouterConfig {
    fn default() -> Self {
        RouterConfig {
            rollout_percentage: 100,
            include_users: Vec::new(),
            exclude_users: Vec::new(),
            force_enable: false,
            force_disable: false,
            hosted_suffixes: DEFAULT_HOSTED_SUFFIXES.iter().map(|s| s.to_string()).collect(),
            detection_ttl_secs: 3600,
            detection_cache_capacity: 256,
            flat_cache_capacity: 256,
        }
    }
}

/// Converted content in the format that was actually used.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum Content {
    Structured(Document),
    Flat(String),
}

impl Content {
    pub fn as_document(&self) -> Option<&Document> {
        match self {
            Content::Structured(document) => Some(document),
            Content::Flat(_) => None,
        }
    }

    pub fn as_flat(&self) -> Option<&str> {
        match self {
            Content::Flat(text) => Some(text),
            Content::Structured(_) => None,
        }
    }
}

/// Result envelope of a routed conversion.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RoutedContent {
    pub content: Content,
    pub format: OutputFormat,
    pub deployment_type: DeploymentType,
    /// Whether the percentage rollout made the decision.
    pub rollout_applied: bool,
    pub warnings: Vec<Diagnostic>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct Decision {
    format: OutputFormat,
    rollout_applied: bool,
}

impl Decision {
    fn fixed(format: OutputFormat) -> Self {
        Decision {
            format,
            rollout_applied: false,
        }
    }
}

struct Converted {
    content: Content,
    format: OutputFormat,
    warnings: Vec<Diagnostic>,
    error: Option<String>,
    cache_hit: bool,
}

/// Routes conversions between the structured pipeline and flat markup.
pub struct FormatRouter {
    pipeline: Pipeline,
    config: RouterConfig,
    detector: DeploymentDetector,
    flat_cache: ConversionCache<FlatConversion>,
    metrics: RouterMetrics,
}

impl FormatRouter {
    pub fn new(pipeline: Pipeline, config: RouterConfig) -> Self {
        FormatRouter {
            detector: DeploymentDetector::new(
                config.hosted_suffixes.clone(),
                Duration::from_secs(config.detection_ttl_secs),
                config.detection_cache_capacity,
            ),
            flat_cache: ConversionCache::new(config.flat_cache_capacity),
            metrics: RouterMetrics::default(),
            pipeline,
            config,
        }
    }

    /// Convert `text` for the system at `target`.
    ///
    /// Never fails: conversion errors are reported in [`RoutedContent::error`].
    pub fn convert(
        &self,
        text: &str,
        target: &str,
        user_id: Option<&str>,
        force: Option<OutputFormat>,
    ) -> RoutedContent {
        let started = Instant::now();
        let (deployment_type, decision) = match force {
            Some(format) => (DeploymentType::Unknown, Decision::fixed(format)),
            None => {
                let deployment = self.detector.detect(target);
                (deployment, self.decide(deployment, user_id))
            }
        };
        debug!(
            target,
            deployment = %deployment_type,
            format = %decision.format,
            rollout = decision.rollout_applied,
            "routing conversion"
        );

        let converted = match decision.format {
            OutputFormat::Structured => self.structured(text),
            OutputFormat::Flat => self.flat(text, None),
        };
        self.metrics.record(
            converted.format,
            converted.cache_hit,
            converted.error.is_some(),
            started.elapsed(),
        );

        RoutedContent {
            content: converted.content,
            format: converted.format,
            deployment_type,
            rollout_applied: decision.rollout_applied,
            warnings: converted.warnings,
            error: converted.error,
        }
    }

    fn decide(&self, deployment: DeploymentType, user_id: Option<&str>) -> Decision {
        if self.config.force_disable {
            return Decision::fixed(OutputFormat::Flat);
        }
        if self.config.force_enable {
            return Decision::fixed(OutputFormat::Structured);
        }
        if let Some(user) = user_id {
            if self.config.exclude_users.iter().any(|u| u == user) {
                return Decision::fixed(OutputFormat::Flat);
            }
            if self.config.include_users.iter().any(|u| u == user) {
                return Decision::fixed(OutputFormat::Structured);
            }
        }
        match deployment {
            DeploymentType::Hosted => {
                let format = if rollout::in_rollout(user_id, self.config.rollout_percentage) {
                    OutputFormat::Structured
                } else {
                    OutputFormat::Flat
                };
                Decision {
                    format,
                    rollout_applied: true,
                }
            }
            DeploymentType::SelfManaged | DeploymentType::Unknown => {
                Decision::fixed(OutputFormat::Flat)
            }
        }
    }

    fn structured(&self, text: &str) -> Converted {
        let result = panic::catch_unwind(AssertUnwindSafe(|| {
            self.pipeline.convert_with_status(text)
        }))
        .unwrap_or_else(|payload| Err(ConversionError::Internal(panic_message(payload))));

        match result {
            Ok((conversion, cache_hit)) => Converted {
                content: Content::Structured(conversion.document.clone()),
                format: OutputFormat::Structured,
                warnings: conversion.warnings.clone(),
                error: None,
                cache_hit,
            },
            Err(err) => {
                warn!(error = %err, "structured conversion failed; falling back to flat markup");
                self.flat(text, Some(err.to_string()))
            }
        }
    }

    fn flat(&self, text: &str, error: Option<String>) -> Converted {
        if let Some(hit) = self.flat_cache.get(text) {
            return Converted {
                content: Content::Flat(hit.markup.clone()),
                format: OutputFormat::Flat,
                warnings: hit.warnings.clone(),
                error,
                cache_hit: true,
            };
        }

        let result = panic::catch_unwind(AssertUnwindSafe(|| self.pipeline.to_flat(text)))
            .unwrap_or_else(|payload| Err(ConversionError::Internal(panic_message(payload))));
        match result {
            Ok(flat) => {
                let flat = Arc::new(flat);
                self.flat_cache.insert(text, Arc::clone(&flat));
                Converted {
                    content: Content::Flat(flat.markup.clone()),
                    format: OutputFormat::Flat,
                    warnings: flat.warnings.clone(),
                    error,
                    cache_hit: false,
                }
            }
            Err(err) => {
                warn!(error = %err, "flat conversion failed; returning the input unchanged");
                let message = match error {
                    Some(first) => format!("{first}; {err}"),
                    None => err.to_string(),
                };
                Converted {
                    content: Content::Flat(text.to_string()),
                    format: OutputFormat::Flat,
                    warnings: Vec::new(),
                    error: Some(message),
                    cache_hit: false,
                }
            }
        }
    }

    pub fn pipeline(&self) -> &Pipeline {
        &self.pipeline
    }

    pub fn config(&self) -> &RouterConfig {
        &self.config
    }

    pub fn detector(&self) -> &DeploymentDetector {
        &self.detector
    }

    pub fn metrics(&self) -> MetricsSnapshot {
        self.metrics.snapshot()
    }

    /// Drop cached conversions and deployment classifications.
    pub fn clear_caches(&self) {
        self.pipeline.clear_cache();
        self.flat_cache.clear();
        self.detector.clear();
    }
}

impl Default for FormatRouter {
    fn default() -> Self {
        Self::new(Pipeline::default(), RouterConfig::default())
    }
}

impl std::fmt::Debug for FormatRouter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FormatRouter")
            .field("config", &self.config)
            .field("pipeline", &self.pipeline)
            .finish()
    }
}

fn panic_message(payload: Box<dyn Any + Send>) -> String {
    if let Some(message) = payload.downcast_ref::<&str>() {
        (*message).to_string()
    } else if let Some(message) = payload.downcast_ref::<String>() {
        message.clone()
    } else {
        "conversion panicked".to_string()
    }
}
