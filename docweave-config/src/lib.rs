//! Shared configuration loader for docweave hosts.
//!
//! `defaults/docweave.default.toml` is embedded into every binary so that docs and
//! runtime behavior stay in sync. Hosts layer their own files, environment variables and
//! single-key overrides on top via [`Loader`] before deserializing into
//! [`DocweaveConfig`], then turn it into library options with the `From` impls or
//! [`DocweaveConfig::build_router`].

use config::builder::DefaultState;
use config::{Config, ConfigBuilder, ConfigError, Environment, File, FileFormat, Map, ValueKind};
use docweave::{
    FormatRouter, Limits, Pipeline, PipelineOptions, PluginRegistry, RouterConfig, ValidationMode,
};
use serde::Deserialize;
use std::path::Path;

const DEFAULT_TOML: &str = include_str!("../defaults/docweave.default.toml");

/// Prefix of environment variables read by [`Loader::with_environment`].
pub const ENV_PREFIX: &str = "DOCWEAVE";

/// Top-level configuration consumed by docweave hosts.
#[derive(Debug, Clone, Deserialize)]
pub struct DocweaveConfig {
    pub pipeline: PipelineConfig,
    pub router: RouterSection,
}

#[derive(Debug, Clone, Deserialize)]
pub struct PipelineConfig {
    pub cache_capacity: usize,
    pub validation: ValidationMode,
    pub limits: LimitsConfig,
}

/// Mirrors the truncation and nesting limits of the pipeline.
#[derive(Debug, Clone, Deserialize)]
pub struct LimitsConfig {
    pub max_table_rows: usize,
    pub max_table_cells: usize,
    pub max_list_items: usize,
    pub max_list_depth: usize,
    pub max_text_length: usize,
    pub max_nesting_depth: usize,
}

/// Rollout and detection knobs of the format router.
#[derive(Debug, Clone, Deserialize)]
pub struct RouterSection {
    pub rollout_percentage: u8,
    pub include_users: Vec<String>,
    pub exclude_users: Vec<String>,
    pub force_enable: bool,
    pub force_disable: bool,
    pub hosted_suffixes: Vec<String>,
    pub detection_ttl_secs: u64,
    pub detection_cache_capacity: usize,
    pub flat_cache_capacity: usize,
}

impl From<&LimitsConfig> for Limits {
    fn from(config: &LimitsConfig) -> Self {
        Limits {
            max_table_rows: config.max_table_rows,
            max_table_cells: config.max_table_cells,
            max_list_items: config.max_list_items,
            max_list_depth: config.max_list_depth,
            max_text_length: config.max_text_length,
            max_nesting_depth: config.max_nesting_depth,
        }
    }
}

impl From<&PipelineConfig> for PipelineOptions {
    fn from(config: &PipelineConfig) -> Self {
        PipelineOptions {
            limits: Limits::from(&config.limits),
            cache_capacity: config.cache_capacity,
            validation: config.validation,
        }
    }
}

impl From<RouterSection> for RouterConfig {
    fn from(config: RouterSection) -> Self {
        RouterConfig {
            rollout_percentage: config.rollout_percentage.min(100),
            include_users: config.include_users,
            exclude_users: config.exclude_users,
            force_enable: config.force_enable,
            force_disable: config.force_disable,
            hosted_suffixes: config.hosted_suffixes,
            detection_ttl_secs: config.detection_ttl_secs,
            detection_cache_capacity: config.detection_cache_capacity,
            flat_cache_capacity: config.flat_cache_capacity,
        }
    }
}

impl DocweaveConfig {
    /// A pipeline with the built-in plugins and these options.
    pub fn build_pipeline(&self) -> Pipeline {
        Pipeline::new(
            PluginRegistry::with_defaults(),
            PipelineOptions::from(&self.pipeline),
        )
    }

    /// A router over [`DocweaveConfig::build_pipeline`].
    pub fn build_router(&self) -> FormatRouter {
        FormatRouter::new(self.build_pipeline(), self.router.clone().into())
    }
}

/// Helper for layering user overrides over the built-in defaults.
#[derive(Debug, Clone)]
pub struct Loader {
    builder: ConfigBuilder<DefaultState>,
}

impl Loader {
    /// Start a loader seeded with the embedded defaults.
    pub fn new() -> Self {
        let builder = Config::builder().add_source(File::from_str(DEFAULT_TOML, FileFormat::Toml));
        Self { builder }
    }

    /// Layer a configuration file. Missing files trigger an error.
    pub fn with_file(mut self, path: impl AsRef<Path>) -> Self {
        let source = File::from(path.as_ref())
            .format(FileFormat::Toml)
            .required(true);
        self.builder = self.builder.add_source(source);
        self
    }

    /// Layer an optional configuration file (ignored if the file is absent).
    pub fn with_optional_file(mut self, path: impl AsRef<Path>) -> Self {
        let source = File::from(path.as_ref())
            .format(FileFormat::Toml)
            .required(false);
        self.builder = self.builder.add_source(source);
        self
    }

    /// Layer `DOCWEAVE__SECTION__KEY` variables from the process environment,
    /// e.g. `DOCWEAVE__ROUTER__ROLLOUT_PERCENTAGE=25`. List values are file-only.
    pub fn with_environment(self) -> Self {
        self.with_env_source(None)
    }

    fn with_env_source(mut self, source: Option<Map<String, String>>) -> Self {
        let env = Environment::with_prefix(ENV_PREFIX)
            .prefix_separator("__")
            .separator("__")
            .try_parsing(true)
            .source(source);
        self.builder = self.builder.add_source(env);
        self
    }

    /// Apply a single key/value override (useful for host settings).
    pub fn set_override<I>(mut self, key: &str, value: I) -> Result<Self, ConfigError>
    where
        I: Into<ValueKind>,
    {
        self.builder = self.builder.set_override(key, value)?;
        Ok(self)
    }

    /// Finalize the builder and deserialize the resulting configuration.
    pub fn build(self) -> Result<DocweaveConfig, ConfigError> {
        self.builder.build()?.try_deserialize()
    }
}

impl Default for Loader {
    fn default() -> Self {
        Self::new()
    }
}

/// Convenience helper for callers that only need the defaults.
pub fn load_defaults() -> Result<DocweaveConfig, ConfigError> {
    Loader::new().build()
}

#[cfg(test)]
mod tests {
    use super::*;
    use docweave::OutputFormat;

    #[test]
    fn loads_default_config() {
        let config = load_defaults().expect("defaults to deserialize");
        assert_eq!(config.pipeline.cache_capacity, 256);
        assert_eq!(config.pipeline.validation, ValidationMode::Advisory);
        assert_eq!(config.router.rollout_percentage, 100);
        assert!(config.router.include_users.is_empty());
    }

    #[test]
    fn defaults_match_library_defaults() {
        let config = load_defaults().expect("defaults to deserialize");
        assert_eq!(Limits::from(&config.pipeline.limits), Limits::default());
        assert_eq!(PipelineOptions::from(&config.pipeline), PipelineOptions::default());
        assert_eq!(RouterConfig::from(config.router), RouterConfig::default());
    }

    #[test]
    fn supports_overrides() {
        let config = Loader::new()
            .set_override("pipeline.validation", "strict")
            .expect("override to apply")
            .set_override("pipeline.limits.max_table_rows", 5)
            .expect("override to apply")
            .build()
            .expect("config to build");
        assert_eq!(config.pipeline.validation, ValidationMode::Strict);
        assert_eq!(config.pipeline.limits.max_table_rows, 5);
    }

    #[test]
    fn environment_layer_overrides_defaults() {
        let mut vars = Map::new();
        vars.insert("DOCWEAVE__ROUTER__ROLLOUT_PERCENTAGE".to_string(), "25".to_string());
        vars.insert("DOCWEAVE__ROUTER__FORCE_DISABLE".to_string(), "true".to_string());
        let config = Loader::new()
            .with_env_source(Some(vars))
            .build()
            .expect("config to build");
        assert_eq!(config.router.rollout_percentage, 25);
        assert!(config.router.force_disable);
    }

    #[test]
    fn missing_required_file_fails() {
        let result = Loader::new()
            .with_file("/nonexistent/docweave.toml")
            .build();
        assert!(result.is_err());
    }

    #[test]
    fn missing_optional_file_is_ignored() {
        let config = Loader::new()
            .with_optional_file("/nonexistent/docweave.toml")
            .build()
            .expect("config to build");
        assert_eq!(config.router.detection_ttl_secs, 3600);
    }

    #[test]
    fn built_router_honours_force_disable() {
        let config = Loader::new()
            .set_override("router.force_disable", true)
            .expect("override to apply")
            .build()
            .expect("config to build");
        let router = config.build_router();
        let result = router.convert("**x**", "https://acme.atlassian.net", Some("u"), None);
        assert_eq!(result.format, OutputFormat::Flat);
    }
}
