//! Parser/renderer pipeline
//!
//! Pipeline: markdown → [`parser`] (Comrak + plugin matching) → IR → [`render`] →
//! document nodes → validation. Results are memoized by exact input text.
//!
//! The same IR also feeds the flat markup writer ([`Pipeline::to_flat`]) so both output
//! formats see identical plugin matching.

pub mod limits;
pub mod parser;
pub mod render;

use crate::cache::{CacheStats, ConversionCache};
use crate::diagnostics::Diagnostic;
use crate::error::ConversionError;
use crate::formats::wiki::WikiWriter;
use crate::model::Document;
use crate::registry::PluginRegistry;
use crate::validator::{ValidationMode, Validator};
use limits::Limits;
use parser::Parser;
use render::Renderer;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{debug, warn};

/// Tunables of a [`Pipeline`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PipelineOptions {
    pub limits: Limits,
    /// Number of conversions memoized; 0 disables the cache.
    pub cache_capacity: usize,
    pub validation: ValidationMode,
}

impl Default for PipelineOptions {
    fn default() -> Self {
        PipelineOptions {
            limits: Limits::default(),
            cache_capacity: 256,
            validation: ValidationMode::Advisory,
        }
    }
}

/// A converted document and the warnings collected while producing it.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Conversion {
    pub document: Document,
    pub warnings: Vec<Diagnostic>,
}

/// Flat markup and the warnings collected while producing it.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FlatConversion {
    pub markup: String,
    pub warnings: Vec<Diagnostic>,
}

/// Markdown → structured document converter.
///
/// Owns its plugin registry and cache, so independently configured pipelines can live
/// side by side. Conversions take `&self` and may run concurrently.
pub struct Pipeline {
    registry: PluginRegistry,
    options: PipelineOptions,
    cache: ConversionCache<Conversion>,
}

impl Pipeline {
    pub fn new(registry: PluginRegistry, options: PipelineOptions) -> Self {
        Pipeline {
            cache: ConversionCache::new(options.cache_capacity),
            registry,
            options,
        }
    }

    /// Convert markdown, serving repeated inputs from the cache.
    pub fn convert(&self, markdown: &str) -> Result<Arc<Conversion>, ConversionError> {
        self.convert_with_status(markdown)
            .map(|(conversion, _)| conversion)
    }

    /// Like [`Pipeline::convert`], also telling whether the result came from the cache.
    pub fn convert_with_status(
        &self,
        markdown: &str,
    ) -> Result<(Arc<Conversion>, bool), ConversionError> {
        if let Some(hit) = self.cache.get(markdown) {
            debug!(len = markdown.len(), "conversion cache hit");
            return Ok((hit, true));
        }
        debug!(len = markdown.len(), "conversion cache miss");
        let conversion = Arc::new(self.convert_uncached(markdown)?);
        self.cache.insert(markdown, Arc::clone(&conversion));
        Ok((conversion, false))
    }

    /// Convert without consulting or filling the cache.
    pub fn convert_uncached(&self, markdown: &str) -> Result<Conversion, ConversionError> {
        let mut warnings = Vec::new();
        let parser = Parser::new(&self.registry, &self.options.limits);
        let ir = parser.parse(markdown, 0, &mut warnings)?;

        let mut renderer = Renderer::new(&self.registry, &parser, self.options.limits, warnings);
        let content = renderer.render_document(&ir)?;
        let mut warnings = renderer.into_warnings();
        let document = Document::new(content);

        let report = Validator::new(self.options.validation).check(&document)?;
        if !report.valid {
            warn!(errors = report.errors.len(), "converted document failed validation");
            warnings.extend(report.errors.into_iter().map(Diagnostic::validation));
        }
        Ok(Conversion { document, warnings })
    }

    /// Convert markdown into the legacy flat markup. Never cached.
    pub fn to_flat(&self, markdown: &str) -> Result<FlatConversion, ConversionError> {
        let mut warnings = Vec::new();
        let parser = Parser::new(&self.registry, &self.options.limits);
        let ir = parser.parse(markdown, 0, &mut warnings)?;

        let mut writer = WikiWriter::new(&self.registry, &parser, warnings);
        let markup = writer.write(&ir)?;
        Ok(FlatConversion {
            markup,
            warnings: writer.into_warnings(),
        })
    }

    pub fn registry(&self) -> &PluginRegistry {
        &self.registry
    }

    /// Mutable access to the plugins. Clears the cache, since cached results may no
    /// longer match what the changed registry would produce.
    pub fn registry_mut(&mut self) -> &mut PluginRegistry {
        self.cache.clear();
        &mut self.registry
    }

    pub fn options(&self) -> &PipelineOptions {
        &self.options
    }

    pub fn cache_stats(&self) -> CacheStats {
        self.cache.stats()
    }

    /// Hits recorded for a cached input, if it is cached.
    pub fn cache_hits(&self, markdown: &str) -> Option<u64> {
        self.cache.hit_count(markdown)
    }

    pub fn clear_cache(&self) {
        self.cache.clear();
    }
}

impl Default for Pipeline {
    fn default() -> Self {
        Self::new(PluginRegistry::with_defaults(), PipelineOptions::default())
    }
}

impl std::fmt::Debug for Pipeline {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Pipeline")
            .field("registry", &self.registry)
            .field("options", &self.options)
            .field("cache", &self.cache)
            .finish()
    }
}
