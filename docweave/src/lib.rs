//! Markdown to structured document conversion
//!
//!     This crate turns markdown (extended with plugin syntax such as `:::panel` blocks and
//!     `@mentions`) into a typed, schema-checked document tree that serializes to the
//!     `{ version: 1, type: "doc", content: [...] }` JSON contract. The same input can also be
//!     rendered as the legacy line-oriented flat markup, and a router picks between the two
//!     per target system.
//!
//!     TLDR: For plugin authors:
//!         - A plugin declares how it is matched (a block rule, an inline pattern or both), how
//!           raw text becomes PluginData, and how that data renders as nodes and as flat markup.
//!         - Plugins never build containers with arbitrary children: the renderer places whatever
//!           they return through the content rules, so a bad placement degrades to text with a
//!           warning instead of producing an invalid document.
//!         - Nested markdown inside a plugin body goes back through the pipeline via
//!           NestedRenderer / FlatRenderer, so depth limits hold across plugin boundaries.
//!
//! Architecture
//!
//!     markdown ─► pipeline::parser ─► IR (./ir) ─┬─► pipeline::render ─► model::Document ─► validator
//!                                                └─► formats::wiki    ─► flat markup
//!
//!     Parsing happens once into the IR; both outputs are produced from it, so plugin matching
//!     and markdown quirks are resolved in one place. The router (./router) sits on top of the
//!     pipeline and is the only layer that never returns an error.
//!
//!     This is a pure lib: no code reads files, env vars or installs a log subscriber. Hosts
//!     do that (see the docweave-config crate for the configuration side).
//!
//!     The file structure :
//!     .
//!     ├── error.rs                # ConversionError (fatal)
//!     ├── diagnostics.rs          # Diagnostic (recoverable, returned alongside results)
//!     ├── model
//!     │   ├── nodes.rs            # Document / Node / Mark, the serialized contract
//!     │   └── schema.rs           # content rules, required attrs, mark compatibility
//!     ├── ir                      # Intermediate Representation
//!     ├── plugin.rs               # Plugin trait and render callbacks
//!     ├── registry.rs             # PluginRegistry, ordered lookup
//!     ├── plugins                 # built-in plugins + ::: directive scanner
//!     ├── pipeline
//!     │   ├── parser.rs           # comrak → IR, plugin regions and inline matches
//!     │   ├── render.rs           # IR → nodes, content rules, marks, limits
//!     │   └── limits.rs
//!     ├── cache.rs                # bounded LRU with hit counters
//!     ├── validator.rs
//!     ├── formats
//!     │   └── wiki.rs             # IR → flat markup
//!     └── router                  # deployment detection, rollout, metrics
//!
//! Testing
//!     tests
//!     ├── lib.rs
//!     ├── common
//!     ├── pipeline
//!     ├── plugins
//!     └── router
//!
//!     Note that rust does not by default discover tests in subdirectories, so these are
//!     included from tests/lib.rs.
//!
//! Limits
//!
//!     Table rows/cells, list items/depth and text length are truncated with a visible
//!     "[content truncated: ...]" marker and a warning. Block nesting past max_nesting_depth
//!     is the one condition that aborts a structured conversion; the router answers it with
//!     flat markup and an error message.

pub mod cache;
pub mod diagnostics;
pub mod error;
pub mod formats;
pub mod ir;
pub mod model;
pub mod pipeline;
pub mod plugin;
pub mod plugins;
pub mod registry;
pub mod router;
pub mod validator;

pub use diagnostics::{Diagnostic, DiagnosticKind};
pub use error::ConversionError;
pub use formats::OutputFormat;
pub use model::{Document, Mark, MarkKind, Node, NodeKind};
pub use pipeline::limits::Limits;
pub use pipeline::{Conversion, FlatConversion, Pipeline, PipelineOptions};
pub use plugin::{Plugin, PluginData, PluginParseError};
pub use registry::{PluginRegistry, RegistryError};
pub use router::deployment::DeploymentType;
pub use router::{Content, FormatRouter, RoutedContent, RouterConfig};
pub use validator::{ValidationMode, ValidationReport, Validator};

/// Convert markdown with the built-in plugins and default options, bypassing any cache.
pub fn convert(markdown: &str) -> Result<Conversion, ConversionError> {
    Pipeline::new(
        PluginRegistry::with_defaults(),
        PipelineOptions {
            cache_capacity: 0,
            ..PipelineOptions::default()
        },
    )
    .convert_uncached(markdown)
}
