//! Output formats
//!
//! Two serializations leave the crate: the structured document (see [`crate::model`],
//! produced by [`crate::pipeline`]) and the legacy flat wiki markup written by [`wiki`].
//! Both are rendered from the same IR.

pub mod wiki;

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Which serialization a conversion produced.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    /// The versioned JSON document tree.
    Structured,
    /// Line-oriented wiki markup.
    Flat,
}

impl OutputFormat {
    pub fn as_str(&self) -> &'static str {
        match self {
            OutputFormat::Structured => "structured",
            OutputFormat::Flat => "flat",
        }
    }
}

impl fmt::Display for OutputFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for OutputFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "structured" | "adf" => Ok(OutputFormat::Structured),
            "flat" | "wiki" => Ok(OutputFormat::Flat),
            other => Err(format!("unknown output format '{other}'")),
        }
    }
}
