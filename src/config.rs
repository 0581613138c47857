//! Runtime configuration.
//!
//! Hierarchical configuration with file and environment-variable sources:
//! defaults, then an optional TOML file, then `GEOREF_*` environment
//! overrides (`GEOREF_TRANSFORM__MAX_RETRIES=1` overrides
//! `transform.max_retries`).

use crate::error::GeorefError;
use crate::logging::LoggingConfig;
use crate::types::RankingOptions;
use config::{Config, Environment, File};
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Root configuration structure
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct GeorefConfig {
    /// Candidate selection behavior
    #[serde(default)]
    pub transform: TransformConfig,

    /// Logging configuration
    #[serde(default)]
    pub logging: LoggingConfig,
}

/// Candidate selection options for one transform aggregate.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TransformConfig {
    /// How many failed candidates a single-coordinate call may exclude
    /// before falling back to a grid-free candidate.
    #[serde(default = "default_max_retries")]
    pub max_retries: usize,

    /// Options forwarded verbatim to the engine's candidate ranker.
    #[serde(default)]
    pub ranking: RankingOptions,
}

fn default_max_retries() -> usize {
    2
}

impl Default for TransformConfig {
    fn default() -> Self {
        Self {
            max_retries: default_max_retries(),
            ranking: RankingOptions::default(),
        }
    }
}

impl GeorefConfig {
    /// Load configuration from an optional file plus `GEOREF_*` environment
    /// overrides. A missing file is not an error; defaults fill every gap.
    pub fn load(file: Option<&Path>) -> Result<Self, GeorefError> {
        let mut builder = Config::builder();
        if let Some(path) = file {
            builder = builder.add_source(File::from(path).required(false));
        }
        let config = builder
            .add_source(
                Environment::with_prefix("GEOREF")
                    // `separator` would otherwise double as the prefix
                    // separator, requiring `GEOREF__*` instead of `GEOREF_*`.
                    .prefix_separator("_")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()?;
        Ok(config.try_deserialize()?)
    }
}
