//! Converter configuration.

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use mesh_raster::ConversionConfig;
use storage::ObjectStorageConfig;

/// Top-level converter configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ConverterConfig {
    /// Grid, timestep, layer and domain settings
    pub conversion: ConversionConfig,

    /// Object storage connection
    pub storage: ObjectStorageConfig,

    /// Object prefix holding domain files
    pub input_prefix: String,

    /// Object prefix rasters are uploaded under
    pub output_prefix: String,

    /// Where downloaded domain files are staged (system temp dir if unset)
    pub scratch_dir: Option<PathBuf>,

    /// Domains converted concurrently under the `each` policy
    pub parallel_domains: usize,
}

impl Default for ConverterConfig {
    fn default() -> Self {
        Self {
            conversion: ConversionConfig::default(),
            storage: ObjectStorageConfig::default(),
            input_prefix: String::new(),
            output_prefix: String::new(),
            scratch_dir: None,
            parallel_domains: 4,
        }
    }
}

impl ConverterConfig {
    /// Load configuration from a YAML file. Missing keys take their defaults.
    pub fn from_yaml<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config {}", path.display()))?;
        serde_yaml::from_str(&text)
            .with_context(|| format!("Failed to parse config {}", path.display()))
    }

    /// Apply environment variables on top of this configuration.
    pub fn with_env_overrides(mut self) -> Self {
        self.conversion = self.conversion.with_env_overrides();
        self.storage = self.storage.with_env_overrides();

        if let Ok(val) = std::env::var("INPUT_PREFIX") {
            self.input_prefix = val;
        }
        if let Ok(val) = std::env::var("OUTPUT_PREFIX") {
            self.output_prefix = val;
        }
        if let Ok(val) = std::env::var("SCRATCH_DIR") {
            self.scratch_dir = Some(PathBuf::from(val));
        }
        if let Ok(val) = std::env::var("PARALLEL_DOMAINS") {
            if let Ok(n) = val.parse() {
                self.parallel_domains = n;
            }
        }

        self
    }

    /// Load from `path` if given, otherwise from defaults, then apply the environment.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let base = match path {
            Some(path) => Self::from_yaml(path)?,
            None => Self::default(),
        };
        let config = base.with_env_overrides();
        config.conversion.validate()?;
        Ok(config)
    }
}
