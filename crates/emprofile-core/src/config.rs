//! Profiler configuration.
//!
//! Everything has a working default; a JSON file only needs the keys it
//! overrides:
//!
//! ```json
//! {
//!   "top_rails": 10,
//!   "artifacts": { "enhanced_memory": "my_memory_config.pbtxt" }
//! }
//! ```

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::ConfigError;
use crate::metrics::energy::DEFAULT_TOP_RAILS;
use crate::metrics::memory::MEMORY_COUNTERS;
use crate::strategy::ArtifactCatalog;

/// Settings shared by the resolver, calculators and report rendering.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ProfilerConfig {
    /// Strategy → collector configuration artifact.
    pub artifacts: ArtifactCatalog,
    /// Rails listed as top consumers.
    pub top_rails: usize,
    /// Memory counters kept for reporting, in display order.
    pub memory_counters: Vec<String>,
}

impl Default for ProfilerConfig {
    fn default() -> Self {
        Self {
            artifacts: ArtifactCatalog::default(),
            top_rails: DEFAULT_TOP_RAILS,
            memory_counters: MEMORY_COUNTERS.iter().map(|s| s.to_string()).collect(),
        }
    }
}

impl ProfilerConfig {
    /// Load a JSON config. Artifact entries given in the file replace the
    /// whole default catalog.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.display().to_string(),
            source,
        })?;
        Self::parse(&text, &path.display().to_string())
    }

    pub fn from_json(text: &str) -> Result<Self, ConfigError> {
        Self::parse(text, "<inline>")
    }

    fn parse(text: &str, origin: &str) -> Result<Self, ConfigError> {
        let config: Self = serde_json::from_str(text).map_err(|source| ConfigError::Parse {
            path: origin.to_string(),
            source,
        })?;
        config.validate()?;
        Ok(config)
    }

    /// Every strategy must own a distinct artifact.
    pub fn validate(&self) -> Result<(), ConfigError> {
        match self.artifacts.find_duplicate() {
            Some((first, second, artifact)) => Err(ConfigError::DuplicateArtifact {
                artifact: artifact.to_string(),
                first,
                second,
            }),
            None => Ok(()),
        }
    }

    /// Memory counter names as borrowed strs, for [`SeriesSet::select`].
    ///
    /// [`SeriesSet::select`]: crate::series::SeriesSet::select
    pub fn memory_counter_names(&self) -> Vec<&str> {
        self.memory_counters.iter().map(String::as_str).collect()
    }
}
