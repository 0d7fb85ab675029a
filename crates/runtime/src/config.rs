use std::fs;
use std::path::Path;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use uf_artifacts::ArtifactPaths;
use uf_pipeline::PipelineConfig;

/// Service configuration. Every field has a default, so a config file only
/// needs the values it changes.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct ServiceConfig {
    pub artifacts: ArtifactPaths,
    pub pipeline: PipelineConfig,
}

impl ServiceConfig {
    pub fn from_file(path: &Path) -> Result<Self> {
        let text = fs::read_to_string(path)
            .with_context(|| format!("failed to read config at {}", path.display()))?;
        serde_json::from_str(&text).with_context(|| format!("failed to parse config {}", path.display()))
    }
}
