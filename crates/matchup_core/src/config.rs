//! Artifact locations.
//!
//! Read from a YAML file; every field is optional and falls back to the
//! artifact names the training pipeline writes. `MATCHUP_ARTIFACT_DIR`
//! overrides `artifact_dir`.

use crate::error::ArtifactError;
use serde::{Deserialize, Serialize};
use std::env;
use std::path::{Path, PathBuf};

/// Env var overriding the artifact directory.
pub const ARTIFACT_DIR_ENV: &str = "MATCHUP_ARTIFACT_DIR";

/// Default config file name, looked up in the working directory.
pub const DEFAULT_CONFIG_PATH: &str = "matchup.yaml";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MatchupConfig {
    pub artifact_dir: PathBuf,
    pub model: PathBuf,
    pub batter_encoder: PathBuf,
    pub bowler_encoder: PathBuf,
    pub phase_encoder: PathBuf,
    pub stats_csv: PathBuf,
    /// Compressed stats cache; used instead of `stats_csv` when set.
    pub stats_cache: Option<PathBuf>,
}

impl Default for MatchupConfig {
    fn default() -> Self {
        Self {
            artifact_dir: PathBuf::from("."),
            model: PathBuf::from("model.json"),
            batter_encoder: PathBuf::from("le_batsman.json"),
            bowler_encoder: PathBuf::from("le_bowler.json"),
            phase_encoder: PathBuf::from("le_phase.json"),
            stats_csv: PathBuf::from("data_with_features.csv"),
            stats_cache: None,
        }
    }
}

impl MatchupConfig {
    pub fn from_yaml_str(yaml: &str) -> Result<Self, ArtifactError> {
        Ok(serde_yaml::from_str(yaml)?)
    }

    /// Load from `path`, or defaults when the file does not exist.
    /// The env override is applied either way.
    pub fn load(path: &Path) -> Result<Self, ArtifactError> {
        let mut config = if path.exists() {
            let yaml = std::fs::read_to_string(path).map_err(|e| ArtifactError::io(path, e))?;
            log::info!("Using config {}", path.display());
            Self::from_yaml_str(&yaml)?
        } else {
            log::debug!("No config at {}, using defaults", path.display());
            Self::default()
        };
        config.apply_env_override(env::var(ARTIFACT_DIR_ENV).ok());
        Ok(config)
    }

    fn apply_env_override(&mut self, value: Option<String>) {
        if let Some(dir) = value {
            let trimmed = dir.trim();
            if !trimmed.is_empty() {
                self.artifact_dir = PathBuf::from(trimmed);
            }
        }
    }

    fn resolve(&self, file: &Path) -> PathBuf {
        // Absolute paths ignore artifact_dir (PathBuf::join semantics)
        self.artifact_dir.join(file)
    }

    pub fn model_path(&self) -> PathBuf {
        self.resolve(&self.model)
    }

    pub fn batter_encoder_path(&self) -> PathBuf {
        self.resolve(&self.batter_encoder)
    }

    pub fn bowler_encoder_path(&self) -> PathBuf {
        self.resolve(&self.bowler_encoder)
    }

    pub fn phase_encoder_path(&self) -> PathBuf {
        self.resolve(&self.phase_encoder)
    }

    pub fn stats_csv_path(&self) -> PathBuf {
        self.resolve(&self.stats_csv)
    }

    pub fn stats_cache_path(&self) -> Option<PathBuf> {
        self.stats_cache.as_deref().map(|p| self.resolve(p))
    }
}
