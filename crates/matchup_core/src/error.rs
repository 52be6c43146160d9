use std::path::PathBuf;
use thiserror::Error;

/// Which categorical input an encoder belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CategoryField {
    Batter,
    Bowler,
    Phase,
}

impl CategoryField {
    pub fn as_str(&self) -> &'static str {
        match self {
            CategoryField::Batter => "batter",
            CategoryField::Bowler => "bowler",
            CategoryField::Phase => "phase",
        }
    }
}

impl std::fmt::Display for CategoryField {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Error, Debug, Clone, PartialEq)]
pub enum ScoringError {
    #[error("Feature shape mismatch: model expects {expected} features, got {found}")]
    FeatureShape { expected: usize, found: usize },

    #[error("Malformed model output: {0}")]
    MalformedOutput(String),
}

#[derive(Error, Debug, Clone, PartialEq)]
pub enum PredictError {
    #[error("Unknown {field} '{label}': not part of the fitted vocabulary")]
    UnknownCategory { field: CategoryField, label: String },

    #[error("Scoring failed: {0}")]
    Scoring(#[from] ScoringError),
}

#[derive(Error, Debug)]
pub enum ArtifactError {
    #[error("IO error at {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("Stats cache decode failed: {0}")]
    Cache(String),

    #[error("Invalid {field} encoder: {reason}")]
    InvalidEncoder { field: CategoryField, reason: String },

    #[error("Invalid model: {0}")]
    InvalidModel(String),

    #[error("Stats table is missing required column '{column}'")]
    MissingColumn { column: String },

    #[error("Stats table is empty: no valid rows in {}", path.display())]
    EmptyTable { path: PathBuf },
}

impl ArtifactError {
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        ArtifactError::Io {
            path: path.into(),
            source,
        }
    }
}

impl From<rmp_serde::decode::Error> for ArtifactError {
    fn from(err: rmp_serde::decode::Error) -> Self {
        ArtifactError::Cache(format!("MessagePack deserialize failed: {err}"))
    }
}

impl From<lz4_flex::block::DecompressError> for ArtifactError {
    fn from(err: lz4_flex::block::DecompressError) -> Self {
        ArtifactError::Cache(format!("LZ4 decompress failed: {err}"))
    }
}

pub type Result<T> = std::result::Result<T, PredictError>;
