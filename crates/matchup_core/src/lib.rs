//! # matchup_core - Batter vs Bowler Dismissal Prediction
//!
//! Loads a pre-trained binary classifier, the three label encoders it was
//! fitted with, and a table of historical batter-versus-bowler statistics,
//! then predicts whether a batter gets out to a bowler in a given phase.
//!
//! ## Features
//! - Deterministic: same artifacts and inputs give the same prediction
//! - Unknown labels fail instead of silently defaulting
//! - Unseen matchups fall back to zero history and are flagged as cold starts
//! - Descriptive rankings (top dismissers, fastest scoring, deadliest bowlers)

pub mod config;
pub mod encoder;
pub mod error;
pub mod features;
pub mod model;
pub mod predictor;
pub mod report;
pub mod stats;
pub mod stats_cache;

pub use config::{MatchupConfig, ARTIFACT_DIR_ENV, DEFAULT_CONFIG_PATH};
pub use encoder::{CategoryEncoder, EncoderSet};
pub use error::{ArtifactError, CategoryField, PredictError, Result, ScoringError};
pub use features::{assemble_features, FeatureVector, Phase, FEATURE_COUNT, FEATURE_NAMES};
pub use model::{Classifier, ForestModel, LogisticModel, ModelArtifact};
pub use predictor::{MatchupContext, PredictionResult, Verdict};
pub use report::{
    deadliest_bowlers, fastest_scoring, matchup_summary, top_dismissers, BatterReport,
    RankedEntry,
};
pub use stats::{History, MatchupHistory, MatchupRow, MatchupStatsTable, ParseStats};
pub use stats_cache::{decode_stats_cache, load_stats_cache, StatsCachePayload};

// Version information
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
