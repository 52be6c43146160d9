//! Matchup Predictor: `(batter, bowler, phase)` → dismissal prediction.

use crate::config::MatchupConfig;
use crate::encoder::EncoderSet;
use crate::error::{ArtifactError, Result, ScoringError};
use crate::features::{assemble_features, FeatureVector, FEATURE_COUNT};
use crate::model::{Classifier, ModelArtifact};
use crate::stats::{History, MatchupStatsTable};
use crate::stats_cache::load_stats_cache;
use serde::Serialize;
use std::fmt;

/// Hard label plus the probability of a dismissal.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct PredictionResult {
    /// 1 = predicted dismissal, 0 = predicted survival
    pub label: u8,
    /// Probability of label 1, regardless of the predicted label
    pub probability: f64,
    pub features: FeatureVector,
    pub history: History,
}

impl PredictionResult {
    pub fn is_wicket(&self) -> bool {
        self.label == 1
    }

    pub fn is_cold_start(&self) -> bool {
        self.history == History::ColdStart
    }

    /// Probability as a percentage rounded to two decimals.
    pub fn chance_percent(&self) -> f64 {
        (self.probability * 100.0 * 100.0).round() / 100.0
    }

    pub fn verdict<'a>(&'a self, batter: &'a str, bowler: &'a str) -> Verdict<'a> {
        Verdict {
            result: self,
            batter,
            bowler,
        }
    }
}

/// User-facing rendering of a prediction.
pub struct Verdict<'a> {
    result: &'a PredictionResult,
    batter: &'a str,
    bowler: &'a str,
}

impl fmt::Display for Verdict<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.result.is_wicket() {
            writeln!(f, "Likely Wicket!")?;
            writeln!(f, "`{}` may get out to `{}`.", self.batter, self.bowler)?;
        } else {
            writeln!(f, "Safe Ball!")?;
            writeln!(f, "`{}` is likely to survive this delivery.", self.batter)?;
        }
        write!(f, "Chance: {:.2}%", self.result.chance_percent())?;
        if self.result.is_cold_start() {
            write!(f, "\n(no history for this matchup; historical features defaulted to 0)")?;
        }
        Ok(())
    }
}

/// Read-only artifacts shared by every prediction in a session.
#[derive(Debug)]
pub struct MatchupContext {
    encoders: EncoderSet,
    table: MatchupStatsTable,
    model: Box<dyn Classifier>,
}

impl MatchupContext {
    /// Fails when the model was not fitted on the five-feature layout.
    pub fn new(
        encoders: EncoderSet,
        table: MatchupStatsTable,
        model: Box<dyn Classifier>,
    ) -> std::result::Result<Self, ArtifactError> {
        if model.n_features() != FEATURE_COUNT {
            return Err(ArtifactError::InvalidModel(format!(
                "model expects {} features, feature vector has {}",
                model.n_features(),
                FEATURE_COUNT
            )));
        }
        Ok(Self {
            encoders,
            table,
            model,
        })
    }

    /// Load every artifact named by the configuration.
    ///
    /// The stats cache is preferred over the CSV when configured.
    pub fn load(config: &MatchupConfig) -> std::result::Result<Self, ArtifactError> {
        let encoders = EncoderSet::load(
            &config.batter_encoder_path(),
            &config.bowler_encoder_path(),
            &config.phase_encoder_path(),
        )?;

        let table = match config.stats_cache_path() {
            Some(cache) => load_stats_cache(&cache)?,
            None => MatchupStatsTable::load_csv(&config.stats_csv_path())?.0,
        };

        let model = ModelArtifact::load(&config.model_path())?;

        let unencodable = table
            .batters()
            .iter()
            .filter(|b| !encoders.batter.contains(b))
            .count();
        if unencodable > 0 {
            log::warn!(
                "{} batters in the stats table are unknown to the batter encoder",
                unencodable
            );
        }

        Self::new(encoders, table, Box::new(model))
    }

    pub fn predict(&self, batter: &str, bowler: &str, phase: &str) -> Result<PredictionResult> {
        let (features, history) =
            assemble_features(&self.encoders, &self.table, batter, bowler, phase)?;
        log::debug!(
            "Features for {} vs {} ({}): {:?}",
            batter,
            bowler,
            phase,
            features.values()
        );

        let label = self.model.predict(features.as_slice())?;
        let proba = self.model.predict_proba(features.as_slice())?;
        if label > 1 {
            return Err(ScoringError::MalformedOutput(format!("label {label} is not binary")).into());
        }

        Ok(PredictionResult {
            label,
            probability: proba[1],
            features,
            history: history.source,
        })
    }

    pub fn encoders(&self) -> &EncoderSet {
        &self.encoders
    }

    pub fn table(&self) -> &MatchupStatsTable {
        &self.table
    }

    pub fn model(&self) -> &dyn Classifier {
        self.model.as_ref()
    }
}
