//! Feature vector assembly.

use crate::encoder::EncoderSet;
use crate::error::PredictError;
use crate::stats::{MatchupHistory, MatchupStatsTable};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Number of features the scoring model expects.
pub const FEATURE_COUNT: usize = 5;

/// Column names, in vector order.
pub const FEATURE_NAMES: [&str; FEATURE_COUNT] = [
    "batsman",
    "bowler",
    "phase",
    "dismissal_count",
    "strike_rate_vs_bowler",
];

/// Coarse match stage.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Phase {
    Powerplay,
    Middle,
    Death,
}

impl Phase {
    pub const ALL: [Phase; 3] = [Phase::Powerplay, Phase::Middle, Phase::Death];

    /// Label as stored in the phase encoder.
    pub fn as_str(&self) -> &'static str {
        match self {
            Phase::Powerplay => "Powerplay",
            Phase::Middle => "Middle",
            Phase::Death => "Death",
        }
    }
}

impl fmt::Display for Phase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Phase {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Phase::ALL
            .into_iter()
            .find(|p| p.as_str().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| format!("unknown phase '{s}' (expected Powerplay, Middle or Death)"))
    }
}

/// `[batter_code, bowler_code, phase_code, dismissal_count, strike_rate]`
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct FeatureVector([f64; FEATURE_COUNT]);

impl FeatureVector {
    pub fn new(
        batter_code: u32,
        bowler_code: u32,
        phase_code: u32,
        dismissal_count: u32,
        strike_rate: f64,
    ) -> Self {
        Self([
            batter_code as f64,
            bowler_code as f64,
            phase_code as f64,
            dismissal_count as f64,
            strike_rate,
        ])
    }

    pub fn as_slice(&self) -> &[f64] {
        &self.0
    }

    pub fn values(&self) -> [f64; FEATURE_COUNT] {
        self.0
    }

    pub fn dismissal_count(&self) -> f64 {
        self.0[3]
    }

    pub fn strike_rate(&self) -> f64 {
        self.0[4]
    }
}

/// Encode the three labels and attach the pair's history.
pub fn assemble_features(
    encoders: &EncoderSet,
    table: &MatchupStatsTable,
    batter: &str,
    bowler: &str,
    phase: &str,
) -> Result<(FeatureVector, MatchupHistory), PredictError> {
    let batter_code = encoders.batter.encode(batter)?;
    let bowler_code = encoders.bowler.encode(bowler)?;
    let phase_code = encoders.phase.encode(phase)?;

    let history = table.history(batter, bowler);

    let features = FeatureVector::new(
        batter_code,
        bowler_code,
        phase_code,
        history.dismissal_count,
        history.strike_rate,
    );
    Ok((features, history))
}
