//! Fitted label encoders for the three categorical inputs.
//!
//! Artifact format: JSON object `{"classes": ["label0", "label1", ...]}`.
//! The code of a label is its index in `classes`, which is the convention of
//! the label encoders the training pipeline exports (sorted, de-duplicated
//! vocabulary).

use crate::error::{ArtifactError, CategoryField, PredictError};
use rustc_hash::FxHashMap;
use serde::{Deserialize, Serialize};
use std::path::Path;

#[derive(Debug, Clone, Serialize, Deserialize)]
struct EncoderArtifact {
    classes: Vec<String>,
}

/// Immutable label → code bijection over a closed vocabulary.
#[derive(Debug, Clone)]
pub struct CategoryEncoder {
    field: CategoryField,
    classes: Vec<String>,
    codes: FxHashMap<String, u32>,
}

impl CategoryEncoder {
    /// Build an encoder from its fitted vocabulary.
    ///
    /// Rejects an empty vocabulary and duplicate labels, since either would
    /// break the bijection.
    pub fn from_classes(
        field: CategoryField,
        classes: Vec<String>,
    ) -> Result<Self, ArtifactError> {
        if classes.is_empty() {
            return Err(ArtifactError::InvalidEncoder {
                field,
                reason: "empty vocabulary".to_string(),
            });
        }

        let mut codes = FxHashMap::default();
        for (idx, label) in classes.iter().enumerate() {
            if codes.insert(label.clone(), idx as u32).is_some() {
                return Err(ArtifactError::InvalidEncoder {
                    field,
                    reason: format!("duplicate label '{label}'"),
                });
            }
        }

        Ok(Self {
            field,
            classes,
            codes,
        })
    }

    pub fn from_json_str(field: CategoryField, json: &str) -> Result<Self, ArtifactError> {
        let artifact: EncoderArtifact = serde_json::from_str(json)?;
        Self::from_classes(field, artifact.classes)
    }

    pub fn load(field: CategoryField, path: &Path) -> Result<Self, ArtifactError> {
        let json = std::fs::read_to_string(path).map_err(|e| ArtifactError::io(path, e))?;
        let encoder = Self::from_json_str(field, &json)?;
        log::info!(
            "Loaded {} encoder ({} labels) from {}",
            field,
            encoder.len(),
            path.display()
        );
        Ok(encoder)
    }

    /// Encode a label. Unknown labels fail instead of defaulting.
    pub fn encode(&self, label: &str) -> Result<u32, PredictError> {
        self.codes
            .get(label)
            .copied()
            .ok_or_else(|| PredictError::UnknownCategory {
                field: self.field,
                label: label.to_string(),
            })
    }

    pub fn decode(&self, code: u32) -> Option<&str> {
        self.classes.get(code as usize).map(String::as_str)
    }

    pub fn contains(&self, label: &str) -> bool {
        self.codes.contains_key(label)
    }

    pub fn classes(&self) -> &[String] {
        &self.classes
    }

    pub fn field(&self) -> CategoryField {
        self.field
    }

    pub fn len(&self) -> usize {
        self.classes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.classes.is_empty()
    }
}

/// The batter, bowler and phase encoders, always used together.
#[derive(Debug, Clone)]
pub struct EncoderSet {
    pub batter: CategoryEncoder,
    pub bowler: CategoryEncoder,
    pub phase: CategoryEncoder,
}

impl EncoderSet {
    pub fn new(
        batter: CategoryEncoder,
        bowler: CategoryEncoder,
        phase: CategoryEncoder,
    ) -> Result<Self, ArtifactError> {
        for (expected, encoder) in [
            (CategoryField::Batter, &batter),
            (CategoryField::Bowler, &bowler),
            (CategoryField::Phase, &phase),
        ] {
            if encoder.field() != expected {
                return Err(ArtifactError::InvalidEncoder {
                    field: expected,
                    reason: format!("encoder was built for field '{}'", encoder.field()),
                });
            }
        }

        Ok(Self {
            batter,
            bowler,
            phase,
        })
    }

    pub fn load(batter: &Path, bowler: &Path, phase: &Path) -> Result<Self, ArtifactError> {
        Self::new(
            CategoryEncoder::load(CategoryField::Batter, batter)?,
            CategoryEncoder::load(CategoryField::Bowler, bowler)?,
            CategoryEncoder::load(CategoryField::Phase, phase)?,
        )
    }
}
