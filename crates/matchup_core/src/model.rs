//! Binary classifier artifacts.
//!
//! The scoring model is trained elsewhere and exported as JSON tagged by
//! `kind`:
//! - `logistic`: `{"kind": "logistic", "intercept": f, "coefficients": [..]}`
//! - `forest`: `{"kind": "forest", "n_features": n, "trees": [{"nodes": [..]}]}`
//!   where each node is either a split
//!   `{"feature": i, "threshold": t, "left": l, "right": r}` or a leaf
//!   `{"value": [class0, class1]}`.

use crate::error::{ArtifactError, ScoringError};
use serde::{Deserialize, Serialize};
use std::path::Path;

const PROBA_SUM_TOLERANCE: f64 = 1e-6;

/// A fitted binary classifier.
pub trait Classifier: Send + Sync + std::fmt::Debug {
    /// Feature count the model was fitted on.
    fn n_features(&self) -> usize;

    /// `[p(class 0), p(class 1)]`
    fn predict_proba(&self, features: &[f64]) -> Result<[f64; 2], ScoringError>;

    /// Hard label: the more probable class, class 0 on ties.
    fn predict(&self, features: &[f64]) -> Result<u8, ScoringError> {
        let proba = self.predict_proba(features)?;
        Ok(if proba[1] > proba[0] { 1 } else { 0 })
    }
}

fn check_shape(expected: usize, features: &[f64]) -> Result<(), ScoringError> {
    if features.len() != expected {
        return Err(ScoringError::FeatureShape {
            expected,
            found: features.len(),
        });
    }
    if let Some(idx) = features.iter().position(|v| !v.is_finite()) {
        return Err(ScoringError::MalformedOutput(format!(
            "feature {idx} is not finite"
        )));
    }
    Ok(())
}

/// Reject probability pairs that are not a distribution.
pub fn check_proba(proba: [f64; 2]) -> Result<[f64; 2], ScoringError> {
    if proba.iter().any(|p| !p.is_finite() || *p < 0.0 || *p > 1.0) {
        return Err(ScoringError::MalformedOutput(format!(
            "probabilities out of range: {proba:?}"
        )));
    }
    let sum = proba[0] + proba[1];
    if (sum - 1.0).abs() > PROBA_SUM_TOLERANCE {
        return Err(ScoringError::MalformedOutput(format!(
            "probabilities sum to {sum}, expected 1"
        )));
    }
    Ok(proba)
}

fn sigmoid(z: f64) -> f64 {
    1.0 / (1.0 + (-z).exp())
}

/// Logistic regression: `p1 = sigmoid(intercept + w·x)`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LogisticModel {
    pub intercept: f64,
    pub coefficients: Vec<f64>,
}

impl LogisticModel {
    fn validate(&self) -> Result<(), ArtifactError> {
        if self.coefficients.is_empty() {
            return Err(ArtifactError::InvalidModel(
                "logistic model has no coefficients".to_string(),
            ));
        }
        if !self.intercept.is_finite() || self.coefficients.iter().any(|w| !w.is_finite()) {
            return Err(ArtifactError::InvalidModel(
                "logistic model has non-finite weights".to_string(),
            ));
        }
        Ok(())
    }
}

impl Classifier for LogisticModel {
    fn n_features(&self) -> usize {
        self.coefficients.len()
    }

    fn predict_proba(&self, features: &[f64]) -> Result<[f64; 2], ScoringError> {
        check_shape(self.n_features(), features)?;

        let z = self.intercept
            + self
                .coefficients
                .iter()
                .zip(features)
                .map(|(w, x)| w * x)
                .sum::<f64>();
        let p1 = sigmoid(z);
        check_proba([1.0 - p1, p1])
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum TreeNode {
    Split {
        feature: usize,
        threshold: f64,
        left: usize,
        right: usize,
    },
    /// Class weights at the leaf (counts or fractions).
    Leaf { value: [f64; 2] },
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DecisionTree {
    pub nodes: Vec<TreeNode>,
}

impl DecisionTree {
    fn validate(&self, tree_idx: usize, n_features: usize) -> Result<(), ArtifactError> {
        let invalid = |msg: String| ArtifactError::InvalidModel(format!("tree {tree_idx}: {msg}"));

        if self.nodes.is_empty() {
            return Err(invalid("no nodes".to_string()));
        }

        for (idx, node) in self.nodes.iter().enumerate() {
            match node {
                TreeNode::Split {
                    feature,
                    threshold,
                    left,
                    right,
                } => {
                    if *feature >= n_features {
                        return Err(invalid(format!(
                            "node {idx} splits on feature {feature}, model has {n_features}"
                        )));
                    }
                    if !threshold.is_finite() {
                        return Err(invalid(format!("node {idx} has a non-finite threshold")));
                    }
                    // Children always come after their parent, so traversal terminates
                    for child in [*left, *right] {
                        if child <= idx || child >= self.nodes.len() {
                            return Err(invalid(format!(
                                "node {idx} has child {child} out of range"
                            )));
                        }
                    }
                }
                TreeNode::Leaf { value } => {
                    let valid = value.iter().all(|v| v.is_finite() && *v >= 0.0)
                        && value[0] + value[1] > 0.0;
                    if !valid {
                        return Err(invalid(format!("leaf {idx} has invalid value {value:?}")));
                    }
                }
            }
        }
        Ok(())
    }

    /// Walks at most `nodes.len()` steps, so an unvalidated cyclic tree
    /// fails instead of looping.
    fn leaf_proba(&self, features: &[f64]) -> Result<[f64; 2], ScoringError> {
        let mut idx = 0;
        for _ in 0..self.nodes.len() {
            match self.nodes.get(idx) {
                Some(TreeNode::Split {
                    feature,
                    threshold,
                    left,
                    right,
                }) => {
                    let value = features.get(*feature).ok_or_else(|| {
                        ScoringError::MalformedOutput(format!(
                            "node {idx} splits on feature {feature}, vector has {}",
                            features.len()
                        ))
                    })?;
                    idx = if *value <= *threshold { *left } else { *right };
                }
                Some(TreeNode::Leaf { value }) => {
                    let total = value[0] + value[1];
                    return Ok([value[0] / total, value[1] / total]);
                }
                None => {
                    return Err(ScoringError::MalformedOutput(format!(
                        "tree walked to missing node {idx}"
                    )))
                }
            }
        }
        Err(ScoringError::MalformedOutput(
            "tree walk did not reach a leaf".to_string(),
        ))
    }
}

/// Tree ensemble averaging per-tree class probabilities.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ForestModel {
    pub n_features: usize,
    pub trees: Vec<DecisionTree>,
}

impl ForestModel {
    fn validate(&self) -> Result<(), ArtifactError> {
        if self.n_features == 0 {
            return Err(ArtifactError::InvalidModel(
                "forest declares zero features".to_string(),
            ));
        }
        if self.trees.is_empty() {
            return Err(ArtifactError::InvalidModel("forest has no trees".to_string()));
        }
        for (idx, tree) in self.trees.iter().enumerate() {
            tree.validate(idx, self.n_features)?;
        }
        Ok(())
    }
}

impl Classifier for ForestModel {
    fn n_features(&self) -> usize {
        self.n_features
    }

    fn predict_proba(&self, features: &[f64]) -> Result<[f64; 2], ScoringError> {
        check_shape(self.n_features, features)?;

        let mut sum = [0.0, 0.0];
        for tree in &self.trees {
            let p = tree.leaf_proba(features)?;
            sum[0] += p[0];
            sum[1] += p[1];
        }
        let n = self.trees.len() as f64;
        check_proba([sum[0] / n, sum[1] / n])
    }
}

/// Model artifact as exported by the training pipeline.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ModelArtifact {
    Logistic(LogisticModel),
    Forest(ForestModel),
}

impl ModelArtifact {
    pub fn from_json_str(json: &str) -> Result<Self, ArtifactError> {
        let model: ModelArtifact = serde_json::from_str(json)?;
        model.validate()?;
        Ok(model)
    }

    pub fn load(path: &Path) -> Result<Self, ArtifactError> {
        let json = std::fs::read_to_string(path).map_err(|e| ArtifactError::io(path, e))?;
        let model = Self::from_json_str(&json)?;
        log::info!(
            "Loaded {} model ({} features) from {}",
            model.kind(),
            model.n_features(),
            path.display()
        );
        Ok(model)
    }

    pub fn validate(&self) -> Result<(), ArtifactError> {
        match self {
            ModelArtifact::Logistic(m) => m.validate(),
            ModelArtifact::Forest(m) => m.validate(),
        }
    }

    pub fn kind(&self) -> &'static str {
        match self {
            ModelArtifact::Logistic(_) => "logistic",
            ModelArtifact::Forest(_) => "forest",
        }
    }
}

impl Classifier for ModelArtifact {
    fn n_features(&self) -> usize {
        match self {
            ModelArtifact::Logistic(m) => m.n_features(),
            ModelArtifact::Forest(m) => m.n_features(),
        }
    }

    fn predict_proba(&self, features: &[f64]) -> Result<[f64; 2], ScoringError> {
        match self {
            ModelArtifact::Logistic(m) => m.predict_proba(features),
            ModelArtifact::Forest(m) => m.predict_proba(features),
        }
    }
}
