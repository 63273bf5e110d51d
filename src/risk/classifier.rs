use std::fs;
use std::path::{Path, PathBuf};

use log::info;
use once_cell::sync::OnceCell;
use serde::Deserialize;

use super::features::{FeatureVector, FEATURE_NAMES};
use crate::upstream::UpstreamError;

/// A pre-trained model scoring a feature vector
pub trait RiskClassifier: Send + Sync {
    /// Positive-class probability
    fn probability(&self, features: &FeatureVector) -> Result<f64, UpstreamError>;

    fn threshold(&self) -> f64 {
        0.5
    }

    fn predict(&self, features: &FeatureVector) -> Result<u8, UpstreamError> {
        let probability = self.probability(features)?;
        Ok(u8::from(probability >= self.threshold()))
    }
}

fn default_threshold() -> f64 {
    0.5
}

/// Logistic regression exported as JSON
#[derive(Debug, Deserialize)]
pub struct LogisticModel {
    pub version: String,
    pub feature_names: Vec<String>,
    pub coefficients: Vec<f64>,
    pub intercept: f64,
    #[serde(default = "default_threshold")]
    pub threshold: f64,
}

impl LogisticModel {
    pub fn load(path: &Path) -> Result<Self, UpstreamError> {
        let raw = fs::read_to_string(path)
            .map_err(|e| UpstreamError::Artifact(format!("{}: {e}", path.display())))?;
        let model: LogisticModel = serde_json::from_str(&raw)
            .map_err(|e| UpstreamError::Artifact(format!("{}: {e}", path.display())))?;
        model.check()?;

        info!("Loaded risk model {} from {}", model.version, path.display());
        Ok(model)
    }

    /// The artifact must be trained on exactly our columns, in our order
    fn check(&self) -> Result<(), UpstreamError> {
        if self.feature_names != FEATURE_NAMES {
            return Err(UpstreamError::Artifact(format!(
                "feature names {:?} do not match the expected {:?}",
                self.feature_names, FEATURE_NAMES
            )));
        }
        if self.coefficients.len() != FEATURE_NAMES.len() {
            return Err(UpstreamError::Artifact(format!(
                "{} coefficients for {} features",
                self.coefficients.len(),
                FEATURE_NAMES.len()
            )));
        }
        if !(0.0..=1.0).contains(&self.threshold) {
            return Err(UpstreamError::Artifact(format!(
                "threshold {} is not a probability",
                self.threshold
            )));
        }
        Ok(())
    }
}

impl RiskClassifier for LogisticModel {
    fn probability(&self, features: &FeatureVector) -> Result<f64, UpstreamError> {
        let logit = self.intercept
            + self
                .coefficients
                .iter()
                .zip(features.to_vec())
                .map(|(weight, value)| weight * value)
                .sum::<f64>();

        let probability = 1.0 / (1.0 + (-logit).exp());
        if probability.is_finite() {
            Ok(probability)
        } else {
            Err(UpstreamError::Model(format!("non-finite score for logit {logit}")))
        }
    }

    fn threshold(&self) -> f64 {
        self.threshold
    }
}

/// Shared, read-only model, loaded on first use
pub struct ModelHandle {
    path: PathBuf,
    model: OnceCell<Box<dyn RiskClassifier>>,
}

impl ModelHandle {
    pub fn lazy(path: PathBuf) -> Self {
        Self {
            path,
            model: OnceCell::new(),
        }
    }

    pub fn preloaded(model: Box<dyn RiskClassifier>) -> Self {
        Self {
            path: PathBuf::new(),
            model: OnceCell::with_value(model),
        }
    }

    /// A failed load is not cached, the next call retries it
    pub fn get(&self) -> Result<&dyn RiskClassifier, UpstreamError> {
        self.model
            .get_or_try_init(|| {
                LogisticModel::load(&self.path).map(|m| Box::new(m) as Box<dyn RiskClassifier>)
            })
            .map(|model| &**model)
    }
}
