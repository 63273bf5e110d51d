//! Heart-disease risk score: profile mapping plus a pre-trained classifier

mod classifier;
mod features;

pub use classifier::{LogisticModel, ModelHandle, RiskClassifier};
pub use features::{FeatureVector, MissingInput, FEATURE_NAMES};

use serde::Serialize;

use crate::config::PredictionMode;
use crate::upstream::UpstreamError;

#[cfg(test)]
pub(crate) use features::tests::complete_profile;

/// What the classifier answers, depending on the configured mode
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub enum RiskPrediction {
    #[serde(rename = "prediction")]
    Class(u8),
    #[serde(rename = "probability")]
    Probability(f64),
}

pub struct RiskScorer {
    model: ModelHandle,
    mode: PredictionMode,
}

impl RiskScorer {
    pub fn new(model: ModelHandle, mode: PredictionMode) -> Self {
        Self { model, mode }
    }

    /// Loads the model ahead of the first request. On failure the load is
    /// retried by the next [`RiskScorer::score`].
    pub fn warm_up(&self) -> Result<(), UpstreamError> {
        self.model.get().map(|_| ())
    }

    pub fn score(&self, features: &FeatureVector) -> Result<RiskPrediction, UpstreamError> {
        let model = self.model.get()?;
        match self.mode {
            PredictionMode::Class => model.predict(features).map(RiskPrediction::Class),
            PredictionMode::Probability => {
                model.probability(features).map(RiskPrediction::Probability)
            }
        }
    }
}
