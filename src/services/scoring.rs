use log::{error, info};

use super::{Service, ServiceError};
use crate::models::Account;
use crate::risk::{FeatureVector, RiskPrediction};

impl Service {
    /// Scores the caller's own clinical answers
    pub async fn predict_heart_disease(&self, patient: &Account) -> Result<RiskPrediction, ServiceError> {
        let features = {
            let db = self.store.read().await;
            let profile = db
                .patient(patient.id)
                .ok_or_else(|| ServiceError::NotFound("Patient profile not found.".into()))?;
            FeatureVector::from_profile(profile)
                .map_err(|missing| ServiceError::Validation(missing.to_string()))?
        };

        let prediction = self.risk.score(&features).map_err(|e| {
            error!("Risk scoring failed: {e}");
            e
        })?;

        info!("Heart disease risk computed for {}", patient.username);
        Ok(prediction)
    }
}
