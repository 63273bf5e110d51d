//! Portal operations, and single entry point for access control.
//!
//! Handlers never touch the store directly: they go through [`Service`],
//! which resolves the caller's token and checks the role requirements
//! before anything else runs.

mod accounts;
mod associations;
mod profiles;
mod scoring;

pub use accounts::{LoginOutcome, Registered, SignUp};
pub use associations::LinkOutcome;
pub use profiles::{ContactForm, FieldSetter, DOCTOR_FIELDS, PATIENT_FIELDS};

use std::sync::Arc;

use thiserror::Error;

use crate::authorization::{AccessDenied, Enforcer, Requirement};
use crate::db::{StoreError, Store};
use crate::models::Account;
use crate::risk::RiskScorer;
use crate::upstream::UpstreamError;

pub struct Service {
    store: Arc<Store>,
    enforcer: Enforcer,
    risk: RiskScorer,
}

#[derive(Debug, Error)]
pub enum ServiceError {
    #[error("{0}")]
    Validation(String),

    #[error(transparent)]
    Login(#[from] LoginError),

    #[error("Authentication credentials were not provided or are invalid.")]
    Unauthenticated,

    #[error(transparent)]
    AccessDenied(#[from] AccessDenied),

    #[error("{0}")]
    NotFound(String),

    #[error(transparent)]
    Upstream(#[from] UpstreamError),

    #[error(transparent)]
    Store(#[from] StoreError),

    #[error("Could not hash the password")]
    Hashing,
}

#[derive(Debug, Error)]
pub enum LoginError {
    #[error("Unable to log in with provided credentials.")]
    InvalidCredentials,
}

impl ServiceError {
    pub(crate) fn required(field: &str) -> Self {
        ServiceError::Validation(format!("{field}: This field is required."))
    }
}

impl Service {
    pub fn new(store: Arc<Store>, enforcer: Enforcer, risk: RiskScorer) -> Self {
        Self {
            store,
            enforcer,
            risk,
        }
    }

    /// Resolves a presented token to its account and checks that the account
    /// satisfies every requirement of `operation`.
    pub async fn authorize(
        &self,
        token: Option<&str>,
        operation: &str,
        requirements: &[Requirement],
    ) -> Result<Account, ServiceError> {
        let token = token.ok_or(ServiceError::Unauthenticated)?;

        let account = self
            .store
            .read()
            .await
            .account_for_token(token)
            .cloned()
            .ok_or(ServiceError::Unauthenticated)?;

        self.enforcer
            .with_subject(&account)
            .require_all(operation, requirements)?;

        Ok(account)
    }
}
