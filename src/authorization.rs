//! Wrapper around Casbin for the role checks guarding each endpoint

use casbin::CoreApi;
use derive_more::Display;
use log::{error, info};
use serde::Serialize;
use serde_json::json;
use thiserror::Error;

use crate::models::Account;

const CONFIG: &str = "access_control/model.conf";
const POLICY: &str = "access_control/policy.csv";

/// A Casbin enforcer
pub struct Enforcer(casbin::Enforcer);

type CasbinResult = Result<(), AccessDenied>;

/// Access refused, without details
#[derive(Debug, Error)]
#[error("You do not have permission to perform this action.")]
pub struct AccessDenied;

/// A predicate the caller must satisfy. Several requirements on one
/// operation combine with AND.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Display)]
pub enum Requirement {
    #[display("authenticated")]
    Authenticated,
    #[display("doctor")]
    Doctor,
    #[display("patient")]
    Patient,
}

/// What Casbin sees of the caller. The password hash stays out of it,
/// since requests are logged.
#[derive(Debug, Serialize, Hash)]
struct Principal<'a> {
    id: String,
    username: &'a str,
    active: bool,
    is_doctor: bool,
    is_patient: bool,
}

impl<'a> From<&'a Account> for Principal<'a> {
    fn from(account: &'a Account) -> Self {
        Self {
            id: account.id.to_string(),
            username: account.username.as_ref(),
            active: account.is_active,
            is_doctor: account.is_doctor,
            is_patient: account.is_patient,
        }
    }
}

/// Binds an enforcer to the account making the request
pub struct Context<'ctx> {
    enforcer: &'ctx Enforcer,
    subject: Principal<'ctx>,
}

impl Enforcer {
    pub async fn load() -> Result<Self, casbin::Error> {
        let mut enforcer = casbin::Enforcer::new(CONFIG, POLICY).await?;
        enforcer.load_policy().await?;
        Ok(Enforcer(enforcer))
    }

    pub fn with_subject<'ctx>(&'ctx self, subject: &'ctx Account) -> Context<'ctx> {
        Context {
            enforcer: self,
            subject: Principal::from(subject),
        }
    }
}

impl Context<'_> {
    fn enforce(&self, operation: &str, requirement: Requirement) -> CasbinResult {
        let action = requirement.to_string();

        info!(
            "Enforcing {}",
            json!({ "sub": &self.subject, "obj": operation, "act": &action })
        );

        match self.enforcer.0.enforce((&self.subject, operation, action.as_str())) {
            Err(e) => {
                error!("Casbin error: {e:?}");
                Err(AccessDenied)
            }
            Ok(granted) => {
                info!("Granted: {granted}");
                if granted {
                    Ok(())
                } else {
                    Err(AccessDenied)
                }
            }
        }
    }

    /// Checks every requirement, stopping at the first refusal
    pub fn require_all(&self, operation: &str, requirements: &[Requirement]) -> CasbinResult {
        requirements
            .iter()
            .try_for_each(|requirement| self.enforce(operation, *requirement))
    }
}
