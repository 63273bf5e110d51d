//! Registration, login and logout

use log::{info, warn};
use serde::Deserialize;

use super::{LoginError, Service, ServiceError};
use crate::models::{Account, AccountView, DoctorProfile, PatientProfile, Role};
use crate::utils::password_utils::{hash, password_strength, verify};
use crate::utils::validation::{EmailInput, Username};

/// Sign-up form, shared by both roles. Fields are optional so a missing one
/// is reported by name instead of as a malformed body.
#[derive(Debug, Default, Deserialize)]
pub struct SignUp {
    pub username: Option<String>,
    pub email: Option<String>,
    pub password: Option<String>,
    pub password2: Option<String>,
}

#[derive(Debug)]
pub struct Registered {
    pub account: AccountView,
    pub token: String,
}

#[derive(Debug)]
pub struct LoginOutcome {
    pub token: String,
    pub account: AccountView,
}

impl Service {
    /// Creates an account with the given role, its empty role profile and
    /// its credential token, all in one transaction.
    pub async fn register(&self, role: Role, form: SignUp) -> Result<Registered, ServiceError> {
        let raw_username = form.username.ok_or_else(|| ServiceError::required("username"))?;
        let raw_email = form.email.ok_or_else(|| ServiceError::required("email"))?;
        let password = form.password.ok_or_else(|| ServiceError::required("password"))?;
        let password2 = form.password2.ok_or_else(|| ServiceError::required("password2"))?;

        let username = Username::try_from(raw_username).map_err(|_| {
            ServiceError::Validation(
                "username: Enter a valid username. It must start with a letter and contain 3 to 150 letters, digits or _.@+- characters.".into(),
            )
        })?;
        let email = EmailInput::new(&raw_email)
            .map_err(|e| ServiceError::Validation(format!("email: {e}")))?;

        // Checked on the cleartext, before any hashing
        if password != password2 {
            return Err(ServiceError::Validation("password: Passwords must match.".into()));
        }
        password_strength(&password, username.as_ref())
            .map_err(|e| ServiceError::Validation(format!("password: {e}")))?;

        let password = hash(&password).map_err(|_| ServiceError::Hashing)?;

        let registered = self
            .store
            .transaction(|db| {
                if db.lookup_username(username.as_ref()).is_some() {
                    return Err(ServiceError::Validation(
                        "username: A user with that username already exists.".into(),
                    ));
                }
                // Login accepts either, so neither may name another account
                if db.lookup_email(&username.as_ref().to_lowercase()).is_some() {
                    return Err(ServiceError::Validation(
                        "username: This username is already in use as an email address.".into(),
                    ));
                }
                if db.lookup_email(email.as_str()).is_some()
                    || db.lookup_username(email.as_str()).is_some()
                {
                    return Err(ServiceError::Validation(
                        "email: This email is already in use.".into(),
                    ));
                }

                let mut account = Account::new(username, email, password);
                match role {
                    Role::Doctor => {
                        db.store_doctor(account.id, DoctorProfile::default());
                        account.is_doctor = true;
                    }
                    Role::Patient => {
                        db.store_patient(account.id, PatientProfile::default());
                        account.is_patient = true;
                    }
                }

                let token = db.issue_token(account.id);
                let view = account.view();
                db.store_account(account);

                Ok(Registered {
                    account: view,
                    token,
                })
            })
            .await?;

        info!(
            "Account created for {} with role {}",
            registered.account.username, role
        );
        Ok(registered)
    }

    /// Checks the credentials and returns the account's token, minting one
    /// if the account logged out since.
    pub async fn login(&self, identifier: &str, password: &str) -> Result<LoginOutcome, ServiceError> {
        let identifier = identifier.trim();
        let candidates: Vec<Account> = {
            let db = self.store.read().await;
            let by_name = db.lookup_username(identifier);
            let by_email = db
                .lookup_email(&identifier.to_lowercase())
                .filter(|a| by_name.map_or(true, |b| b.id != a.id));
            by_name.into_iter().chain(by_email).cloned().collect()
        };

        // An identifier can match one account by username and another by email
        let account = if candidates.is_empty() {
            verify(password, None);
            None
        } else {
            candidates
                .into_iter()
                .find(|a| verify(password, Some(&a.password)))
        };

        let Some(account) = account else {
            warn!("Failed login attempt for {identifier}");
            return Err(LoginError::InvalidCredentials.into());
        };
        if !account.is_active {
            return Err(LoginError::InvalidCredentials.into());
        }

        let existing = self
            .store
            .read()
            .await
            .token_of(account.id)
            .map(str::to_string);
        let token = match existing {
            Some(token) => token,
            None => {
                self.store
                    .transaction(|db| Ok::<_, ServiceError>(db.issue_token(account.id)))
                    .await?
            }
        };

        info!("{} logged in", account.username);
        Ok(LoginOutcome {
            token,
            account: account.view(),
        })
    }

    /// Revokes the presented token
    pub async fn logout(&self, account: &Account, token: &str) -> Result<(), ServiceError> {
        self.store
            .transaction(|db| {
                db.revoke_token(token);
                Ok::<_, ServiceError>(())
            })
            .await?;

        info!("{} logged out", account.username);
        Ok(())
    }

    pub fn is_patient(&self, account: &Account) -> bool {
        account.is_patient
    }
}
