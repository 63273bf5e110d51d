//! Represents a validated email address.
//!
//! This module provides a type-safe wrapper around email addresses that ensures
//! they meet standard email format requirements. It uses the validator crate
//! to perform validation according to HTML5 email specifications.

use anyhow::{bail, Result};
use serde::{Deserialize, Serialize};
use std::fmt;
use validator::ValidateEmail;

use crate::utils::validation::MAX_EMAIL_LENGTH;

/// A validated email address that is guaranteed to meet format requirements.
/// Accounts store it normalized, so two spellings differing only in case
/// collide on the uniqueness check.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct EmailInput {
    // The validated and normalized email address
    email: String,
}

impl EmailInput {
    /// Creates a new `EmailInput` after validating the provided email string.
    ///
    /// The email address is trimmed of whitespace, validated against HTML5
    /// email format requirements and lowercased.
    ///
    /// # Returns
    /// * `Ok(EmailInput)` if the email is valid
    /// * `Err` with a descriptive message if validation fails
    pub fn new(email: &str) -> Result<Self> {
        let email_trimmed = email.trim();

        if email_trimmed.is_empty() {
            bail!("Email address cannot be empty");
        }

        if email_trimmed.len() > MAX_EMAIL_LENGTH {
            bail!("Email address exceeds maximum length of {MAX_EMAIL_LENGTH} characters");
        }

        if !email_trimmed.validate_email() {
            bail!("Enter a valid email address");
        }

        Ok(Self {
            email: email_trimmed.to_lowercase(),
        })
    }

    /// Returns a string slice of the validated email address
    pub fn as_str(&self) -> &str {
        &self.email
    }
}

impl fmt::Display for EmailInput {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.email)
    }
}

impl AsRef<str> for EmailInput {
    fn as_ref(&self) -> &str {
        &self.email
    }
}
