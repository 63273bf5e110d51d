//! Provides a validated free-text representation for profile fields.
//!
//! This module ensures that text content meets safety requirements by:
//! - Validating length constraints
//! - Checking for control characters
//! - Preventing HTML injection
//! - Normalizing whitespace and unicode

use ammonia::is_html;
use anyhow::{bail, Context, Result};
use std::fmt;
use unicode_normalization::UnicodeNormalization;
use validator::ValidateNonControlCharacter;

use crate::utils::validation::MAX_CONTENT_LENGTH;

/// Represents validated textual content that is guaranteed to be safe for use.
/// This type can only be constructed through validation.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct TextInput {
    // The validated and normalized text content
    text_content: String,
}

impl TextInput {
    /// Long-form content like a doctor's background or a medication list.
    pub fn new_long_form(content: &str) -> Result<Self> {
        Self::with_max_length(content, MAX_CONTENT_LENGTH)
            .context("Failed to create long-form content")
    }

    /// Performs the actual validation with a caller-chosen length cap,
    /// counted in characters.
    pub fn with_max_length(content: &str, max_length: usize) -> Result<Self> {
        let trimmed = content.trim();

        if trimmed.is_empty() {
            bail!("Content cannot be empty");
        }

        if trimmed.chars().count() > max_length {
            bail!("Ensure this field has no more than {} characters", max_length);
        }

        if !trimmed.validate_non_control_character() {
            // Line breaks are fine in long-form content
            let without_breaks: String = trimmed.chars().filter(|c| *c != '\n' && *c != '\r').collect();
            if !without_breaks.validate_non_control_character() {
                bail!("Content contains invalid control characters");
            }
        }

        if is_html(trimmed) {
            bail!("Content cannot contain HTML");
        }

        let normalized = trimmed.nfkc().collect::<String>();

        Ok(Self {
            text_content: normalized,
        })
    }

    /// Returns the validated content as a string slice
    pub fn as_str(&self) -> &str {
        &self.text_content
    }

    /// Consumes the wrapper and returns the owned content
    pub fn into_inner(self) -> String {
        self.text_content
    }
}

impl fmt::Display for TextInput {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.text_content)
    }
}

impl AsRef<str> for TextInput {
    fn as_ref(&self) -> &str {
        &self.text_content
    }
}
