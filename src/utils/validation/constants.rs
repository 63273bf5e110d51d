//! Constants used throughout the validation system

/// Maximum length for long-form content (backgrounds, allergies, medications)
pub const MAX_CONTENT_LENGTH: usize = 2_000;
/// Maximum length for an email address
pub const MAX_EMAIL_LENGTH: usize = 254;
/// Maximum length for names, specialities and relationship labels
pub const MAX_NAME_LENGTH: usize = 50;
/// Maximum length for a hospital name
pub const MAX_HOSPITAL_LENGTH: usize = 100;
/// Maximum length for the gender field
pub const MAX_GENDER_LENGTH: usize = 10;
/// Maximum length for a phone number
pub const MAX_PHONE_LENGTH: usize = 20;
/// Password length bounds, both exclusive
pub const MIN_PASSWORD_LENGTH: usize = 8;
pub const MAX_PASSWORD_LENGTH: usize = 64;
