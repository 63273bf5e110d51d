//! Password hashing, strength checks and credential token minting

use argon2::{
    password_hash::{rand_core::OsRng, PasswordHashString, PasswordVerifier, SaltString},
    Argon2, PasswordHasher,
};
use derive_more::derive::Display;
use rand_core::RngCore;
use serde::{Deserialize, Serialize};
use std::{str::FromStr, sync::LazyLock};
use zxcvbn::{zxcvbn, Score};

use crate::utils::validation::{MAX_PASSWORD_LENGTH, MIN_PASSWORD_LENGTH};

static DEFAULT_HASHER: LazyLock<Argon2<'static>> = LazyLock::new(Argon2::default);

/// Hash of an empty password, verified against when the account does not
/// exist so that unknown usernames take as long as wrong passwords
static EMPTY_HASH: LazyLock<Option<PWHash>> = LazyLock::new(|| hash("").ok());

static MIN_SCORE: Score = Score::Three;

/// Raw bytes in a credential token, hex encoded on the wire
const TOKEN_BYTES: usize = 20;

/// A hashed password in PHC string format
#[derive(Clone, Debug, Display)]
pub struct PWHash(PasswordHashString);

impl PartialEq for PWHash {
    fn eq(&self, other: &Self) -> bool {
        self.0.as_str() == other.0.as_str()
    }
}

impl Eq for PWHash {}

impl std::hash::Hash for PWHash {
    fn hash<H: std::hash::Hasher>(&self, state: &mut H) {
        self.0.as_str().hash(state)
    }
}

impl Serialize for PWHash {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        self.0.as_str().serialize(serializer)
    }
}

impl<'de> Deserialize<'de> for PWHash {
    fn deserialize<D: serde::Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        let hash = PasswordHashString::from_str(&s)
            .map_err(|_| <D::Error as serde::de::Error>::custom("Invalid PHC string"))?;
        Ok(PWHash(hash))
    }
}

/// Hashes a cleartext password with Argon2id and a random salt
pub fn hash(password: &str) -> Result<PWHash, argon2::password_hash::Error> {
    let salt = SaltString::generate(&mut OsRng);

    let hash = DEFAULT_HASHER
        .hash_password(password.as_bytes(), &salt)?
        .serialize();

    Ok(PWHash(hash))
}

/// Checks a password against the stored hash.
///
/// When no hash is provided the password is still checked against a dummy
/// hash, so the response time does not reveal whether the account exists.
pub fn verify(password: &str, maybe_hash: Option<&PWHash>) -> bool {
    let Some(hash) = maybe_hash.or(EMPTY_HASH.as_ref()) else {
        return false;
    };

    let verified = DEFAULT_HASHER
        .verify_password(password.as_bytes(), &hash.0.password_hash())
        .is_ok();

    verified && maybe_hash.is_some()
}

/// Checks that a new password is strong enough for the given username.
/// The error carries a message suitable for the client.
pub fn password_strength(password: &str, username: &str) -> Result<(), String> {
    if password.eq_ignore_ascii_case(username) {
        return Err("The password is too similar to the username.".to_string());
    }

    if password.len() <= MIN_PASSWORD_LENGTH || password.len() >= MAX_PASSWORD_LENGTH {
        return Err(format!(
            "The password must be between {} and {} characters long.",
            MIN_PASSWORD_LENGTH + 1,
            MAX_PASSWORD_LENGTH - 1
        ));
    }

    let estimate = zxcvbn(password, &[username]);
    if estimate.score() >= MIN_SCORE {
        return Ok(());
    }

    let mut message = String::from("This password is too easy to guess.");
    if let Some(warning) = estimate.feedback().and_then(|feedback| feedback.warning()) {
        message.push(' ');
        message.push_str(&warning.to_string());
    }
    Err(message)
}

/// Mints a fresh opaque credential token (40 hex characters)
pub fn generate_token() -> String {
    let mut bytes = [0u8; TOKEN_BYTES];
    OsRng.fill_bytes(&mut bytes);
    bytes.iter().map(|b| format!("{b:02x}")).collect()
}
