//! Extractors resolving the caller's token and checking their role.
//! A handler taking one of them never runs for a caller who fails the check.

use axum::extract::FromRequestParts;
use axum::http::{header::AUTHORIZATION, request::Parts};

use super::SharedState;
use crate::authorization::Requirement;
use crate::models::Account;
use crate::services::ServiceError;

/// Any authenticated caller
pub struct AuthUser {
    pub account: Account,
    pub token: String,
}

/// An authenticated doctor
pub struct DoctorUser(pub Account);

/// An authenticated patient
pub struct PatientUser(pub Account);

/// Reads `Authorization: Token <key>` or `Authorization: Bearer <key>`
fn presented_token(parts: &Parts) -> Option<String> {
    let value = parts.headers.get(AUTHORIZATION)?.to_str().ok()?;
    let (scheme, token) = value.trim().split_once(' ')?;

    let token = token.trim();
    if (scheme.eq_ignore_ascii_case("token") || scheme.eq_ignore_ascii_case("bearer"))
        && !token.is_empty()
    {
        Some(token.to_string())
    } else {
        None
    }
}

async fn gate(
    parts: &Parts,
    state: &SharedState,
    requirements: &[Requirement],
) -> Result<AuthUser, ServiceError> {
    let token = presented_token(parts).ok_or(ServiceError::Unauthenticated)?;
    let account = state
        .service
        .authorize(Some(&token), parts.uri.path(), requirements)
        .await?;
    Ok(AuthUser { account, token })
}

#[async_trait::async_trait]
impl FromRequestParts<SharedState> for AuthUser {
    type Rejection = ServiceError;

    async fn from_request_parts(parts: &mut Parts, state: &SharedState) -> Result<Self, Self::Rejection> {
        gate(parts, state, &[Requirement::Authenticated]).await
    }
}

#[async_trait::async_trait]
impl FromRequestParts<SharedState> for DoctorUser {
    type Rejection = ServiceError;

    async fn from_request_parts(parts: &mut Parts, state: &SharedState) -> Result<Self, Self::Rejection> {
        let user = gate(parts, state, &[Requirement::Authenticated, Requirement::Doctor]).await?;
        Ok(DoctorUser(user.account))
    }
}

#[async_trait::async_trait]
impl FromRequestParts<SharedState> for PatientUser {
    type Rejection = ServiceError;

    async fn from_request_parts(parts: &mut Parts, state: &SharedState) -> Result<Self, Self::Rejection> {
        let user = gate(parts, state, &[Requirement::Authenticated, Requirement::Patient]).await?;
        Ok(PatientUser(user.account))
    }
}
