//! Routes reachable without a token: sign-up and login

use axum::extract::State;
use axum::Json;

use super::models::{ApiJson, DoctorCreated, LoginRequest, LoginResponse, PatientCreated};
use super::SharedState;
use crate::models::Role;
use crate::services::{ServiceError, SignUp};

pub async fn signup_doctor(
    State(state): State<SharedState>,
    ApiJson(form): ApiJson<SignUp>,
) -> Result<Json<DoctorCreated>, ServiceError> {
    let registered = state.service.register(Role::Doctor, form).await?;

    Ok(Json(DoctorCreated {
        user: registered.account,
        token: registered.token,
        message: "Doctor created successfully. Log in to get your token.",
    }))
}

pub async fn signup_patient(
    State(state): State<SharedState>,
    ApiJson(form): ApiJson<SignUp>,
) -> Result<Json<PatientCreated>, ServiceError> {
    let registered = state.service.register(Role::Patient, form).await?;

    Ok(Json(PatientCreated {
        patient: registered.account,
        token: registered.token,
        message: "Patient created successfully. Log in to get your token.",
    }))
}

/// Accepts a username or an email in the `username` field
pub async fn login(
    State(state): State<SharedState>,
    ApiJson(request): ApiJson<LoginRequest>,
) -> Result<Json<LoginResponse>, ServiceError> {
    let username = request.username.ok_or_else(|| ServiceError::required("username"))?;
    let password = request.password.ok_or_else(|| ServiceError::required("password"))?;

    let outcome = state.service.login(&username, &password).await?;

    Ok(Json(LoginResponse {
        token: outcome.token,
        user_id: outcome.account.id,
        email: outcome.account.email,
        is_patient: outcome.account.is_patient,
        is_doctor: outcome.account.is_doctor,
    }))
}
