//! Routes behind a token. The extractor in each signature does the role check.

use axum::extract::State;
use axum::Json;
use http::StatusCode;
use serde_json::{Map, Value};

use super::middlewares::{AuthUser, DoctorUser, PatientUser};
use super::models::{
    AddDoctorRequest, AddPatientRequest, ApiJson, ChatRequest, ChatResponse, DoctorUpdated,
    IsPatientResponse, PatientUpdated,
};
use super::SharedState;
use crate::models::{DoctorView, EmergencyContact, PatientView, RoleProfile};
use crate::risk::RiskPrediction;
use crate::services::{ContactForm, LinkOutcome, ServiceError};

pub async fn logout(
    State(state): State<SharedState>,
    user: AuthUser,
) -> Result<StatusCode, ServiceError> {
    state.service.logout(&user.account, &user.token).await?;
    Ok(StatusCode::OK)
}

pub async fn doctor_dashboard(
    State(state): State<SharedState>,
    DoctorUser(doctor): DoctorUser,
) -> Result<Json<RoleProfile>, ServiceError> {
    Ok(Json(state.service.my_profile(&doctor).await?))
}

pub async fn patient_dashboard(
    State(state): State<SharedState>,
    PatientUser(patient): PatientUser,
) -> Result<Json<RoleProfile>, ServiceError> {
    Ok(Json(state.service.my_profile(&patient).await?))
}

pub async fn add_doctor(
    State(state): State<SharedState>,
    PatientUser(patient): PatientUser,
    ApiJson(request): ApiJson<AddDoctorRequest>,
) -> Result<Json<LinkOutcome>, ServiceError> {
    let username = request
        .doctor_username
        .ok_or_else(|| ServiceError::required("doctor_username"))?;
    Ok(Json(state.service.link_doctor_to_patient(&patient, &username).await?))
}

pub async fn add_patient(
    State(state): State<SharedState>,
    DoctorUser(doctor): DoctorUser,
    ApiJson(request): ApiJson<AddPatientRequest>,
) -> Result<Json<LinkOutcome>, ServiceError> {
    let username = request
        .patient_username
        .ok_or_else(|| ServiceError::required("patient_username"))?;
    Ok(Json(state.service.link_patient_to_doctor(&doctor, &username).await?))
}

pub async fn list_doctors(
    State(state): State<SharedState>,
    PatientUser(patient): PatientUser,
) -> Result<Json<Vec<DoctorView>>, ServiceError> {
    Ok(Json(state.service.list_my_doctors(&patient).await?))
}

pub async fn list_patients(
    State(state): State<SharedState>,
    DoctorUser(doctor): DoctorUser,
) -> Result<Json<Vec<PatientView>>, ServiceError> {
    Ok(Json(state.service.list_my_patients(&doctor).await?))
}

pub async fn list_all_patients(
    State(state): State<SharedState>,
    DoctorUser(doctor): DoctorUser,
) -> Result<Json<Vec<PatientView>>, ServiceError> {
    Ok(Json(state.service.list_all_patients(&doctor).await?))
}

pub async fn update_doctor(
    State(state): State<SharedState>,
    DoctorUser(doctor): DoctorUser,
    ApiJson(fields): ApiJson<Map<String, Value>>,
) -> Result<Json<DoctorUpdated>, ServiceError> {
    let details = state.service.update_doctor(&doctor, &fields).await?;

    Ok(Json(DoctorUpdated {
        message: format!("Doctor '{}' updated successfully.", details.user.username),
        doctor_id: details.user.id,
        details,
    }))
}

pub async fn update_patient(
    State(state): State<SharedState>,
    PatientUser(patient): PatientUser,
    ApiJson(fields): ApiJson<Map<String, Value>>,
) -> Result<Json<PatientUpdated>, ServiceError> {
    let details = state.service.update_patient(&patient, &fields).await?;

    Ok(Json(PatientUpdated {
        message: format!("Patient '{}' updated successfully.", details.user.username),
        patient_id: details.user.id,
        details,
    }))
}

pub async fn create_emergency_contact(
    State(state): State<SharedState>,
    PatientUser(patient): PatientUser,
    ApiJson(form): ApiJson<ContactForm>,
) -> Result<Json<EmergencyContact>, ServiceError> {
    Ok(Json(state.service.create_emergency_contact(&patient, form).await?))
}

pub async fn update_emergency_contact(
    State(state): State<SharedState>,
    PatientUser(patient): PatientUser,
    ApiJson(form): ApiJson<ContactForm>,
) -> Result<Json<EmergencyContact>, ServiceError> {
    Ok(Json(state.service.update_emergency_contact(&patient, form).await?))
}

pub async fn is_patient(
    State(state): State<SharedState>,
    user: AuthUser,
) -> Json<IsPatientResponse> {
    Json(IsPatientResponse {
        is_patient: state.service.is_patient(&user.account),
    })
}

pub async fn predict_heart_disease(
    State(state): State<SharedState>,
    PatientUser(patient): PatientUser,
) -> Result<Json<RiskPrediction>, ServiceError> {
    Ok(Json(state.service.predict_heart_disease(&patient).await?))
}

pub async fn chatbot(
    State(state): State<SharedState>,
    _user: AuthUser,
    ApiJson(request): ApiJson<ChatRequest>,
) -> Result<Json<ChatResponse>, ServiceError> {
    let message = request.message.ok_or_else(|| ServiceError::required("message"))?;
    let response = state.chatbot.respond(&message).await?;
    Ok(Json(ChatResponse { response }))
}
