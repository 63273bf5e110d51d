//! Request and response bodies

use axum::extract::FromRequest;
use serde::{Deserialize, Serialize};

use crate::models::{AccountId, AccountView, DoctorView, PatientView};
use crate::services::ServiceError;

/// `axum::Json` whose rejections use our error body
#[derive(FromRequest)]
#[from_request(via(axum::Json), rejection(ServiceError))]
pub struct ApiJson<T>(pub T);

#[derive(Deserialize)]
pub struct LoginRequest {
    pub username: Option<String>,
    pub password: Option<String>,
}

#[derive(Serialize)]
pub struct LoginResponse {
    pub token: String,
    pub user_id: AccountId,
    pub email: String,
    pub is_patient: bool,
    pub is_doctor: bool,
}

#[derive(Serialize)]
pub struct DoctorCreated {
    pub user: AccountView,
    pub token: String,
    pub message: &'static str,
}

#[derive(Serialize)]
pub struct PatientCreated {
    pub patient: AccountView,
    pub token: String,
    pub message: &'static str,
}

#[derive(Deserialize)]
pub struct AddDoctorRequest {
    pub doctor_username: Option<String>,
}

#[derive(Deserialize)]
pub struct AddPatientRequest {
    pub patient_username: Option<String>,
}

#[derive(Serialize)]
pub struct DoctorUpdated {
    pub message: String,
    pub doctor_id: AccountId,
    pub details: DoctorView,
}

#[derive(Serialize)]
pub struct PatientUpdated {
    pub message: String,
    pub patient_id: AccountId,
    pub details: PatientView,
}

#[derive(Serialize)]
pub struct IsPatientResponse {
    pub is_patient: bool,
}

#[derive(Deserialize)]
pub struct ChatRequest {
    pub message: Option<String>,
}

#[derive(Serialize)]
pub struct ChatResponse {
    pub response: String,
}
