//! Maps every service failure onto a status code and a `{"error": ...}` body

use axum::extract::rejection::JsonRejection;
use axum::response::{IntoResponse, Response};
use axum::Json;
use http::StatusCode;
use log::error;
use serde_json::json;

use crate::services::ServiceError;

pub const INVALID_BODY: &str = "Malformed request body";

pub const INTERNAL_ERROR: &str = "Internal server error";

impl ServiceError {
    pub fn status(&self) -> StatusCode {
        match self {
            ServiceError::Validation(_) => StatusCode::BAD_REQUEST,
            ServiceError::Login(_) => StatusCode::BAD_REQUEST,
            ServiceError::Unauthenticated => StatusCode::UNAUTHORIZED,
            ServiceError::AccessDenied(_) => StatusCode::FORBIDDEN,
            ServiceError::NotFound(_) => StatusCode::NOT_FOUND,
            ServiceError::Upstream(_) => StatusCode::INTERNAL_SERVER_ERROR,
            ServiceError::Store(_) | ServiceError::Hashing => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for ServiceError {
    fn into_response(self) -> Response {
        let status = self.status();

        // Upstream text is passed through, local internals are not
        let message = match &self {
            ServiceError::Store(_) | ServiceError::Hashing => {
                error!("{self}");
                INTERNAL_ERROR.to_string()
            }
            other => other.to_string(),
        };

        (status, Json(json!({ "error": message }))).into_response()
    }
}

impl From<JsonRejection> for ServiceError {
    fn from(rejection: JsonRejection) -> Self {
        ServiceError::Validation(format!("{INVALID_BODY}: {}", rejection.body_text()))
    }
}
