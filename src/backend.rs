//! HTTP layer: routes, authentication extractors, request and response bodies

pub mod handlers_auth;
pub mod handlers_unauth;
mod middlewares;
mod models;
pub mod router;

use std::sync::Arc;

use crate::chatbot::Chatbot;
use crate::services::Service;

/// Everything a handler can reach
pub struct AppState {
    pub service: Service,
    pub chatbot: Chatbot,
}

pub type SharedState = Arc<AppState>;
