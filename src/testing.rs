//! Shared fixtures and stand-ins for the external collaborators

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use async_trait::async_trait;

use crate::authorization::Enforcer;
use crate::chatbot::{Chatbot, TextGenerator, Translator};
use crate::config::PredictionMode;
use crate::db::Store;
use crate::models::{Account, Role};
use crate::risk::{FeatureVector, ModelHandle, RiskClassifier, RiskScorer};
use crate::services::{Registered, Service, SignUp};
use crate::upstream::UpstreamError;

pub const PASSWORD: &str = "Qz7!vLm2#Rk9pW";
pub const STUB_PROBABILITY: f64 = 0.125;

pub struct StubClassifier;

impl RiskClassifier for StubClassifier {
    fn probability(&self, _: &FeatureVector) -> Result<f64, UpstreamError> {
        Ok(STUB_PROBABILITY)
    }
}

pub async fn service() -> Service {
    service_with(Store::in_memory()).await
}

pub async fn service_with(store: Store) -> Service {
    Service::new(
        Arc::new(store),
        Enforcer::load().await.expect("Error in loading Enforcer"),
        RiskScorer::new(
            ModelHandle::preloaded(Box::new(StubClassifier)),
            PredictionMode::Probability,
        ),
    )
}

/// Registers `name` with email `name@clinic.ro` and [`PASSWORD`]
pub async fn register(service: &Service, role: Role, name: &str) -> Registered {
    service
        .register(
            role,
            SignUp {
                username: Some(name.into()),
                email: Some(format!("{name}@clinic.ro")),
                password: Some(PASSWORD.into()),
                password2: Some(PASSWORD.into()),
            },
        )
        .await
        .expect("Registration failed")
}

/// The stored account behind a registration
pub async fn account(service: &Service, registered: &Registered) -> Account {
    service
        .authorize(Some(&registered.token), "fixture", &[])
        .await
        .expect("Token does not resolve")
}

/// Prefixes the text with `[source>target]`
pub struct TaggingTranslator {
    calls: Arc<AtomicUsize>,
}

impl TaggingTranslator {
    pub fn counting(calls: Arc<AtomicUsize>) -> Self {
        Self { calls }
    }
}

#[async_trait]
impl Translator for TaggingTranslator {
    async fn translate(&self, text: &str, source: &str, target: &str) -> Result<String, UpstreamError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        Ok(format!("[{source}>{target}]{text}"))
    }
}

/// Answers with the prompt itself
pub struct EchoGenerator {
    calls: Arc<AtomicUsize>,
}

impl EchoGenerator {
    pub fn counting(calls: Arc<AtomicUsize>) -> Self {
        Self { calls }
    }
}

#[async_trait]
impl TextGenerator for EchoGenerator {
    async fn generate(&self, prompt: &str) -> Result<String, UpstreamError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        Ok(prompt.to_string())
    }
}

pub struct FailingGenerator;

#[async_trait]
impl TextGenerator for FailingGenerator {
    async fn generate(&self, _: &str) -> Result<String, UpstreamError> {
        Err(UpstreamError::Status {
            service: "Generation API",
            status: 503,
            body: "model overloaded".into(),
        })
    }
}

pub fn echo_chatbot() -> Chatbot {
    let calls = Arc::new(AtomicUsize::new(0));
    Chatbot::new(
        Box::new(TaggingTranslator::counting(calls.clone())),
        Box::new(EchoGenerator::counting(calls)),
        "ro".into(),
        "en".into(),
    )
}
