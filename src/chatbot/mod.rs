//! Chatbot proxy: translate the question, ask the generator, translate the
//! answer back and strip the markdown emphasis.

mod clients;

pub use clients::{GeminiGenerator, GoogleTranslator};

use async_trait::async_trait;
use log::{debug, warn};
use once_cell::sync::Lazy;
use regex::Regex;

use crate::services::ServiceError;
use crate::upstream::UpstreamError;

#[async_trait]
pub trait Translator: Send + Sync {
    async fn translate(&self, text: &str, source: &str, target: &str) -> Result<String, UpstreamError>;
}

#[async_trait]
pub trait TextGenerator: Send + Sync {
    async fn generate(&self, prompt: &str) -> Result<String, UpstreamError>;
}

static BOLD: Lazy<Regex> = Lazy::new(|| Regex::new(r"\*\*").expect("Invalid bold pattern"));
static ITALIC: Lazy<Regex> = Lazy::new(|| Regex::new(r"\*").expect("Invalid italic pattern"));

/// Emphasis markers become line breaks, doubled ones first
pub fn clean_response(text: &str) -> String {
    let text = BOLD.replace_all(text, "\n");
    ITALIC.replace_all(&text, "\n").into_owned()
}

pub struct Chatbot {
    translator: Box<dyn Translator>,
    generator: Box<dyn TextGenerator>,
    local_language: String,
    remote_language: String,
}

impl Chatbot {
    pub fn new(
        translator: Box<dyn Translator>,
        generator: Box<dyn TextGenerator>,
        local_language: String,
        remote_language: String,
    ) -> Self {
        Self {
            translator,
            generator,
            local_language,
            remote_language,
        }
    }

    pub async fn respond(&self, message: &str) -> Result<String, ServiceError> {
        let message = message.trim();
        if message.is_empty() {
            return Err(ServiceError::Validation("message: This field may not be blank.".into()));
        }

        let reply = self.pipeline(message).await.map_err(|e| {
            warn!("Chatbot upstream failure: {e}");
            e
        })?;

        Ok(clean_response(&reply))
    }

    async fn pipeline(&self, message: &str) -> Result<String, UpstreamError> {
        let prompt = self
            .translator
            .translate(message, &self.local_language, &self.remote_language)
            .await?;
        debug!("Prompt translated to {}", self.remote_language);

        let answer = self.generator.generate(&prompt).await?;

        self.translator
            .translate(&answer, &self.remote_language, &self.local_language)
            .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{EchoGenerator, FailingGenerator, TaggingTranslator};
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    fn chatbot(translator: TaggingTranslator, generator: Box<dyn TextGenerator>) -> Chatbot {
        Chatbot::new(Box::new(translator), generator, "ro".into(), "en".into())
    }

    #[test]
    fn test_clean_response() {
        let cases = [
            ("plain", "plain"),
            ("**Title** body", "\nTitle\n body"),
            ("* item", "\n item"),
            ("***", "\n\n"),
        ];
        for (input, expected) in cases {
            assert_eq!(clean_response(input), expected, "Wrong cleanup of {input:?}");
        }
    }

    #[tokio::test]
    async fn test_blank_message_never_reaches_upstream() {
        let calls = Arc::new(AtomicUsize::new(0));
        let bot = chatbot(
            TaggingTranslator::counting(calls.clone()),
            Box::new(EchoGenerator::counting(calls.clone())),
        );

        for message in ["", "   ", "\n\t"] {
            assert!(matches!(
                bot.respond(message).await,
                Err(ServiceError::Validation(_))
            ));
        }
        assert_eq!(calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_round_trip_through_both_languages() {
        let calls = Arc::new(AtomicUsize::new(0));
        let bot = chatbot(
            TaggingTranslator::counting(calls.clone()),
            Box::new(EchoGenerator::counting(calls.clone())),
        );

        let reply = bot.respond("Ce este **tensiunea**?").await.unwrap();
        assert_eq!(reply, "[en>ro][ro>en]Ce este \ntensiunea\n?");
        assert_eq!(calls.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn test_upstream_failure_is_surfaced() {
        let bot = chatbot(
            TaggingTranslator::counting(Arc::new(AtomicUsize::new(0))),
            Box::new(FailingGenerator),
        );

        match bot.respond("Salut").await {
            Err(ServiceError::Upstream(UpstreamError::Status { status, body, .. })) => {
                assert_eq!(status, 503);
                assert_eq!(body, "model overloaded");
            }
            other => panic!("Unexpected result {other:?}"),
        }
    }
}
