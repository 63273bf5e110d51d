//! REST clients for Google Translate v2 and the Gemini `generateContent` API

use std::time::Duration;

use async_trait::async_trait;
use log::error;
use reqwest::{Client, Response};
use serde::Deserialize;
use serde_json::json;
use url::Url;

use super::{TextGenerator, Translator};
use crate::upstream::UpstreamError;

const TRANSLATE: &str = "Translation API";
const GENERATE: &str = "Generation API";

fn http_client(timeout: Duration) -> Result<Client, reqwest::Error> {
    Client::builder().timeout(timeout).build()
}

/// Non-2xx answers are turned into an error carrying the upstream body
async fn check_status(service: &'static str, response: Response) -> Result<Response, UpstreamError> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }

    let body = response.text().await.unwrap_or_default();
    error!("{service} answered {status}: {body}");
    Err(UpstreamError::Status {
        service,
        status: status.as_u16(),
        body,
    })
}

pub struct GoogleTranslator {
    client: Client,
    endpoint: Url,
    api_key: String,
}

#[derive(Deserialize)]
struct TranslateResponse {
    data: TranslateData,
}

#[derive(Deserialize)]
struct TranslateData {
    translations: Vec<Translation>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct Translation {
    translated_text: String,
}

impl GoogleTranslator {
    pub fn new(endpoint: Url, api_key: String, timeout: Duration) -> Result<Self, reqwest::Error> {
        Ok(Self {
            client: http_client(timeout)?,
            endpoint,
            api_key,
        })
    }
}

#[async_trait]
impl Translator for GoogleTranslator {
    async fn translate(&self, text: &str, source: &str, target: &str) -> Result<String, UpstreamError> {
        let response = self
            .client
            .post(self.endpoint.clone())
            .query(&[("key", self.api_key.as_str())])
            .json(&json!({
                "q": text,
                "source": source,
                "target": target,
                "format": "text",
            }))
            .send()
            .await
            .map_err(|source| UpstreamError::Transport {
                service: TRANSLATE,
                source,
            })?;

        let body: TranslateResponse = check_status(TRANSLATE, response)
            .await?
            .json()
            .await
            .map_err(|_| UpstreamError::Payload { service: TRANSLATE })?;

        body.data
            .translations
            .into_iter()
            .next()
            .map(|t| t.translated_text)
            .ok_or(UpstreamError::Payload { service: TRANSLATE })
    }
}

pub struct GeminiGenerator {
    client: Client,
    endpoint: Url,
    api_key: String,
}

#[derive(Deserialize)]
struct GenerateResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
}

#[derive(Deserialize)]
struct Candidate {
    content: Content,
}

#[derive(Deserialize)]
struct Content {
    #[serde(default)]
    parts: Vec<Part>,
}

#[derive(Deserialize)]
struct Part {
    #[serde(default)]
    text: String,
}

impl GeminiGenerator {
    /// `base` is the API root, e.g. `https://generativelanguage.googleapis.com/v1beta/`
    pub fn new(base: &Url, model: &str, api_key: String, timeout: Duration) -> anyhow::Result<Self> {
        let endpoint = base.join(&format!("models/{model}:generateContent"))?;
        Ok(Self {
            client: http_client(timeout)?,
            endpoint,
            api_key,
        })
    }
}

#[async_trait]
impl TextGenerator for GeminiGenerator {
    async fn generate(&self, prompt: &str) -> Result<String, UpstreamError> {
        let response = self
            .client
            .post(self.endpoint.clone())
            .query(&[("key", self.api_key.as_str())])
            .json(&json!({ "contents": [{ "parts": [{ "text": prompt }] }] }))
            .send()
            .await
            .map_err(|source| UpstreamError::Transport {
                service: GENERATE,
                source,
            })?;

        let body: GenerateResponse = check_status(GENERATE, response)
            .await?
            .json()
            .await
            .map_err(|_| UpstreamError::Payload { service: GENERATE })?;

        let text: String = body
            .candidates
            .into_iter()
            .next()
            .map(|c| c.content.parts.into_iter().map(|p| p.text).collect())
            .ok_or(UpstreamError::Payload { service: GENERATE })?;

        Ok(text)
    }
}
