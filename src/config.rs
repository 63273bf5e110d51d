//! Runtime settings.
//!
//! Each value comes from the environment if set, else from the YAML file
//! named by `PORTAL_CONFIG`, else from [`crate::consts`].

use std::{
    fs::File,
    io::ErrorKind,
    path::{Path, PathBuf},
    str::FromStr,
    time::Duration,
};

use anyhow::{anyhow, Context};
use dotenv::dotenv;
use log::info;
use serde::Deserialize;
use strum_macros::{Display, EnumString};
use url::Url;

use crate::consts;

/// How the risk score is reported
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, EnumString, Display)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase", ascii_case_insensitive)]
pub enum PredictionMode {
    Probability,
    Class,
}

#[derive(Debug, Clone)]
pub struct Settings {
    pub http_port: u16,
    pub db_path: PathBuf,
    pub model_path: PathBuf,
    pub prediction_mode: PredictionMode,
    pub chatbot: ChatbotSettings,
}

#[derive(Debug, Clone)]
pub struct ChatbotSettings {
    pub local_language: String,
    pub remote_language: String,
    pub translate_url: Url,
    pub translate_api_key: Option<String>,
    pub genai_url: Url,
    pub genai_model: String,
    pub genai_api_key: Option<String>,
    pub timeout: Duration,
}

/// Shape of the optional config file
#[derive(Debug, Default, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct FileSettings {
    http_port: Option<u16>,
    db_path: Option<PathBuf>,
    model_path: Option<PathBuf>,
    prediction_mode: Option<PredictionMode>,
    local_language: Option<String>,
    remote_language: Option<String>,
    translate_url: Option<Url>,
    translate_api_key: Option<String>,
    genai_url: Option<Url>,
    genai_model: Option<String>,
    genai_api_key: Option<String>,
    upstream_timeout_secs: Option<u64>,
}

impl FileSettings {
    fn read(path: &Path) -> anyhow::Result<Self> {
        match File::open(path) {
            Ok(f) => {
                info!("Reading settings from {}", path.display());
                serde_yaml::from_reader(f).with_context(|| format!("Invalid config file {}", path.display()))
            }
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(Self::default()),
            Err(e) => Err(e).with_context(|| format!("Cannot read {}", path.display())),
        }
    }
}

/// Parses an override, if the variable is set and not blank
fn env_override<T>(env: &impl Fn(&str) -> Option<String>, name: &str) -> anyhow::Result<Option<T>>
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    match env(name).filter(|v| !v.trim().is_empty()) {
        None => Ok(None),
        Some(raw) => raw
            .trim()
            .parse()
            .map(Some)
            .map_err(|e| anyhow!("{name}={raw}: {e}")),
    }
}

fn default_url(raw: &str) -> anyhow::Result<Url> {
    Url::parse(raw).with_context(|| format!("Invalid default URL {raw}"))
}

impl Settings {
    pub fn load() -> anyhow::Result<Self> {
        dotenv().ok();
        let env = |name: &str| std::env::var(name).ok();

        let path = env("PORTAL_CONFIG")
            .map(PathBuf::from)
            .unwrap_or_else(|| PathBuf::from(consts::CONFIG_PATH));

        Self::resolve(FileSettings::read(&path)?, env)
    }

    /// Layers `env`, then `file`, then the defaults
    pub fn resolve(file: FileSettings, env: impl Fn(&str) -> Option<String>) -> anyhow::Result<Self> {
        let timeout_secs = env_override(&env, "PORTAL_UPSTREAM_TIMEOUT_SECS")?
            .or(file.upstream_timeout_secs)
            .unwrap_or(consts::UPSTREAM_TIMEOUT_SECS);

        let translate_url = match file.translate_url {
            Some(url) => url,
            None => default_url(consts::TRANSLATE_URL)?,
        };
        let genai_url = match file.genai_url {
            Some(url) => url,
            None => default_url(consts::GENAI_URL)?,
        };

        Ok(Self {
            http_port: env_override(&env, "PORTAL_HTTP_PORT")?
                .or(file.http_port)
                .unwrap_or(consts::HTTP_PORT),
            db_path: env_override(&env, "PORTAL_DB_PATH")?
                .or(file.db_path)
                .unwrap_or_else(|| PathBuf::from(consts::DB_PATH)),
            model_path: env_override(&env, "PORTAL_MODEL_PATH")?
                .or(file.model_path)
                .unwrap_or_else(|| PathBuf::from(consts::MODEL_PATH)),
            prediction_mode: env_override(&env, "PORTAL_PREDICTION_MODE")?
                .or(file.prediction_mode)
                .unwrap_or(PredictionMode::Probability),
            chatbot: ChatbotSettings {
                local_language: file
                    .local_language
                    .unwrap_or_else(|| consts::LOCAL_LANGUAGE.to_string()),
                remote_language: file
                    .remote_language
                    .unwrap_or_else(|| consts::REMOTE_LANGUAGE.to_string()),
                translate_url,
                translate_api_key: env_override(&env, "TRANSLATE_API_KEY")?
                    .or(file.translate_api_key),
                genai_url,
                genai_model: env_override(&env, "GENAI_MODEL")?
                    .or(file.genai_model)
                    .unwrap_or_else(|| consts::GENAI_MODEL.to_string()),
                genai_api_key: env_override(&env, "GENAI_API_KEY")?.or(file.genai_api_key),
                timeout: Duration::from_secs(timeout_secs),
            },
        })
    }
}
