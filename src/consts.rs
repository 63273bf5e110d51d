//! Defaults, used when neither the config file nor the environment set a value

pub const HTTP_PORT: u16 = 8080;
pub const CONFIG_PATH: &str = "./portal.yaml";
pub const DB_PATH: &str = "./data/portal.json";
pub const MODEL_PATH: &str = "./data/heart_disease_model.json";

pub const LOCAL_LANGUAGE: &str = "ro"; // Language users write in
pub const REMOTE_LANGUAGE: &str = "en"; // Language the generator is prompted in

pub const TRANSLATE_URL: &str = "https://translation.googleapis.com/language/translate/v2";
pub const GENAI_URL: &str = "https://generativelanguage.googleapis.com/v1beta/";
pub const GENAI_MODEL: &str = "gemini-pro";
pub const UPSTREAM_TIMEOUT_SECS: u64 = 30;
