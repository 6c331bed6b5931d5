//! Process configuration.
//!
//! Credentials and endpoint overrides come from the environment (a `.env`
//! file is honoured). The config is built once at startup and passed into
//! components; a missing required key is fatal before any request is served.

use std::env;

use crate::error::{MnemoError, Result};

pub const GEMINI_API_KEY: &str = "GEMINI_API_KEY";
pub const WEATHER_API_KEY: &str = "WEATHER_API_KEY";
pub const MEM0_API_KEY: &str = "MEM0_API_KEY";

const DEFAULT_GEMINI_MODEL: &str = "gemini-2.5-flash-lite";

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub gemini_api_key: String,
    pub weather_api_key: String,
    pub mem0_api_key: String,
    pub gemini_model: String,
    pub gemini_endpoint: Option<String>,
    pub weather_endpoint: Option<String>,
    pub mem0_endpoint: Option<String>,
}

impl AppConfig {
    pub fn from_env() -> Result<Self> {
        let _ = dotenvy::dotenv();
        Self::from_lookup(|key| env::var(key).ok())
    }

    fn from_lookup(get: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let required = |key: &str| -> Result<String> {
            get(key)
                .filter(|value| !value.is_empty())
                .ok_or_else(|| MnemoError::Configuration(key.to_string()))
        };

        Ok(Self {
            gemini_api_key: required(GEMINI_API_KEY)?,
            weather_api_key: required(WEATHER_API_KEY)?,
            mem0_api_key: required(MEM0_API_KEY)?,
            gemini_model: get("MNEMO_GEMINI_MODEL")
                .unwrap_or_else(|| DEFAULT_GEMINI_MODEL.to_string()),
            gemini_endpoint: get("MNEMO_GEMINI_ENDPOINT"),
            weather_endpoint: get("MNEMO_WEATHER_ENDPOINT"),
            mem0_endpoint: get("MNEMO_MEM0_ENDPOINT"),
        })
    }
}
