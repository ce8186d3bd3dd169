use std::env;

use crate::error::{AppError, AppResult};

pub const API_KEY_VAR: &str = "OPENAI_API_KEY";

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub api_key: String,
}

impl AppConfig {
    /// Reads the API credential from the environment. Everything else is
    /// flag-driven, so a missing or empty key is the only fatal setup input.
    pub fn load() -> AppResult<Self> {
        let api_key = env::var(API_KEY_VAR)
            .ok()
            .filter(|key| !key.trim().is_empty())
            .ok_or_else(|| AppError::Configuration(format!("{API_KEY_VAR} is not set")))?;

        Ok(Self { api_key })
    }
}
