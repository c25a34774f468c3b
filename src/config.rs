//! Runtime configuration loaded from the environment
//!
//! `main` calls `dotenvy::dotenv()` first, so a `.env` file in the working
//! directory is honoured.

use std::env;

use thiserror::Error;

use crate::allocator::{RandomAllocator, DEFAULT_CODE_LENGTH};
use crate::service::DEFAULT_MAX_ATTEMPTS;

/// `DATABASE_URL` value that selects the in-memory backend
pub const IN_MEMORY_DATABASE: &str = ":memory:";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("{key} is invalid: {reason}")]
    Invalid { key: &'static str, reason: String },
}

#[derive(Debug, Clone)]
pub struct Config {
    /// Port the HTTP server listens on
    pub port: u16,

    /// Path of the redb file, or `:memory:`
    pub database_url: String,

    /// Public prefix for short links, without a trailing slash
    /// (e.g. "https://sho.rt")
    pub base_url: String,

    /// Characters per generated code
    pub code_length: usize,

    /// Allocation attempts before a shorten request gives up
    pub max_attempts: u32,
}

impl Config {
    pub fn from_env() -> Result<Self, ConfigError> {
        let port = parse_var("PORT", 8080u16)?;
        let code_length = parse_var("CODE_LENGTH", DEFAULT_CODE_LENGTH)?;
        let max_attempts = parse_var("MAX_ATTEMPTS", DEFAULT_MAX_ATTEMPTS)?;

        // validated here so a bad value fails at startup
        RandomAllocator::new(code_length)?;

        if max_attempts == 0 {
            return Err(ConfigError::Invalid {
                key: "MAX_ATTEMPTS",
                reason: "must be at least 1".to_string(),
            });
        }

        let base_url = env::var("BASE_URL")
            .unwrap_or_else(|_| format!("http://localhost:{port}"))
            .trim_end_matches('/')
            .to_owned();

        Ok(Self {
            port,
            database_url: env::var("DATABASE_URL").unwrap_or_else(|_| "data.db".to_string()),
            base_url,
            code_length,
            max_attempts,
        })
    }

    pub fn is_in_memory(&self) -> bool {
        self.database_url == IN_MEMORY_DATABASE
    }
}

fn parse_var<T>(key: &'static str, default: T) -> Result<T, ConfigError>
where
    T: std::str::FromStr,
    T::Err: std::fmt::Display,
{
    match env::var(key) {
        Ok(raw) => raw.trim().parse().map_err(|e: T::Err| ConfigError::Invalid {
            key,
            reason: format!("'{raw}': {e}"),
        }),
        Err(_) => Ok(default),
    }
}
