use std::path::PathBuf;
use std::time::Duration;

use crate::error::CoreError;

pub const DEFAULT_DB_PATH: &str = "message_trail.db";
pub const DEFAULT_BUSY_TIMEOUT_MS: u64 = 5_000;

#[derive(Debug, Clone)]
pub struct StoreConfig {
    pub db_path: PathBuf,
    pub busy_timeout: Duration,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            db_path: PathBuf::from(DEFAULT_DB_PATH),
            busy_timeout: Duration::from_millis(DEFAULT_BUSY_TIMEOUT_MS),
        }
    }
}

impl StoreConfig {
    pub fn from_env() -> Result<Self, CoreError> {
        dotenvy::dotenv().ok(); // Load .env file if present

        let db_path = std::env::var("MESSAGE_TRAIL_DB_PATH")
            .unwrap_or_else(|_| DEFAULT_DB_PATH.to_string());
        let busy_timeout_ms = parse_millis(std::env::var("MESSAGE_TRAIL_BUSY_TIMEOUT_MS").ok())?;

        Ok(StoreConfig {
            db_path: PathBuf::from(db_path),
            busy_timeout: Duration::from_millis(busy_timeout_ms),
        })
    }
}

fn parse_millis(raw: Option<String>) -> Result<u64, CoreError> {
    match raw {
        None => Ok(DEFAULT_BUSY_TIMEOUT_MS),
        Some(value) => value
            .trim()
            .parse()
            .map_err(|e| CoreError::Config(format!("Invalid MESSAGE_TRAIL_BUSY_TIMEOUT_MS: {}", e))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_timeout_uses_default() {
        assert_eq!(parse_millis(None).expect("default"), DEFAULT_BUSY_TIMEOUT_MS);
    }

    #[test]
    fn timeout_is_trimmed_and_parsed() {
        assert_eq!(parse_millis(Some(" 250 ".to_string())).expect("parse"), 250);
    }

    #[test]
    fn garbage_timeout_is_config_error() {
        let err = parse_millis(Some("soon".to_string())).expect_err("should fail");
        assert!(matches!(err, CoreError::Config(_)));
    }
}
