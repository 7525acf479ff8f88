use std::env;
use std::path::PathBuf;
use std::time::Duration;

use crate::scheduler::{
    DEFAULT_BATCH_SIZE, DEFAULT_COOLDOWN, MAX_BATCH_SIZE, MAX_COOLDOWN, MIN_COOLDOWN,
};
use crate::store::default_db_path;

const DEFAULT_SOURCE_URL: &str = "http://127.0.0.1:8080";
const DEFAULT_HTTP_TIMEOUT_SECS: u64 = 60;

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub source_url: String,
    pub source_file: Option<PathBuf>,
    pub batch_size: usize,
    pub cooldown: Duration,
    pub http_timeout: Duration,
    pub db_path: Option<PathBuf>,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            source_url: DEFAULT_SOURCE_URL.to_string(),
            source_file: None,
            batch_size: DEFAULT_BATCH_SIZE,
            cooldown: DEFAULT_COOLDOWN,
            http_timeout: Duration::from_secs(DEFAULT_HTTP_TIMEOUT_SECS),
            db_path: default_db_path(),
        }
    }
}

impl AppConfig {
    pub fn from_env() -> Self {
        let _ = dotenvy::from_filename(".env.local");
        let _ = dotenvy::from_filename(".env");

        let source_url = env_string("FBREF_SOURCE_URL").unwrap_or_else(|| DEFAULT_SOURCE_URL.to_string());
        let source_file = env_string("FBREF_SOURCE_FILE").map(PathBuf::from);
        let batch_size = clamped_number(
            env_string("FBREF_BATCH_SIZE").as_deref(),
            DEFAULT_BATCH_SIZE as u64,
            1,
            MAX_BATCH_SIZE as u64,
        ) as usize;
        let cooldown_secs = clamped_number(
            env_string("FBREF_COOLDOWN_SECS").as_deref(),
            DEFAULT_COOLDOWN.as_secs(),
            MIN_COOLDOWN.as_secs(),
            MAX_COOLDOWN.as_secs(),
        );
        let http_timeout_secs = clamped_number(
            env_string("FBREF_HTTP_TIMEOUT_SECS").as_deref(),
            DEFAULT_HTTP_TIMEOUT_SECS,
            1,
            600,
        );
        let db_path = env_string("FBREF_DB_PATH")
            .map(PathBuf::from)
            .or_else(default_db_path);

        Self {
            source_url,
            source_file,
            batch_size,
            cooldown: Duration::from_secs(cooldown_secs),
            http_timeout: Duration::from_secs(http_timeout_secs),
            db_path,
        }
    }
}

fn env_string(key: &str) -> Option<String> {
    env::var(key)
        .ok()
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
}

fn clamped_number(raw: Option<&str>, default: u64, min: u64, max: u64) -> u64 {
    raw.and_then(|v| v.trim().parse::<u64>().ok())
        .unwrap_or(default)
        .clamp(min, max)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cooldown_env_value_is_held_to_rate_limit_window() {
        let cooldown = |raw| {
            clamped_number(
                raw,
                DEFAULT_COOLDOWN.as_secs(),
                MIN_COOLDOWN.as_secs(),
                MAX_COOLDOWN.as_secs(),
            )
        };
        assert_eq!(cooldown(Some("0")), 10);
        assert_eq!(cooldown(Some("300")), 30);
        assert_eq!(cooldown(Some(" 12 ")), 12);
        assert_eq!(cooldown(Some("soon")), 30);
        assert_eq!(cooldown(None), 30);
    }

    #[test]
    fn batch_size_env_value_is_clamped() {
        assert_eq!(clamped_number(Some("0"), 3, 1, MAX_BATCH_SIZE as u64), 1);
        assert_eq!(clamped_number(Some("9"), 3, 1, MAX_BATCH_SIZE as u64), 5);
    }
}
