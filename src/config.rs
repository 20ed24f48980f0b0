use std::env;
use std::time::Duration;

use anyhow::{anyhow, Result};

use crate::constants::{
    DEFAULT_API_CACHE_TTL_MS, DEFAULT_HEARTBEAT_MS, DEFAULT_PORT, DEFAULT_REFRESH_INTERVAL_MS,
    DEFAULT_REQUEST_TIMEOUT_MS,
};

#[derive(Clone)]
pub(crate) struct Config {
    pub(crate) score_api_url: String,
    pub(crate) score_api_token: Option<String>,
    pub(crate) port: u16,
    pub(crate) request_timeout: Duration,
    pub(crate) refresh_interval: Duration,
    pub(crate) heartbeat: Duration,
    pub(crate) api_cache_ttl: Duration,
}

impl Config {
    pub(crate) fn from_env() -> Result<Self> {
        let score_api_url = read_env_first(&["SCORE_API_URL", "LEADERBOARD_API_URL"])
            .ok_or_else(|| anyhow!("SCORE_API_URL is not set"))?;
        url::Url::parse(&score_api_url)
            .map_err(|err| anyhow!("SCORE_API_URL is not a valid URL: {}", err))?;

        let score_api_token = read_env_first(&["SCORE_API_TOKEN"]);

        let port = env::var("PORT")
            .ok()
            .and_then(|value| value.parse::<u16>().ok())
            .unwrap_or(DEFAULT_PORT);

        let request_timeout = Duration::from_millis(
            env::var("REQUEST_TIMEOUT_MS")
                .ok()
                .and_then(|value| value.parse::<u64>().ok())
                .unwrap_or(DEFAULT_REQUEST_TIMEOUT_MS),
        );

        let refresh_interval = Duration::from_millis(
            read_env_first(&["REFRESH_INTERVAL_MS", "SCORE_REFRESH_MS"])
                .and_then(|value| value.parse::<u64>().ok())
                .unwrap_or(DEFAULT_REFRESH_INTERVAL_MS),
        );

        let heartbeat = Duration::from_millis(
            env::var("SSE_HEARTBEAT_MS")
                .ok()
                .and_then(|value| value.parse::<u64>().ok())
                .unwrap_or(DEFAULT_HEARTBEAT_MS),
        );

        let api_cache_ttl = Duration::from_millis(
            env::var("API_CACHE_TTL_MS")
                .ok()
                .and_then(|value| value.parse::<u64>().ok())
                .unwrap_or(DEFAULT_API_CACHE_TTL_MS),
        );

        Ok(Self {
            score_api_url,
            score_api_token,
            port,
            request_timeout,
            refresh_interval,
            heartbeat,
            api_cache_ttl,
        })
    }
}

pub(crate) fn read_env_first(keys: &[&str]) -> Option<String> {
    for key in keys {
        if let Ok(value) = env::var(key) {
            let trimmed = value.trim().to_string();
            if !trimmed.is_empty() {
                return Some(trimmed);
            }
        }
    }
    None
}
