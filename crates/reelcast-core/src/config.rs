//! Configuration module
//!
//! Client configuration loaded from the environment (and an optional `.env`
//! file): service endpoints, credentials, and upload tuning.

use std::env;

use crate::chunk::{DEFAULT_CHUNK_SIZE, MIN_PART_SIZE};

const DEFAULT_API_URL: &str = "http://localhost:9001";
const CHUNK_SIZE_MB: u64 = 5;
const MAX_CONCURRENT_PARTS: usize = 4;
const PART_MAX_RETRIES: u32 = 3;
const RETRY_BASE_DELAY_MS: u64 = 500;
const RETRY_MAX_DELAY_MS: u64 = 30_000;
const HTTP_TIMEOUT_SECS: u64 = 60;

/// Convert a part size in MiB to bytes, rejecting sizes that overflow `u64`.
pub fn chunk_size_from_mb(mb: u64) -> Result<u64, anyhow::Error> {
    mb.checked_mul(1024 * 1024)
        .ok_or_else(|| anyhow::anyhow!("REELCAST_CHUNK_SIZE_MB is too large"))
}

#[derive(Clone, Debug)]
pub struct ClientConfig {
    /// Base URL of the ingestion service
    pub api_url: String,
    /// Base URL of the notification broker (defaults to the ingestion service)
    pub broker_url: String,
    /// Optional API key, sent as `X-API-Key`
    pub api_key: Option<String>,
    /// Base URL of the bucket serving transcoded renditions
    pub playback_base_url: Option<String>,
    pub chunk_size_bytes: u64,
    pub max_concurrent_parts: usize,
    pub part_max_retries: u32,
    pub retry_base_delay_ms: u64,
    pub retry_max_delay_ms: u64,
    pub http_timeout_secs: u64,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            api_url: DEFAULT_API_URL.to_string(),
            broker_url: DEFAULT_API_URL.to_string(),
            api_key: None,
            playback_base_url: None,
            chunk_size_bytes: DEFAULT_CHUNK_SIZE,
            max_concurrent_parts: MAX_CONCURRENT_PARTS,
            part_max_retries: PART_MAX_RETRIES,
            retry_base_delay_ms: RETRY_BASE_DELAY_MS,
            retry_max_delay_ms: RETRY_MAX_DELAY_MS,
            http_timeout_secs: HTTP_TIMEOUT_SECS,
        }
    }
}

impl ClientConfig {
    pub fn from_env() -> Result<Self, anyhow::Error> {
        dotenvy::dotenv().ok();
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Build the configuration from an arbitrary variable lookup.
    pub fn from_lookup<F>(var: F) -> Result<Self, anyhow::Error>
    where
        F: Fn(&str) -> Option<String>,
    {
        let non_empty = |key: &str| var(key).filter(|s| !s.trim().is_empty());

        let api_url = non_empty("REELCAST_API_URL")
            .or_else(|| non_empty("HOST_URL"))
            .unwrap_or_else(|| DEFAULT_API_URL.to_string())
            .trim_end_matches('/')
            .to_string();

        let broker_url = non_empty("REELCAST_BROKER_URL")
            .map(|s| s.trim_end_matches('/').to_string())
            .unwrap_or_else(|| api_url.clone());

        let chunk_size_mb = non_empty("REELCAST_CHUNK_SIZE_MB")
            .unwrap_or_else(|| CHUNK_SIZE_MB.to_string())
            .parse::<u64>()
            .map_err(|e| anyhow::anyhow!("REELCAST_CHUNK_SIZE_MB must be an integer: {}", e))?;

        let config = Self {
            api_url,
            broker_url,
            api_key: non_empty("REELCAST_API_KEY"),
            playback_base_url: non_empty("REELCAST_PLAYBACK_BASE_URL"),
            chunk_size_bytes: chunk_size_from_mb(chunk_size_mb)?,
            max_concurrent_parts: non_empty("REELCAST_MAX_CONCURRENT_PARTS")
                .and_then(|s| s.parse().ok())
                .unwrap_or(MAX_CONCURRENT_PARTS),
            part_max_retries: non_empty("REELCAST_PART_MAX_RETRIES")
                .and_then(|s| s.parse().ok())
                .unwrap_or(PART_MAX_RETRIES),
            retry_base_delay_ms: non_empty("REELCAST_RETRY_BASE_DELAY_MS")
                .and_then(|s| s.parse().ok())
                .unwrap_or(RETRY_BASE_DELAY_MS),
            retry_max_delay_ms: non_empty("REELCAST_RETRY_MAX_DELAY_MS")
                .and_then(|s| s.parse().ok())
                .unwrap_or(RETRY_MAX_DELAY_MS),
            http_timeout_secs: non_empty("REELCAST_HTTP_TIMEOUT_SECS")
                .and_then(|s| s.parse().ok())
                .unwrap_or(HTTP_TIMEOUT_SECS),
        };

        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), anyhow::Error> {
        for (name, url) in [
            ("REELCAST_API_URL", &self.api_url),
            ("REELCAST_BROKER_URL", &self.broker_url),
        ] {
            if !url.starts_with("http://") && !url.starts_with("https://") {
                return Err(anyhow::anyhow!("{} must be an http(s) URL", name));
            }
        }

        if self.chunk_size_bytes < MIN_PART_SIZE {
            return Err(anyhow::anyhow!(
                "REELCAST_CHUNK_SIZE_MB must be at least {} MB",
                MIN_PART_SIZE / 1024 / 1024
            ));
        }

        if self.max_concurrent_parts == 0 {
            return Err(anyhow::anyhow!(
                "REELCAST_MAX_CONCURRENT_PARTS must be greater than 0"
            ));
        }

        if self.http_timeout_secs == 0 {
            return Err(anyhow::anyhow!(
                "REELCAST_HTTP_TIMEOUT_SECS must be greater than 0"
            ));
        }

        Ok(())
    }
}
