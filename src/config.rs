use std::env;
use std::str::FromStr;

use anyhow::{Context, Result};
use dotenvy::dotenv;

#[derive(Clone, Debug)]
pub struct Config {
    pub server_addr: String,

    // Remote REST API of the club (system of record)
    pub upstream_base_url: String,
    pub upstream_timeout_ms: u64,

    // Rate limiting
    pub rate_protected_per_min: u32,

    pub api_prefix: String,

    // Dashboard behaviour
    pub expiry_window_days: u32,
    pub revenue_period_days: u32,
    pub live_refresh_secs: u64,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            server_addr: "127.0.0.1:8080".to_string(),
            upstream_base_url: "http://localhost:7000".to_string(),
            upstream_timeout_ms: 10_000,
            rate_protected_per_min: 1000,
            api_prefix: "/api".to_string(),
            expiry_window_days: 7,
            revenue_period_days: 30,
            live_refresh_secs: 60,
        }
    }
}

fn var_or<T>(key: &str, default: T) -> Result<T>
where
    T: FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
{
    match env::var(key) {
        Ok(raw) => raw
            .trim()
            .parse()
            .with_context(|| format!("{key} has an invalid value: {raw:?}")),
        Err(_) => Ok(default),
    }
}

impl Config {
    pub fn from_env() -> Result<Self> {
        dotenv().ok();
        let defaults = Self::default();

        Ok(Self {
            server_addr: var_or("SERVER_ADDR", defaults.server_addr)?,
            upstream_base_url: var_or("UPSTREAM_BASE_URL", defaults.upstream_base_url)?,
            upstream_timeout_ms: var_or("UPSTREAM_TIMEOUT_MS", defaults.upstream_timeout_ms)?, // default 10 s
            rate_protected_per_min: var_or("RATE_PROTECTED_PER_MIN", defaults.rate_protected_per_min)?,
            api_prefix: var_or("API_PREFIX", defaults.api_prefix)?,
            expiry_window_days: var_or("EXPIRY_WINDOW_DAYS", defaults.expiry_window_days)?,
            revenue_period_days: var_or("REVENUE_PERIOD_DAYS", defaults.revenue_period_days)?,
            live_refresh_secs: var_or("LIVE_REFRESH_SECS", defaults.live_refresh_secs)?,
        })
    }
}
