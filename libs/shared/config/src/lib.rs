use std::env;
use std::str::FromStr;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use tracing::warn;

pub const DEFAULT_SLOT_GRANULARITY_MINUTES: u32 = 30;
pub const DEFAULT_SLOT_HORIZON_DAYS: u32 = 30;
pub const DEFAULT_HORIZON_INTERVAL_SECONDS: u64 = 86_400;
pub const DEFAULT_STORE_TIMEOUT_SECONDS: u64 = 10;
pub const DEFAULT_PORT: u16 = 3000;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    pub supabase_url: String,
    pub supabase_service_key: String,
    pub slot_granularity_minutes: u32,
    pub slot_horizon_days: u32,
    pub horizon_interval_seconds: u64,
    pub store_timeout_seconds: u64,
    pub port: u16,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            supabase_url: String::new(),
            supabase_service_key: String::new(),
            slot_granularity_minutes: DEFAULT_SLOT_GRANULARITY_MINUTES,
            slot_horizon_days: DEFAULT_SLOT_HORIZON_DAYS,
            horizon_interval_seconds: DEFAULT_HORIZON_INTERVAL_SECONDS,
            store_timeout_seconds: DEFAULT_STORE_TIMEOUT_SECONDS,
            port: DEFAULT_PORT,
        }
    }
}

impl AppConfig {
    pub fn from_env() -> Self {
        let config = Self {
            supabase_url: env::var("SUPABASE_URL")
                .unwrap_or_else(|_| {
                    warn!("SUPABASE_URL not set, using empty value");
                    String::new()
                }),
            supabase_service_key: env::var("SUPABASE_SERVICE_ROLE_KEY")
                .unwrap_or_else(|_| {
                    warn!("SUPABASE_SERVICE_ROLE_KEY not set, using empty value");
                    String::new()
                }),
            slot_granularity_minutes: parse_var(
                "SLOT_GRANULARITY_MINUTES",
                DEFAULT_SLOT_GRANULARITY_MINUTES,
            ),
            slot_horizon_days: parse_var("SLOT_HORIZON_DAYS", DEFAULT_SLOT_HORIZON_DAYS),
            horizon_interval_seconds: parse_var(
                "HORIZON_INTERVAL_SECONDS",
                DEFAULT_HORIZON_INTERVAL_SECONDS,
            ),
            store_timeout_seconds: parse_var(
                "STORE_TIMEOUT_SECONDS",
                DEFAULT_STORE_TIMEOUT_SECONDS,
            ),
            port: parse_var("PORT", DEFAULT_PORT),
        };

        if !config.is_configured() {
            warn!("Supabase not configured - falling back to in-memory storage");
        }

        config
    }

    pub fn is_configured(&self) -> bool {
        !self.supabase_url.is_empty() && !self.supabase_service_key.is_empty()
    }

    pub fn store_timeout(&self) -> Duration {
        Duration::from_secs(self.store_timeout_seconds)
    }

    pub fn horizon_interval(&self) -> Duration {
        Duration::from_secs(self.horizon_interval_seconds)
    }
}

fn parse_var<T>(key: &str, default: T) -> T
where
    T: FromStr + Copy + std::fmt::Display,
{
    match env::var(key) {
        Ok(raw) => raw.trim().parse().unwrap_or_else(|_| {
            warn!("{} has invalid value '{}', using default {}", key, raw, default);
            default
        }),
        Err(_) => default,
    }
}
