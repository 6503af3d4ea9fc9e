use std::{env, fmt::Display, str::FromStr};

use tracing::{info, warn};

pub struct Config {
    pub database_url: String,
    pub gateway_url: String,
    pub tick_seconds: u64,
}

impl Config {
    pub fn load() -> Self {
        Self {
            database_url: try_load("DATABASE_URL", "sqlite::memory:"),
            gateway_url: try_load("GATEWAY_URL", "http://localhost:9090"),
            tick_seconds: try_load("TICK_SECONDS", "1"),
        }
    }
}

fn var(key: &str) -> Result<String, ()> {
    env::var(key).map_err(|_| ())
}

fn try_load<T: FromStr>(key: &str, default: &str) -> T
where
    T::Err: Display,
{
    var(key)
        .unwrap_or_else(|_| {
            info!("{key} not set, using default: {default}");
            default.to_string()
        })
        .parse()
        .map_err(|e| {
            warn!("Invalid {key} value: {e}");
        })
        .expect("Environment misconfigured!")
}
