use std::{env, fmt::Display, net::SocketAddr, path::PathBuf, str::FromStr};

use anyhow::{anyhow, Result};
use tracing::{info, warn};

#[derive(Debug, Clone)]
pub struct Config {
    pub database_url: String,
    pub bind_addr: SocketAddr,
    pub upload_dir: PathBuf,
    pub public_base_url: String,
    pub max_upload_bytes: usize,
    pub settings_path: PathBuf,
    pub log_file: PathBuf,
}

impl Config {
    /// Reads the environment (after `.env` has been loaded by the caller).
    pub fn load() -> Result<Self> {
        Ok(Self {
            database_url: try_load("DATABASE_URL", "sqlite://./trip_expenses.db")?,
            bind_addr: try_load("BIND_ADDR", "127.0.0.1:3000")?,
            upload_dir: try_load("UPLOAD_DIR", "./uploads")?,
            public_base_url: try_load::<String>("PUBLIC_BASE_URL", "http://127.0.0.1:3000/objects")?
                .trim_end_matches('/')
                .to_string(),
            max_upload_bytes: try_load("MAX_UPLOAD_BYTES", "10485760")?,
            settings_path: try_load("SETTINGS_PATH", "./settings.json")?,
            log_file: try_load("LOG_FILE", "./trip-expenses.log")?,
        })
    }
}

fn var(key: &str) -> Option<String> {
    env::var(key).ok().filter(|v| !v.trim().is_empty())
}

fn try_load<T: FromStr>(key: &str, default: &str) -> Result<T>
where
    T::Err: Display,
{
    let raw = var(key).unwrap_or_else(|| {
        info!("{key} not set, using default: {default}");
        default.to_string()
    });

    raw.parse().map_err(|e| {
        warn!("Invalid {key} value: {e}");
        anyhow!("Environment misconfigured: {key}={raw}: {e}")
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_parse_into_typed_values() {
        let port: SocketAddr = try_load("TRIP_TEST_UNSET_ADDR", "127.0.0.1:3000").unwrap();
        assert_eq!(port.port(), 3000);

        let limit: usize = try_load("TRIP_TEST_UNSET_LIMIT", "10485760").unwrap();
        assert_eq!(limit, 10 * 1024 * 1024);
    }

    #[test]
    fn invalid_value_is_an_error() {
        let parsed = try_load::<usize>("TRIP_TEST_UNSET_BAD", "not-a-number");
        assert!(parsed.is_err());
    }
}
