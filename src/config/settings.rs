//! Runtime settings from the environment (load `.env` with dotenvy before calling).

use std::path::PathBuf;
use std::time::Duration;

#[derive(Clone, Debug)]
pub struct Settings {
    pub database_url: String,
    /// Directory holding one JSON file per module.
    pub modules_path: PathBuf,
    pub bind_addr: String,
    pub max_connections: u32,
    pub request_timeout: Duration,
}

impl Settings {
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    fn from_lookup(get: impl Fn(&str) -> Option<String>) -> Self {
        let parsed = |key: &str, default: u64| -> u64 {
            match get(key) {
                Some(v) => v.parse().unwrap_or_else(|_| {
                    tracing::warn!(key, value = %v, default, "invalid number, using default");
                    default
                }),
                None => default,
            }
        };
        Settings {
            database_url: get("DATABASE_URL").unwrap_or_else(|| "postgres://localhost/modules".into()),
            modules_path: PathBuf::from(get("MODULES_PATH").unwrap_or_else(|| "modules".into())),
            bind_addr: get("BIND_ADDR").unwrap_or_else(|| "0.0.0.0:8080".into()),
            max_connections: parsed("DB_MAX_CONNECTIONS", 5) as u32,
            request_timeout: Duration::from_secs(parsed("REQUEST_TIMEOUT_SECS", 10)),
        }
    }
}
