use anyhow::{Context, Result, anyhow};
use dotenvy::dotenv;
use std::env;
use std::fmt::Display;
use std::str::FromStr;
use strum_macros::{Display as StrumDisplay, EnumString};

/// Which `EmployeeStore` implementation backs the API.
#[derive(Debug, Clone, Copy, PartialEq, Eq, EnumString, StrumDisplay)]
#[strum(ascii_case_insensitive)]
pub enum StoreBackend {
    #[strum(serialize = "mysql")]
    MySql,
    #[strum(serialize = "memory")]
    Memory,
}

#[derive(Clone, Debug)]
pub struct Config {
    pub server_addr: String,
    pub store_backend: StoreBackend,
    pub database_url: Option<String>,
    pub db_max_connections: u32,

    // Rate limiting
    pub rate_api_per_min: u32,

    pub api_prefix: String,

    pub log_dir: String,
    pub log_level: tracing::Level,
}

impl Config {
    pub fn from_env() -> Result<Self> {
        dotenv().ok();
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Builds the config from any key lookup; `from_env` passes the process environment.
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let store_backend = parse_or(&lookup, "STORE_BACKEND", StoreBackend::MySql)?;
        let database_url = lookup("DATABASE_URL").filter(|url| !url.trim().is_empty());

        if store_backend == StoreBackend::MySql && database_url.is_none() {
            return Err(anyhow!("DATABASE_URL must be set when STORE_BACKEND is mysql"));
        }

        Ok(Self {
            server_addr: lookup("SERVER_ADDR").unwrap_or_else(|| "127.0.0.1:5000".to_string()),
            store_backend,
            database_url,
            db_max_connections: parse_or(&lookup, "DB_MAX_CONNECTIONS", 10)?,
            rate_api_per_min: parse_or(&lookup, "RATE_API_PER_MIN", 1000)?,
            api_prefix: lookup("API_PREFIX")
                .map(|p| p.trim_end_matches('/').to_string())
                .unwrap_or_else(|| "/api".to_string()),
            log_dir: lookup("LOG_DIR").unwrap_or_else(|| "logs".to_string()),
            log_level: parse_or(&lookup, "LOG_LEVEL", tracing::Level::INFO)?,
        })
    }

    pub fn employees_path(&self) -> String {
        format!("{}/employees", self.api_prefix)
    }
}

fn parse_or<F, T>(lookup: &F, key: &str, default: T) -> Result<T>
where
    F: Fn(&str) -> Option<String>,
    T: FromStr,
    T::Err: Display,
{
    match lookup(key) {
        Some(raw) => raw
            .trim()
            .parse()
            .map_err(|e: T::Err| anyhow!("{e}"))
            .with_context(|| format!("{key} has an invalid value: {raw:?}")),
        None => Ok(default),
    }
}
