//! Process configuration from environment variables.

use std::net::SocketAddr;

use chrono::Duration;
use thiserror::Error;

use stockroom_auth::{DEFAULT_COST, DEFAULT_TOKEN_TTL_HOURS};

const DEV_JWT_SECRET: &str = "dev-secret";

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("{name} is invalid: {reason}")]
    Invalid { name: &'static str, reason: String },

    #[error("{0} must be set when USE_PERSISTENT_STORES=true")]
    Missing(&'static str),
}

#[derive(Clone, PartialEq, Eq)]
pub enum Storage {
    InMemory,
    Postgres { database_url: String },
}

#[derive(Clone)]
pub struct AppConfig {
    pub bind_addr: SocketAddr,
    pub jwt_secret: String,
    pub token_ttl: Duration,
    pub storage: Storage,
    pub bcrypt_cost: u32,
    pub seed_demo_data: bool,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            bind_addr: SocketAddr::from(([0, 0, 0, 0], 8080)),
            jwt_secret: DEV_JWT_SECRET.to_string(),
            token_ttl: Duration::hours(DEFAULT_TOKEN_TTL_HOURS),
            storage: Storage::InMemory,
            bcrypt_cost: DEFAULT_COST,
            seed_demo_data: true,
        }
    }
}

impl AppConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Build from any key lookup; `from_env` passes the process environment.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let defaults = Self::default();
        let get = |name: &str| lookup(name).filter(|v| !v.trim().is_empty());

        let bind_addr = match get("BIND_ADDR") {
            Some(v) => parse("BIND_ADDR", &v)?,
            None => defaults.bind_addr,
        };

        let jwt_secret = get("JWT_SECRET").unwrap_or_else(|| {
            tracing::warn!("JWT_SECRET not set; using insecure dev default");
            DEV_JWT_SECRET.to_string()
        });

        let token_ttl = match get("TOKEN_TTL_HOURS") {
            Some(v) => {
                let hours: i64 = parse("TOKEN_TTL_HOURS", &v)?;
                if hours <= 0 {
                    return Err(ConfigError::Invalid {
                        name: "TOKEN_TTL_HOURS",
                        reason: "must be positive".to_string(),
                    });
                }
                Duration::hours(hours)
            }
            None => defaults.token_ttl,
        };

        let persistent = match get("USE_PERSISTENT_STORES") {
            Some(v) => parse_bool("USE_PERSISTENT_STORES", &v)?,
            None => false,
        };
        let storage = if persistent {
            let database_url = get("DATABASE_URL").ok_or(ConfigError::Missing("DATABASE_URL"))?;
            Storage::Postgres { database_url }
        } else {
            Storage::InMemory
        };

        let bcrypt_cost = match get("BCRYPT_COST") {
            Some(v) => {
                let cost: u32 = parse("BCRYPT_COST", &v)?;
                if !(4..=31).contains(&cost) {
                    return Err(ConfigError::Invalid {
                        name: "BCRYPT_COST",
                        reason: "must be between 4 and 31".to_string(),
                    });
                }
                cost
            }
            None => defaults.bcrypt_cost,
        };

        let seed_demo_data = match get("SEED_DEMO_DATA") {
            Some(v) => parse_bool("SEED_DEMO_DATA", &v)?,
            None => defaults.seed_demo_data,
        };

        Ok(Self {
            bind_addr,
            jwt_secret,
            token_ttl,
            storage,
            bcrypt_cost,
            seed_demo_data,
        })
    }
}

fn parse<T>(name: &'static str, value: &str) -> Result<T, ConfigError>
where
    T: std::str::FromStr,
    T::Err: std::fmt::Display,
{
    value.trim().parse().map_err(|e: T::Err| ConfigError::Invalid {
        name,
        reason: e.to_string(),
    })
}

fn parse_bool(name: &'static str, value: &str) -> Result<bool, ConfigError> {
    match value.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Ok(true),
        "0" | "false" | "no" | "off" => Ok(false),
        other => Err(ConfigError::Invalid {
            name,
            reason: format!("expected a boolean, got '{other}'"),
        }),
    }
}

// Secrets stay out of logs.
impl std::fmt::Debug for AppConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let storage = match &self.storage {
            Storage::InMemory => "in-memory",
            Storage::Postgres { .. } => "postgres",
        };
        f.debug_struct("AppConfig")
            .field("bind_addr", &self.bind_addr)
            .field("token_ttl_hours", &self.token_ttl.num_hours())
            .field("storage", &storage)
            .field("bcrypt_cost", &self.bcrypt_cost)
            .field("seed_demo_data", &self.seed_demo_data)
            .finish_non_exhaustive()
    }
}
