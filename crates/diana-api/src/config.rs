//! Server configuration read from the environment.

use std::path::PathBuf;
use std::str::FromStr;

use crate::error::AppError;

/// Where reward grants go.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum RewardsMode {
    /// Rows in the `reward_grants` outbox table.
    #[default]
    Outbox,
    /// Log lines only.
    Log,
}

impl FromStr for RewardsMode {
    type Err = AppError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value {
            "outbox" => Ok(Self::Outbox),
            "log" => Ok(Self::Log),
            other => Err(AppError::Config(format!(
                "DIANA_REWARDS must be 'outbox' or 'log', got '{other}'"
            ))),
        }
    }
}

/// Everything the server binary needs to start.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServerConfig {
    /// `PostgreSQL` connection string.
    pub database_url: String,
    /// Bind address.
    pub host: String,
    /// Bind port.
    pub port: u16,
    /// Connection pool size.
    pub max_connections: u32,
    /// Catalog published at startup, if any.
    pub catalog_path: Option<PathBuf>,
    /// Reward collaborator.
    pub rewards: RewardsMode,
}

impl ServerConfig {
    /// Reads the configuration from process environment variables.
    ///
    /// # Errors
    ///
    /// Returns `AppError::Config` if `DATABASE_URL` is missing or a value does
    /// not parse.
    pub fn from_env() -> Result<Self, AppError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Reads the configuration through `lookup`.
    ///
    /// # Errors
    ///
    /// Returns `AppError::Config` if `DATABASE_URL` is missing or a value does
    /// not parse.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, AppError> {
        let database_url = lookup("DATABASE_URL").ok_or_else(|| {
            AppError::Config("DATABASE_URL environment variable must be set".to_owned())
        })?;
        let host = lookup("HOST").unwrap_or_else(|| "0.0.0.0".to_owned());
        let port = parse_or(&lookup, "PORT", 3000)?;
        let max_connections = parse_or(&lookup, "DATABASE_MAX_CONNECTIONS", 10)?;
        let catalog_path = lookup("DIANA_CATALOG_PATH")
            .filter(|path| !path.trim().is_empty())
            .map(PathBuf::from);
        let rewards = lookup("DIANA_REWARDS")
            .map(|value| value.parse::<RewardsMode>())
            .transpose()?
            .unwrap_or_default();

        Ok(Self {
            database_url,
            host,
            port,
            max_connections,
            catalog_path,
            rewards,
        })
    }
}

fn parse_or<T>(
    lookup: &impl Fn(&str) -> Option<String>,
    key: &str,
    default: T,
) -> Result<T, AppError>
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    match lookup(key) {
        None => Ok(default),
        Some(raw) => raw
            .parse()
            .map_err(|e| AppError::Config(format!("{key} is invalid: {e}"))),
    }
}
