use std::env;
use std::str::FromStr;

use crate::app::ResourceLimits;
use crate::error::ConfigError;

/// In-memory SQLite used when demo mode has no explicit URL
pub const DEFAULT_DEMO_DATABASE_URL: &str = "sqlite::memory:";

#[derive(Debug, Clone)]
pub struct Config {
    pub database: DatabaseConfig,
    pub limits: ResourceLimits,
    /// Run against a throwaway database and seed a sample scenario
    pub demo_mode: bool,
}

#[derive(Debug, Clone)]
pub struct DatabaseConfig {
    pub url: String,
    pub max_connections: u32,
    pub min_connections: u32,
    pub connect_timeout_secs: u64,
    /// Log every SQL statement through sqlx
    pub sql_logging: bool,
}

impl DatabaseConfig {
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            max_connections: 30,
            min_connections: 1,
            connect_timeout_secs: 10,
            sql_logging: false,
        }
    }

    pub fn is_sqlite_memory(&self) -> bool {
        self.url.starts_with("sqlite::memory:") || self.url.contains("mode=memory")
    }
}

impl Config {
    pub fn from_env() -> Result<Self, ConfigError> {
        dotenvy::dotenv().ok();

        let demo_mode = parse_var("DEMO_MODE", false)?;
        let url = if demo_mode {
            env::var("DEMO_DATABASE_URL").unwrap_or_else(|_| DEFAULT_DEMO_DATABASE_URL.to_string())
        } else {
            env::var("DATABASE_URL").map_err(|_| ConfigError::Missing("DATABASE_URL"))?
        };

        let defaults = DatabaseConfig::new(url);
        let database = DatabaseConfig {
            max_connections: parse_var("DB_MAX_CONNECTIONS", defaults.max_connections)?,
            min_connections: parse_var("DB_MIN_CONNECTIONS", defaults.min_connections)?,
            connect_timeout_secs: parse_var(
                "DB_CONNECT_TIMEOUT_SECS",
                defaults.connect_timeout_secs,
            )?,
            sql_logging: parse_var("SQL_LOGGING", defaults.sql_logging)?,
            ..defaults
        };
        if database.min_connections > database.max_connections {
            return Err(ConfigError::Invalid {
                key: "DB_MIN_CONNECTIONS",
                value: format!(
                    "{} exceeds DB_MAX_CONNECTIONS ({})",
                    database.min_connections, database.max_connections
                ),
            });
        }

        let base = ResourceLimits::default();
        let limits = ResourceLimits {
            max_workspaces_per_user: parse_var(
                "MAX_WORKSPACES_PER_USER",
                base.max_workspaces_per_user,
            )?,
            max_repos_per_workspace: parse_var(
                "MAX_REPOS_PER_WORKSPACE",
                base.max_repos_per_workspace,
            )?,
            max_vaults_per_workspace: parse_var(
                "MAX_VAULTS_PER_WORKSPACE",
                base.max_vaults_per_workspace,
            )?,
        };

        Ok(Self {
            database,
            limits,
            demo_mode,
        })
    }
}

fn parse_var<T: FromStr>(key: &'static str, default: T) -> Result<T, ConfigError> {
    match env::var(key) {
        Ok(raw) => parse_value(key, &raw),
        Err(_) => Ok(default),
    }
}

fn parse_value<T: FromStr>(key: &'static str, raw: &str) -> Result<T, ConfigError> {
    raw.trim().parse().map_err(|_| ConfigError::Invalid {
        key,
        value: raw.to_string(),
    })
}
