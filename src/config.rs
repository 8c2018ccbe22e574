use anyhow::Context;
use dotenvy::dotenv;
use std::env;
use std::str::FromStr;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FeatureFlagsBackend {
    Env,
    Database,
}

impl FromStr for FeatureFlagsBackend {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "env" => Ok(FeatureFlagsBackend::Env),
            "database" | "db" => Ok(FeatureFlagsBackend::Database),
            other => anyhow::bail!("FEATURE_FLAGS_BACKEND must be 'env' or 'database', got '{}'", other),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogFormat {
    Text,
    Json,
}

impl FromStr for LogFormat {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "text" | "pretty" => Ok(LogFormat::Text),
            "json" => Ok(LogFormat::Json),
            other => anyhow::bail!("LOG_FORMAT must be 'text' or 'json', got '{}'", other),
        }
    }
}

#[derive(Debug, Clone)]
pub struct Config {
    pub server_port: u16,
    /// Postgres store when set, in-memory store otherwise.
    pub database_url: Option<String>,
    pub database_max_connections: u32,
    pub feature_flags_backend: FeatureFlagsBackend,
    pub log_format: LogFormat,
    pub log_request_body: bool,
    pub cors_allowed_origins: Option<Vec<String>>,
}

impl Config {
    pub fn from_env() -> anyhow::Result<Self> {
        dotenv().ok(); // Load .env file if present
        Self::from_lookup(|key| env::var(key).ok())
    }

    pub(crate) fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> anyhow::Result<Self> {
        let config = Config {
            server_port: parse_or("SERVER_PORT", &lookup, 3000)?,
            database_url: lookup("DATABASE_URL").filter(|url| !url.trim().is_empty()),
            database_max_connections: parse_or("DATABASE_MAX_CONNECTIONS", &lookup, 5)?,
            feature_flags_backend: parse_or("FEATURE_FLAGS_BACKEND", &lookup, FeatureFlagsBackend::Env)?,
            log_format: parse_or("LOG_FORMAT", &lookup, LogFormat::Text)?,
            log_request_body: parse_or("LOG_REQUEST_BODY", &lookup, false)?,
            cors_allowed_origins: lookup("CORS_ALLOWED_ORIGINS").map(|raw| {
                raw.split(',')
                    .map(str::trim)
                    .filter(|origin| !origin.is_empty())
                    .map(String::from)
                    .collect()
            }),
        };

        config.validate()?;
        Ok(config)
    }

    fn validate(&self) -> anyhow::Result<()> {
        if self.server_port == 0 {
            anyhow::bail!("SERVER_PORT must be greater than 0");
        }
        if self.database_max_connections == 0 {
            anyhow::bail!("DATABASE_MAX_CONNECTIONS must be greater than 0");
        }
        if self.feature_flags_backend == FeatureFlagsBackend::Database && self.database_url.is_none() {
            anyhow::bail!("FEATURE_FLAGS_BACKEND=database requires DATABASE_URL");
        }
        Ok(())
    }

    pub fn store_backend(&self) -> &'static str {
        if self.database_url.is_some() {
            "postgres"
        } else {
            "in-memory"
        }
    }
}

fn parse_or<T>(key: &str, lookup: &impl Fn(&str) -> Option<String>, default: T) -> anyhow::Result<T>
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    match lookup(key) {
        Some(raw) if !raw.trim().is_empty() => raw
            .trim()
            .parse()
            .map_err(|e| anyhow::anyhow!("{}", e))
            .with_context(|| format!("invalid value for {}: '{}'", key, raw)),
        _ => Ok(default),
    }
}
