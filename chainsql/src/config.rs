//! Connection configuration
//!
//! A single connection is described by [`DatabaseConfig`]; several named
//! connections live in a [`ConnectionRegistry`], loaded from TOML:
//!
//! ```toml
//! [connections.default]
//! url = "mysql://localhost:3306/shop"
//! username = "app"
//! password = "${SHOP_DB_PASSWORD}"
//!
//! [connections.reporting]
//! url = "mysql://replica:3306/shop"
//! max_connections = 2
//! ```
//!
//! `${NAME}` in any string field is replaced from the process environment.

use std::collections::BTreeMap;
use std::path::Path;

use serde::Deserialize;

use crate::{Error, Result};

/// Name of the connection used when none is given
pub const DEFAULT_CONNECTION: &str = "default";

/// Settings for one database connection pool
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct DatabaseConfig {
    /// `mysql://host:port/database`
    pub url: String,
    #[serde(default)]
    pub username: Option<String>,
    #[serde(default)]
    pub password: Option<String>,
    #[serde(default = "default_max_connections")]
    pub max_connections: u32,
    #[serde(default)]
    pub min_connections: u32,
    #[serde(default = "default_acquire_timeout_secs")]
    pub acquire_timeout_secs: u64,
}

fn default_max_connections() -> u32 {
    5
}

fn default_acquire_timeout_secs() -> u64 {
    30
}

impl DatabaseConfig {
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            username: None,
            password: None,
            max_connections: default_max_connections(),
            min_connections: 0,
            acquire_timeout_secs: default_acquire_timeout_secs(),
        }
    }

    pub fn with_credentials(mut self, username: impl Into<String>, password: impl Into<String>) -> Self {
        self.username = Some(username.into());
        self.password = Some(password.into());
        self
    }

    /// Parse a single connection table
    pub fn from_toml_str(raw: &str) -> Result<Self> {
        let mut config: Self = toml::from_str(raw)
            .map_err(|e| Error::config(format!("failed to parse database config: {e}")))?;
        config.expand_env(&env_lookup)?;
        config.validate()?;
        Ok(config)
    }

    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        Self::from_toml_str(&read_config(path.as_ref())?)
    }

    /// Build from `DATABASE_URL`, `DATABASE_USER`, `DATABASE_PASSWORD` and
    /// `DATABASE_MAX_CONNECTIONS`, after loading a `.env` file if present
    pub fn from_env() -> Result<Self> {
        // a missing .env is fine; real environment variables still apply
        let _ = dotenvy::dotenv();
        Self::from_lookup(&env_lookup)
    }

    fn from_lookup(lookup: &dyn Fn(&str) -> Option<String>) -> Result<Self> {
        let url = lookup("DATABASE_URL")
            .ok_or_else(|| Error::config("DATABASE_URL is not set"))?;

        let mut config = Self::new(url);
        config.username = lookup("DATABASE_USER");
        config.password = lookup("DATABASE_PASSWORD");
        if let Some(max) = lookup("DATABASE_MAX_CONNECTIONS") {
            config.max_connections = max.trim().parse().map_err(|_| {
                Error::config(format!("DATABASE_MAX_CONNECTIONS is not a number: {max}"))
            })?;
        }
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        if self.url.trim().is_empty() {
            return Err(Error::config("database url must not be empty"));
        }
        if self.max_connections == 0 {
            return Err(Error::config("max_connections must be at least 1"));
        }
        if self.min_connections > self.max_connections {
            return Err(Error::config(format!(
                "min_connections ({}) exceeds max_connections ({})",
                self.min_connections, self.max_connections
            )));
        }
        Ok(())
    }

    fn expand_env(&mut self, lookup: &dyn Fn(&str) -> Option<String>) -> Result<()> {
        self.url = expand_env_vars(&self.url, lookup)?;
        if let Some(username) = self.username.as_mut() {
            *username = expand_env_vars(username, lookup)?;
        }
        if let Some(password) = self.password.as_mut() {
            *password = expand_env_vars(password, lookup)?;
        }
        Ok(())
    }
}

/// Named connection settings
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct ConnectionRegistry {
    #[serde(default)]
    connections: BTreeMap<String, DatabaseConfig>,
}

impl ConnectionRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Parse every `[connections.<name>]` table
    pub fn from_toml_str(raw: &str) -> Result<Self> {
        Self::parse(raw, &env_lookup)
    }

    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        Self::from_toml_str(&read_config(path.as_ref())?)
    }

    fn parse(raw: &str, lookup: &dyn Fn(&str) -> Option<String>) -> Result<Self> {
        let mut registry: Self = toml::from_str(raw)
            .map_err(|e| Error::config(format!("failed to parse connections: {e}")))?;
        for (name, config) in registry.connections.iter_mut() {
            config
                .expand_env(lookup)
                .and_then(|_| config.validate())
                .map_err(|e| match e {
                    Error::Config { message } => {
                        Error::config(format!("connection '{name}': {message}"))
                    }
                    other => other,
                })?;
        }
        Ok(registry)
    }

    /// Register (or replace) a named connection
    pub fn add(&mut self, name: impl Into<String>, config: DatabaseConfig) -> &mut Self {
        self.connections.insert(name.into(), config);
        self
    }

    pub fn get(&self, name: &str) -> Result<&DatabaseConfig> {
        self.connections
            .get(name)
            .ok_or_else(|| Error::config(format!("connection '{name}' does not exist")))
    }

    /// The `default` connection; taken from the environment when it was
    /// never registered
    pub fn default_connection(&mut self) -> Result<&DatabaseConfig> {
        if !self.connections.contains_key(DEFAULT_CONNECTION) {
            let config = DatabaseConfig::from_env()?;
            self.connections.insert(DEFAULT_CONNECTION.to_string(), config);
        }
        self.get(DEFAULT_CONNECTION)
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.connections.keys().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.connections.len()
    }

    pub fn is_empty(&self) -> bool {
        self.connections.is_empty()
    }
}

fn env_lookup(key: &str) -> Option<String> {
    std::env::var(key).ok()
}

fn read_config(path: &Path) -> Result<String> {
    std::fs::read_to_string(path)
        .map_err(|e| Error::config(format!("failed to read config file {}: {e}", path.display())))
}

/// Replace every `${NAME}` with the looked-up value
fn expand_env_vars(input: &str, lookup: &dyn Fn(&str) -> Option<String>) -> Result<String> {
    let mut out = String::with_capacity(input.len());
    let mut rest = input;

    while let Some(start) = rest.find("${") {
        out.push_str(&rest[..start]);
        let after = &rest[start + 2..];
        let end = after
            .find('}')
            .ok_or_else(|| Error::config(format!("unclosed ${{...}} in '{input}'")))?;
        let key = &after[..end];
        let value = lookup(key)
            .ok_or_else(|| Error::config(format!("environment variable {key} is not set")))?;
        out.push_str(&value);
        rest = &after[end + 1..];
    }
    out.push_str(rest);
    Ok(out)
}
