//! Server configuration from the environment
//!
//! | Variable              | Default        | Meaning                                |
//! |-----------------------|----------------|----------------------------------------|
//! | `CHESS_BIND_ADDR`     | `0.0.0.0:3000` | HTTP listen address                    |
//! | `DATABASE_URL`        | unset          | `sqlite:` URL; unset keeps games in memory |
//! | `CHESS_DEFAULT_DEPTH` | `3`            | Depth for games started without one    |
//! | `CHESS_MAX_DEPTH`     | `10`           | Largest accepted depth                 |
//!
//! A `.env` file in the working directory is loaded first when present.

use std::net::SocketAddr;

use chess_engine::constants::{DEFAULT_SEARCH_DEPTH, MAX_SEARCH_DEPTH};
use thiserror::Error;

use crate::manager::SearchLimits;

pub const BIND_ADDR_VAR: &str = "CHESS_BIND_ADDR";
pub const DATABASE_URL_VAR: &str = "DATABASE_URL";
pub const DEFAULT_DEPTH_VAR: &str = "CHESS_DEFAULT_DEPTH";
pub const MAX_DEPTH_VAR: &str = "CHESS_MAX_DEPTH";

pub const DEFAULT_BIND_ADDR: &str = "0.0.0.0:3000";

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("invalid value '{value}' for {key}: {reason}")]
    InvalidValue {
        key: &'static str,
        value: String,
        reason: String,
    },
}

/// Where sessions are kept
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StoreBackend {
    Memory,
    Sqlite { url: String },
}

impl StoreBackend {
    /// Pick a backend from a database URL. Only SQLite is supported.
    pub fn from_url(url: &str) -> Result<Self, ConfigError> {
        if url.starts_with("sqlite:") {
            Ok(StoreBackend::Sqlite {
                url: url.to_string(),
            })
        } else {
            Err(ConfigError::InvalidValue {
                key: DATABASE_URL_VAR,
                value: url.to_string(),
                reason: "expected a sqlite: URL".to_string(),
            })
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServerConfig {
    pub bind_addr: SocketAddr,
    pub store: StoreBackend,
    pub limits: SearchLimits,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind_addr: SocketAddr::from(([0, 0, 0, 0], 3000)),
            store: StoreBackend::Memory,
            limits: SearchLimits::default(),
        }
    }
}

impl ServerConfig {
    /// Read configuration from the process environment, loading `.env` first.
    pub fn from_env() -> Result<Self, ConfigError> {
        dotenvy::dotenv().ok();
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build configuration from any key lookup.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let value = |key: &str| lookup(key).filter(|value| !value.trim().is_empty());

        let bind_addr = value(BIND_ADDR_VAR)
            .unwrap_or_else(|| DEFAULT_BIND_ADDR.to_string());
        let bind_addr = parse_bind_addr(&bind_addr)?;

        let store = match value(DATABASE_URL_VAR) {
            Some(url) => StoreBackend::from_url(url.trim())?,
            None => StoreBackend::Memory,
        };

        let max_depth = match value(MAX_DEPTH_VAR) {
            Some(raw) => parse_depth(MAX_DEPTH_VAR, &raw)?.min(MAX_SEARCH_DEPTH),
            None => MAX_SEARCH_DEPTH,
        };
        let default_depth = match value(DEFAULT_DEPTH_VAR) {
            Some(raw) => parse_depth(DEFAULT_DEPTH_VAR, &raw)?,
            None => DEFAULT_SEARCH_DEPTH.min(max_depth),
        };
        if default_depth > max_depth {
            return Err(ConfigError::InvalidValue {
                key: DEFAULT_DEPTH_VAR,
                value: default_depth.to_string(),
                reason: format!("exceeds the maximum depth {max_depth}"),
            });
        }

        Ok(Self {
            bind_addr,
            store,
            limits: SearchLimits {
                default_depth,
                max_depth,
            },
        })
    }
}

pub fn parse_bind_addr(raw: &str) -> Result<SocketAddr, ConfigError> {
    raw.trim()
        .parse()
        .map_err(|err: std::net::AddrParseError| ConfigError::InvalidValue {
            key: BIND_ADDR_VAR,
            value: raw.to_string(),
            reason: err.to_string(),
        })
}

fn parse_depth(key: &'static str, raw: &str) -> Result<u8, ConfigError> {
    let invalid = |reason: String| ConfigError::InvalidValue {
        key,
        value: raw.to_string(),
        reason,
    };

    let depth: u8 = raw.trim().parse().map_err(|err| invalid(format!("{err}")))?;
    if depth == 0 {
        return Err(invalid("depth must be at least 1".to_string()));
    }
    Ok(depth)
}
