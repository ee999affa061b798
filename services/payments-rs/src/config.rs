// services/payments-rs/src/config.rs

use std::net::SocketAddr;
use std::str::FromStr;
use std::time::Duration;

use anyhow::{Context, Result};

use crate::idempo::CachePolicy;

pub const DEFAULT_ADDR: &str = "0.0.0.0:3000";
pub const DEFAULT_DATABASE_URL: &str = "sqlite://payments.db";
pub const DEFAULT_MAX_CONNECTIONS: u32 = 16;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
    pub addr: SocketAddr,
    pub database_url: String,
    pub db_max_connections: u32,
    pub cache: CachePolicy,
}

impl Config {
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|k| std::env::var(k).ok())
    }

    /// Builds the config from any key lookup; unset or blank keys take defaults.
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |k: &str| lookup(k).filter(|v| !v.trim().is_empty());

        let addr = get("PAYMENTS_ADDR").unwrap_or_else(|| DEFAULT_ADDR.into());
        let addr = addr
            .parse::<SocketAddr>()
            .with_context(|| format!("PAYMENTS_ADDR is not a socket address: {addr}"))?;

        let database_url = get("DATABASE_URL").unwrap_or_else(|| DEFAULT_DATABASE_URL.into());

        let db_max_connections =
            parse_opt::<u32>(get("DB_MAX_CONNECTIONS"), "DB_MAX_CONNECTIONS")?
                .unwrap_or(DEFAULT_MAX_CONNECTIONS);

        let cache = CachePolicy {
            max_capacity: parse_opt(get("IDEMPO_CACHE_MAX_CAPACITY"), "IDEMPO_CACHE_MAX_CAPACITY")?,
            time_to_live: parse_opt::<u64>(get("IDEMPO_CACHE_TTL_SECS"), "IDEMPO_CACHE_TTL_SECS")?
                .map(Duration::from_secs),
        };

        Ok(Self {
            addr,
            database_url,
            db_max_connections,
            cache,
        })
    }
}

fn parse_opt<T>(raw: Option<String>, key: &str) -> Result<Option<T>>
where
    T: FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
{
    raw.map(|v| {
        v.trim()
            .parse::<T>()
            .with_context(|| format!("{key} has an invalid value: {v}"))
    })
    .transpose()
}
