//! Server configuration.
//!
//! Everything comes from environment variables (optionally seeded from a
//! `.env` file). Upstream tokens can also be read from secret files, which is
//! how the container deployment mounts them.

use std::net::{IpAddr, Ipv4Addr};
use std::path::{Path, PathBuf};
use std::time::Duration;

use thiserror::Error;
use upstream_client::{UpstreamConfig, NEWS_API_BASE_URL, TIINGO_BASE_URL};

const DEFAULT_PORT: u16 = 8080;
const DEFAULT_TIINGO_TOKEN_FILE: &str = "api_tiingo";
const DEFAULT_NEWS_API_TOKEN_FILE: &str = "news_api";

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Unable to read secret from: {path}: {source}")]
    SecretUnreadable {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Secret file {0} is empty")]
    SecretEmpty(PathBuf),

    #[error("Invalid value for {key}: {value:?}")]
    InvalidValue { key: &'static str, value: String },
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum LogFormat {
    #[default]
    Pretty,
    Json,
}

impl LogFormat {
    fn from_lookup(lookup: &dyn Fn(&str) -> Option<String>) -> Self {
        match lookup("LOG_FORMAT") {
            Some(v) if v.eq_ignore_ascii_case("json") => LogFormat::Json,
            _ => LogFormat::Pretty,
        }
    }
}

#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub bind_addr: IpAddr,
    pub port: u16,
    pub log_format: LogFormat,
    pub upstream: UpstreamConfig,
}

impl ServerConfig {
    /// Load from environment variables.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Load from an arbitrary key lookup. Empty values count as unset.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let get = |key: &str| lookup(key).map(|v| v.trim().to_string()).filter(|v| !v.is_empty());

        let port = match get("PORT") {
            Some(raw) => raw.parse::<u16>().map_err(|_| ConfigError::InvalidValue {
                key: "PORT",
                value: raw,
            })?,
            None => DEFAULT_PORT,
        };

        let bind_addr = match get("BIND_ADDR") {
            Some(raw) => raw.parse::<IpAddr>().map_err(|_| ConfigError::InvalidValue {
                key: "BIND_ADDR",
                value: raw,
            })?,
            None => IpAddr::V4(Ipv4Addr::UNSPECIFIED),
        };

        let timeout = match get("UPSTREAM_TIMEOUT_SECS") {
            Some(raw) => match raw.parse::<u64>() {
                Ok(secs) if secs > 0 => Some(Duration::from_secs(secs)),
                _ => {
                    return Err(ConfigError::InvalidValue {
                        key: "UPSTREAM_TIMEOUT_SECS",
                        value: raw,
                    })
                }
            },
            None => None,
        };

        let check_article_urls = match get("ARTICLE_REACHABILITY_CHECKS") {
            Some(raw) => parse_flag(&raw).ok_or(ConfigError::InvalidValue {
                key: "ARTICLE_REACHABILITY_CHECKS",
                value: raw,
            })?,
            None => true,
        };

        let tiingo_token = match get("TIINGO_API_TOKEN") {
            Some(token) => token,
            None => read_secret(Path::new(
                &get("TIINGO_TOKEN_FILE").unwrap_or_else(|| DEFAULT_TIINGO_TOKEN_FILE.to_string()),
            ))?,
        };
        let news_api_token = match get("NEWS_API_TOKEN") {
            Some(token) => token,
            None => read_secret(Path::new(
                &get("NEWS_API_TOKEN_FILE")
                    .unwrap_or_else(|| DEFAULT_NEWS_API_TOKEN_FILE.to_string()),
            ))?,
        };

        let upstream = UpstreamConfig {
            tiingo_token,
            news_api_token,
            tiingo_base_url: get("TIINGO_BASE_URL").unwrap_or_else(|| TIINGO_BASE_URL.to_string()),
            news_api_base_url: get("NEWS_API_BASE_URL")
                .unwrap_or_else(|| NEWS_API_BASE_URL.to_string()),
            timeout,
            check_article_urls,
        };

        Ok(Self {
            bind_addr,
            port,
            log_format: LogFormat::from_lookup(&|key| lookup(key)),
            upstream,
        })
    }
}

fn parse_flag(raw: &str) -> Option<bool> {
    match raw.to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Some(true),
        "0" | "false" | "no" | "off" => Some(false),
        _ => None,
    }
}

/// Reads a token from a secret file, trimming the trailing newline editors
/// and `kubectl create secret` leave behind.
pub fn read_secret(path: &Path) -> Result<String, ConfigError> {
    let raw = std::fs::read_to_string(path).map_err(|source| ConfigError::SecretUnreadable {
        path: path.to_path_buf(),
        source,
    })?;

    let secret = raw.trim();
    if secret.is_empty() {
        return Err(ConfigError::SecretEmpty(path.to_path_buf()));
    }
    Ok(secret.to_string())
}
