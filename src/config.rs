use crate::errors::ConfigError;
use std::env;
use std::time::Duration;
use url::Url;

pub const DEFAULT_API_BASE: &str = "http://127.0.0.1:5000/";
pub const DEFAULT_REQUEST_TIMEOUT_SECS: u64 = 10;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClientConfig {
    pub api_base: Url,
    /// Public origin that shareable permalinks point at.
    pub origin: String,
    pub calendar_year: Option<i32>,
    pub request_timeout: Duration,
}

impl ClientConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|name| env::var(name).ok())
    }

    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let read = |name: &str| {
            lookup(name)
                .map(|value| value.trim().to_string())
                .filter(|value| !value.is_empty())
        };

        let api_base = read("RABBIT_API_BASE").unwrap_or_else(|| DEFAULT_API_BASE.to_string());
        let api_base = Url::parse(&api_base)
            .map_err(|err| ConfigError::invalid("RABBIT_API_BASE", err.to_string()))?;
        if api_base.cannot_be_a_base() {
            return Err(ConfigError::invalid("RABBIT_API_BASE", "must be an http(s) url"));
        }

        let origin =
            read("RABBIT_ORIGIN").unwrap_or_else(|| api_base.origin().ascii_serialization());

        let calendar_year = read("RABBIT_CALENDAR_YEAR")
            .map(|value| {
                value
                    .parse::<i32>()
                    .map_err(|err| ConfigError::invalid("RABBIT_CALENDAR_YEAR", err.to_string()))
            })
            .transpose()?;

        let timeout_secs = match read("RABBIT_REQUEST_TIMEOUT_SECS") {
            Some(value) => value
                .parse::<u64>()
                .ok()
                .filter(|secs| *secs > 0)
                .ok_or_else(|| {
                    ConfigError::invalid(
                        "RABBIT_REQUEST_TIMEOUT_SECS",
                        format!("{value} is not a positive number"),
                    )
                })?,
            None => DEFAULT_REQUEST_TIMEOUT_SECS,
        };

        Ok(Self {
            api_base,
            origin,
            calendar_year,
            request_timeout: Duration::from_secs(timeout_secs),
        })
    }
}
