use std::net::SocketAddr;
use std::str::FromStr;
use std::time::Duration;

use bon::Builder;

use crate::{DEFAULT_ADDR, DEFAULT_ENDPOINT};

/// Environment variable holding the server listen address.
pub const ADDR_VAR: &str = "CALC_ADDR";
/// Environment variable holding the client endpoint URL.
pub const ENDPOINT_VAR: &str = "CALC_ENDPOINT";
/// Environment variable holding the per-message pacing delay in milliseconds.
pub const PACING_VAR: &str = "CALC_PACING_MS";
/// Environment variable holding the capacity of outbound channels.
pub const OUTBOUND_BUFFER_VAR: &str = "CALC_OUTBOUND_BUFFER";

/// Indicates that a configuration value taken from the environment could not be parsed.
#[derive(Debug, thiserror::Error)]
#[error("invalid value {value:?} for {var}: {reason}")]
pub struct ConfigError {
    pub var: &'static str,
    pub value: String,
    pub reason: String,
}

/// Configuration for the calculator server.
#[derive(Debug, Clone, Builder)]
pub struct ServerConfig {
    /// Address the gRPC server listens on.
    #[builder(default = default_addr())]
    pub addr: SocketAddr,

    /// Delay applied after every streamed message. Zero disables pacing.
    #[builder(default = Duration::ZERO)]
    pub pacing: Duration,

    /// Capacity of the channel between a streaming call and its response stream.
    #[builder(default = 16)]
    pub outbound_buffer: usize,
}

impl ServerConfig {
    /// Build the configuration from `CALC_ADDR`, `CALC_PACING_MS` and `CALC_OUTBOUND_BUFFER`,
    /// falling back to defaults for unset variables.
    pub fn from_env() -> Result<Self, ConfigError> {
        Ok(Self::builder()
            .maybe_addr(env_parse(ADDR_VAR)?)
            .maybe_pacing(env_parse(PACING_VAR)?.map(Duration::from_millis))
            .maybe_outbound_buffer(env_parse(OUTBOUND_BUFFER_VAR)?)
            .build())
    }
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self::builder().build()
    }
}

/// Configuration for the calculator client.
#[derive(Debug, Clone, Builder)]
pub struct ClientConfig {
    /// URL of the calculator server, e.g. `http://[::1]:50051`.
    #[builder(into, default = DEFAULT_ENDPOINT.to_string())]
    pub endpoint: String,

    /// Delay between streamed requests. Zero disables pacing.
    #[builder(default = Duration::ZERO)]
    pub pacing: Duration,
}

impl ClientConfig {
    /// Build the configuration from `CALC_ENDPOINT` and `CALC_PACING_MS`.
    pub fn from_env() -> Result<Self, ConfigError> {
        Ok(Self::builder()
            .maybe_endpoint(std::env::var(ENDPOINT_VAR).ok())
            .maybe_pacing(env_parse(PACING_VAR)?.map(Duration::from_millis))
            .build())
    }
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self::builder().build()
    }
}

fn default_addr() -> SocketAddr {
    DEFAULT_ADDR
        .parse()
        .unwrap_or_else(|_| SocketAddr::from(([0, 0, 0, 0, 0, 0, 0, 1], 50051)))
}

fn env_parse<T>(var: &'static str) -> Result<Option<T>, ConfigError>
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    let Ok(value) = std::env::var(var) else {
        return Ok(None);
    };

    value.trim().parse().map(Some).map_err(|e: T::Err| ConfigError {
        var,
        reason: e.to_string(),
        value,
    })
}
