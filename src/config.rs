//! Server configuration
//!
//! Defaults suit local development; every field can be overridden from the
//! environment through [`ServerConfig::from_env`].

use {
    crate::error::{ApiError, ApiResult},
    serde::{Deserialize, Serialize},
    std::net::SocketAddr,
};

pub const ENV_HOST: &str = "PERSON_SERVICE_HOST";
pub const ENV_PORT: &str = "PERSON_SERVICE_PORT";
pub const ENV_MAX_BODY: &str = "PERSON_SERVICE_MAX_BODY";
pub const ENV_LOG_FORMAT: &str = "LOG_FORMAT";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    /// Human-readable output for development
    #[default]
    Pretty,
    /// One JSON object per line for log collectors
    Json,
}

impl LogFormat {
    fn parse(value: &str) -> Self {
        if value.eq_ignore_ascii_case("json") {
            Self::Json
        } else {
            Self::Pretty
        }
    }
}

/// Limits applied to incoming requests
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct RequestLimits {
    /// Maximum accepted body size in bytes
    pub max_body_size: u64,
}

impl Default for RequestLimits {
    fn default() -> Self {
        Self {
            max_body_size: 64 * 1024, // 64KB
        }
    }
}

impl RequestLimits {
    /// Tight limits for tests or exposed deployments
    pub fn strict() -> Self {
        Self {
            max_body_size: 4 * 1024, // 4KB
        }
    }
}

/// Server settings; missing fields take their defaults when deserialized.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    pub host: String,
    /// `0` binds an ephemeral port.
    pub port: u16,
    pub limits: RequestLimits,
    pub log_format: LogFormat,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: 8000,
            limits: RequestLimits::default(),
            log_format: LogFormat::default(),
        }
    }
}

impl ServerConfig {
    /// Defaults overridden by `PERSON_SERVICE_*` and `LOG_FORMAT` variables.
    pub fn from_env() -> ApiResult<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Same as [`Self::from_env`] with an arbitrary variable source.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> ApiResult<Self> {
        let mut config = Self::default();

        if let Some(host) = lookup(ENV_HOST) {
            config.host = host;
        }
        if let Some(port) = lookup(ENV_PORT) {
            config.port = port
                .trim()
                .parse()
                .map_err(|e| ApiError::Config(format!("{ENV_PORT}={port:?}: {e}")))?;
        }
        if let Some(max_body) = lookup(ENV_MAX_BODY) {
            config.limits.max_body_size = max_body
                .trim()
                .parse()
                .map_err(|e| ApiError::Config(format!("{ENV_MAX_BODY}={max_body:?}: {e}")))?;
        }
        if let Some(format) = lookup(ENV_LOG_FORMAT) {
            config.log_format = LogFormat::parse(&format);
        }

        config.socket_addr()?;
        Ok(config)
    }

    /// Replace the port; `0` asks the OS for a free one.
    pub fn with_port(mut self, port: u16) -> Self {
        self.port = port;
        self
    }

    /// Replace the request limits.
    pub fn with_limits(mut self, limits: RequestLimits) -> Self {
        self.limits = limits;
        self
    }

    /// Resolve `host:port` into the address to bind.
    pub fn socket_addr(&self) -> ApiResult<SocketAddr> {
        format!("{}:{}", self.host, self.port)
            .parse()
            .map_err(|e| ApiError::Config(format!("invalid address {}:{}: {e}", self.host, self.port)))
    }
}
