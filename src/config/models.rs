// src/config/models.rs
use serde::{Deserialize, Serialize};
use std::net::{IpAddr, Ipv4Addr, SocketAddr};
use std::time::Duration;
use url::Url;

pub const DEFAULT_LISTEN_PORT: u16 = 31998;
pub const DEFAULT_AGENT_ADDRESS: &str = "127.0.0.1:8500";
pub const DEFAULT_AGENT_TIMEOUT_SECS: u64 = 10;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub listen_address: IpAddr,
    pub listen_port: u16,
    /// Consul agent `host:port`, without scheme.
    pub agent_address: String,
    pub agent_timeout_secs: u64,
    pub metrics: MetricsConfig,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MetricsConfig {
    pub enabled: bool,
    pub port: u16,
    pub path: String,
}

/// Values supplied on the command line or through the environment.
/// Anything left as `None` keeps the value from the file or the defaults.
#[derive(Debug, Clone, Default)]
pub struct ConfigOverrides {
    pub listen_address: Option<IpAddr>,
    pub listen_port: Option<u16>,
    pub agent_address: Option<String>,
    pub agent_timeout_secs: Option<u64>,
    pub metrics_port: Option<u16>,
}

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("invalid agent address {0:?}, expected host:port")]
    InvalidAgentAddress(String),

    #[error("listen port must be non-zero")]
    InvalidListenPort,

    #[error("agent timeout must be at least one second")]
    InvalidAgentTimeout,

    #[error("metrics port {0} collides with the health endpoint port")]
    MetricsPortConflict(u16),

    #[error("metrics path {0:?} must start with '/'")]
    InvalidMetricsPath(String),
}

impl Default for Config {
    fn default() -> Self {
        Self {
            listen_address: IpAddr::V4(Ipv4Addr::UNSPECIFIED),
            listen_port: DEFAULT_LISTEN_PORT,
            agent_address: DEFAULT_AGENT_ADDRESS.to_string(),
            agent_timeout_secs: DEFAULT_AGENT_TIMEOUT_SECS,
            metrics: MetricsConfig::default(),
        }
    }
}

impl Default for MetricsConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            port: 9090,
            path: "/metrics".to_string(),
        }
    }
}

impl Config {
    pub fn listen_addr(&self) -> SocketAddr {
        SocketAddr::new(self.listen_address, self.listen_port)
    }

    pub fn metrics_addr(&self) -> SocketAddr {
        SocketAddr::new(self.listen_address, self.metrics.port)
    }

    pub fn agent_timeout(&self) -> Duration {
        Duration::from_secs(self.agent_timeout_secs)
    }

    /// Full URL of the agent's check listing endpoint.
    pub fn agent_checks_url(&self) -> Result<Url, ConfigError> {
        let invalid = || ConfigError::InvalidAgentAddress(self.agent_address.clone());

        let address = self.agent_address.trim();
        if address.is_empty() || address.contains(['/', '?', '#', '@']) {
            return Err(invalid());
        }

        let url = Url::parse(&format!("http://{address}/v1/agent/checks")).map_err(|_| invalid())?;
        if url.host_str().is_none()
            || url.path() != "/v1/agent/checks"
            || url.query().is_some()
            || url.fragment().is_some()
        {
            return Err(invalid());
        }
        Ok(url)
    }

    pub fn with_overrides(mut self, overrides: ConfigOverrides) -> Self {
        if let Some(address) = overrides.listen_address {
            self.listen_address = address;
        }
        if let Some(port) = overrides.listen_port {
            self.listen_port = port;
        }
        if let Some(agent) = overrides.agent_address {
            self.agent_address = agent;
        }
        if let Some(secs) = overrides.agent_timeout_secs {
            self.agent_timeout_secs = secs;
        }
        if let Some(port) = overrides.metrics_port {
            self.metrics.enabled = true;
            self.metrics.port = port;
        }
        self
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.listen_port == 0 {
            return Err(ConfigError::InvalidListenPort);
        }
        if self.agent_timeout_secs == 0 {
            return Err(ConfigError::InvalidAgentTimeout);
        }
        self.agent_checks_url()?;

        if self.metrics.enabled {
            if self.metrics.port == self.listen_port {
                return Err(ConfigError::MetricsPortConflict(self.metrics.port));
            }
            if !self.metrics.path.starts_with('/') {
                return Err(ConfigError::InvalidMetricsPath(self.metrics.path.clone()));
            }
        }
        Ok(())
    }
}
