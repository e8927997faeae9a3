//! Hub configuration
//!
//! Tunables for the connection hub: outbound queue bound and the heartbeat
//! timing of every session.

use std::time::Duration;
use thiserror::Error;

/// Connection hub configuration
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HubConfig {
    /// Capacity of each session's outbound queue
    pub outbound_capacity: usize,
    /// How often the server pings each client
    pub heartbeat_interval: Duration,
    /// How long a session may go without receiving anything
    pub read_timeout: Duration,
    /// Upper bound on a single frame write
    pub write_timeout: Duration,
    /// Largest inbound frame accepted
    pub max_frame_bytes: usize,
}

impl Default for HubConfig {
    fn default() -> Self {
        Self {
            outbound_capacity: 256,
            heartbeat_interval: Duration::from_secs(54),
            read_timeout: Duration::from_secs(60),
            write_timeout: Duration::from_secs(10),
            max_frame_bytes: 64 * 1024,
        }
    }
}

impl HubConfig {
    /// Create a new HubConfigBuilder
    pub fn builder() -> HubConfigBuilder {
        HubConfigBuilder::default()
    }

    /// Validate the configuration
    ///
    /// The heartbeat must fire before the read deadline expires, otherwise a
    /// healthy idle client would be dropped.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.outbound_capacity == 0 {
            return Err(ConfigError::InvalidValue {
                field: "outbound_capacity",
                reason: "must be at least 1".to_string(),
            });
        }
        for (field, value) in [
            ("heartbeat_interval", self.heartbeat_interval),
            ("read_timeout", self.read_timeout),
            ("write_timeout", self.write_timeout),
        ] {
            if value.is_zero() {
                return Err(ConfigError::InvalidValue {
                    field,
                    reason: "must be non-zero".to_string(),
                });
            }
        }
        if self.heartbeat_interval >= self.read_timeout {
            return Err(ConfigError::InvalidValue {
                field: "heartbeat_interval",
                reason: format!(
                    "{:?} must be shorter than read_timeout {:?}",
                    self.heartbeat_interval, self.read_timeout
                ),
            });
        }
        if self.max_frame_bytes == 0 {
            return Err(ConfigError::InvalidValue {
                field: "max_frame_bytes",
                reason: "must be at least 1".to_string(),
            });
        }
        Ok(())
    }
}

/// Builder for HubConfig
#[derive(Debug, Default)]
pub struct HubConfigBuilder {
    outbound_capacity: Option<usize>,
    heartbeat_interval: Option<Duration>,
    read_timeout: Option<Duration>,
    write_timeout: Option<Duration>,
    max_frame_bytes: Option<usize>,
}

impl HubConfigBuilder {
    pub fn outbound_capacity(mut self, capacity: usize) -> Self {
        self.outbound_capacity = Some(capacity);
        self
    }

    pub fn heartbeat_interval(mut self, interval: Duration) -> Self {
        self.heartbeat_interval = Some(interval);
        self
    }

    pub fn read_timeout(mut self, timeout: Duration) -> Self {
        self.read_timeout = Some(timeout);
        self
    }

    pub fn write_timeout(mut self, timeout: Duration) -> Self {
        self.write_timeout = Some(timeout);
        self
    }

    pub fn max_frame_bytes(mut self, bytes: usize) -> Self {
        self.max_frame_bytes = Some(bytes);
        self
    }

    /// Build the configuration, filling unset values with defaults
    pub fn build(self) -> Result<HubConfig, ConfigError> {
        let defaults = HubConfig::default();
        let config = HubConfig {
            outbound_capacity: self.outbound_capacity.unwrap_or(defaults.outbound_capacity),
            heartbeat_interval: self.heartbeat_interval.unwrap_or(defaults.heartbeat_interval),
            read_timeout: self.read_timeout.unwrap_or(defaults.read_timeout),
            write_timeout: self.write_timeout.unwrap_or(defaults.write_timeout),
            max_frame_bytes: self.max_frame_bytes.unwrap_or(defaults.max_frame_bytes),
        };
        config.validate()?;
        Ok(config)
    }
}

/// Configuration errors
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("invalid value for {field}: {reason}")]
    InvalidValue { field: &'static str, reason: String },
    #[error("could not parse {field}: {value}")]
    Unparseable { field: &'static str, value: String },
}
