//! Bridge configuration
//!
//! Configuration is a small YAML document. Every key is optional; missing keys
//! fall back to the defaults below, which match a trainer listening on
//! loopback port 65432.
//!
//! ```yaml
//! host: 127.0.0.1
//! port: 65432
//! connect_timeout_ms: 250
//! write_timeout_ms: 100
//! max_consecutive_send_failures: 3
//! record_terminator: none     # or `newline`
//! tick_rate_hz: 60.0
//! log_filter: info
//! ```

use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;

use crate::codec::RecordTerminator;
use crate::{BridgeError, Result};

pub const DEFAULT_HOST: &str = "127.0.0.1";
pub const DEFAULT_PORT: u16 = 65432;

/// Upper bound on the standalone tick rate; hosts rarely exceed a few hundred Hz.
const MAX_TICK_RATE_HZ: f64 = 1000.0;

/// Settings for the streaming client and the standalone driver.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct BridgeConfig {
    /// Trainer host name or IP address
    pub host: String,

    /// Trainer TCP port
    pub port: u16,

    /// Upper bound on a single blocking handshake
    pub connect_timeout_ms: u64,

    /// Upper bound on a single record write
    pub write_timeout_ms: u64,

    /// Consecutive failed writes after which training is stopped
    pub max_consecutive_send_failures: u32,

    /// Record terminator appended after every frame
    pub record_terminator: RecordTerminator,

    /// Tick rate used by the standalone driver
    pub tick_rate_hz: f64,

    /// Default `tracing` filter when `RUST_LOG` is not set
    pub log_filter: String,
}

impl Default for BridgeConfig {
    fn default() -> Self {
        Self {
            host: DEFAULT_HOST.to_string(),
            port: DEFAULT_PORT,
            connect_timeout_ms: 250,
            write_timeout_ms: 100,
            max_consecutive_send_failures: 3,
            record_terminator: RecordTerminator::None,
            tick_rate_hz: 60.0,
            log_filter: "info".to_string(),
        }
    }
}

impl BridgeConfig {
    /// Parse and validate a YAML document.
    pub fn from_yaml_str(yaml: &str) -> Result<Self> {
        // An empty document means "all defaults"
        let config: Self =
            if yaml.trim().is_empty() { Self::default() } else { serde_yaml_ng::from_str(yaml)? };
        config.validate()?;
        Ok(config)
    }

    /// Read, parse and validate a YAML file.
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let yaml = std::fs::read_to_string(path)
            .map_err(|e| BridgeError::file_error(path.to_path_buf(), e))?;
        Self::from_yaml_str(&yaml)
    }

    /// Check values for consistency.
    pub fn validate(&self) -> Result<()> {
        if self.host.trim().is_empty() {
            return Err(BridgeError::config_invalid("host must not be empty"));
        }
        if self.port == 0 {
            return Err(BridgeError::config_invalid("port must be non-zero"));
        }
        if self.connect_timeout_ms == 0 {
            return Err(BridgeError::config_invalid("connect_timeout_ms must be non-zero"));
        }
        if self.write_timeout_ms == 0 {
            return Err(BridgeError::config_invalid("write_timeout_ms must be non-zero"));
        }
        if self.max_consecutive_send_failures == 0 {
            return Err(BridgeError::config_invalid(
                "max_consecutive_send_failures must be at least 1",
            ));
        }
        if !self.tick_rate_hz.is_finite()
            || self.tick_rate_hz <= 0.0
            || self.tick_rate_hz > MAX_TICK_RATE_HZ
        {
            return Err(BridgeError::config_invalid(format!(
                "tick_rate_hz must be in (0, {}], got {}",
                MAX_TICK_RATE_HZ, self.tick_rate_hz
            )));
        }
        Ok(())
    }

    /// `host:port` string used in logs and errors.
    pub fn endpoint(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }

    pub fn connect_timeout(&self) -> Duration {
        Duration::from_millis(self.connect_timeout_ms)
    }

    pub fn write_timeout(&self) -> Duration {
        Duration::from_millis(self.write_timeout_ms)
    }

    /// Interval between driver ticks.
    pub fn tick_interval(&self) -> Duration {
        Duration::from_secs_f64(1.0 / self.tick_rate_hz)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn defaults_point_at_loopback_trainer() {
        let config = BridgeConfig::default();
        assert_eq!(config.endpoint(), "127.0.0.1:65432");
        assert_eq!(config.record_terminator, RecordTerminator::None);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn empty_document_yields_defaults() {
        let config = BridgeConfig::from_yaml_str("   \n").expect("empty YAML is valid");
        assert_eq!(config, BridgeConfig::default());
    }

    #[test]
    fn yaml_overrides_individual_keys() {
        let yaml = "port: 7000\nrecord_terminator: newline\ntick_rate_hz: 30\n";
        let config = BridgeConfig::from_yaml_str(yaml).expect("valid YAML");

        assert_eq!(config.port, 7000);
        assert_eq!(config.host, DEFAULT_HOST);
        assert_eq!(config.record_terminator, RecordTerminator::Newline);
        assert_eq!(config.tick_interval(), Duration::from_secs_f64(1.0 / 30.0));
    }

    #[test]
    fn unknown_keys_are_rejected() {
        let err = BridgeConfig::from_yaml_str("hots: 10.0.0.1\n").unwrap_err();
        assert!(matches!(err, BridgeError::Parse { .. }));
    }

    #[test]
    fn invalid_values_fail_validation() {
        let cases = [
            "host: ''\n",
            "port: 0\n",
            "connect_timeout_ms: 0\n",
            "write_timeout_ms: 0\n",
            "max_consecutive_send_failures: 0\n",
            "tick_rate_hz: 0\n",
            "tick_rate_hz: 5000\n",
        ];

        for yaml in cases {
            let err = BridgeConfig::from_yaml_str(yaml).unwrap_err();
            assert!(matches!(err, BridgeError::Config { .. }), "{yaml:?} gave {err:?}");
        }
    }

    #[test]
    fn loads_from_file() {
        let mut file = tempfile::NamedTempFile::new().expect("temp file");
        writeln!(file, "host: localhost\nport: 5555").expect("write config");

        let config = BridgeConfig::from_file(file.path()).expect("config loads");
        assert_eq!(config.endpoint(), "localhost:5555");
    }

    #[test]
    fn missing_file_reports_path() {
        let err = BridgeConfig::from_file("/nonexistent/acrl-bridge.yaml").unwrap_err();
        match err {
            BridgeError::File { path, .. } => {
                assert_eq!(path, Path::new("/nonexistent/acrl-bridge.yaml"));
            }
            other => panic!("Expected File error, got {other:?}"),
        }
    }
}
