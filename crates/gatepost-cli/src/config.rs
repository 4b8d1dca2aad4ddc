//! Configuration loading from TOML files
//!
//! The file path comes from `--config` (default `gatepost.toml`). Every
//! section except `[terminal]`, `[tag_reader]`, `[fingerprint]`, `[report]`
//! and `[relay]` is optional, as are most keys:
//!
//! ```toml
//! [terminal]
//! identity_file = "/var/lib/gatepost/identity"
//! tick_interval_ms = 50
//! # removal_timeout_ms = 30000
//!
//! [tag_reader]
//! port = "/dev/ttyUSB0"
//! baud_rate = 9600
//!
//! [fingerprint]
//! port = "/dev/ttyS0"
//! baud_rate = 57600
//! address = 0xFFFFFFFF
//! password = 0
//!
//! [report]
//! url = "http://10.0.0.5:8080/api/access"
//! timeout_ms = 5000
//!
//! [relay]
//! gpio = 17
//! active_low = false
//!
//! [button]
//! gpio = 27
//! active_low = true
//! ```

use gatepost_biometric::R30xConfig;
use gatepost_core::constants::{DEFAULT_REPORT_TIMEOUT_MS, DEFAULT_TICK_INTERVAL_MS};
use gatepost_network::ReporterConfig;
use gatepost_rfid::SerialTagReaderConfig;
use gatepost_terminal::PipelineConfig;
use reqwest::Url;
use serde::Deserialize;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;
use thiserror::Error;

/// Errors loading the configuration
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Cannot read {path}: {source}")]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("Invalid TOML: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Invalid configuration: {0}")]
    Invalid(String),
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct TerminalConfig {
    pub identity_file: PathBuf,
    #[serde(default = "default_tick_interval_ms")]
    pub tick_interval_ms: u64,
    /// Bound on waiting for finger removal during enrollment; absent waits
    /// indefinitely.
    #[serde(default)]
    pub removal_timeout_ms: Option<u64>,
}

fn default_tick_interval_ms() -> u64 {
    DEFAULT_TICK_INTERVAL_MS
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct TagReaderConfig {
    pub port: String,
    #[serde(default = "default_tag_baud")]
    pub baud_rate: u32,
}

fn default_tag_baud() -> u32 {
    9600
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct FingerprintConfig {
    pub port: String,
    #[serde(default = "default_fingerprint_baud")]
    pub baud_rate: u32,
    #[serde(default = "default_fingerprint_address")]
    pub address: u32,
    #[serde(default)]
    pub password: u32,
}

fn default_fingerprint_baud() -> u32 {
    57600
}

fn default_fingerprint_address() -> u32 {
    0xFFFF_FFFF
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct ReportConfig {
    pub url: String,
    #[serde(default = "default_report_timeout_ms")]
    pub timeout_ms: u64,
}

fn default_report_timeout_ms() -> u64 {
    DEFAULT_REPORT_TIMEOUT_MS
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct RelayConfig {
    pub gpio: u32,
    #[serde(default)]
    pub active_low: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct ButtonConfig {
    pub gpio: u32,
    #[serde(default = "default_button_active_low")]
    pub active_low: bool,
}

fn default_button_active_low() -> bool {
    true
}

/// Complete terminal configuration
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct Config {
    pub terminal: TerminalConfig,
    pub tag_reader: TagReaderConfig,
    pub fingerprint: FingerprintConfig,
    pub report: ReportConfig,
    pub relay: RelayConfig,
    #[serde(default)]
    pub button: Option<ButtonConfig>,
}

impl Config {
    /// Load and validate a configuration file
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let content = fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        Self::parse(&content)
    }

    /// Parse and validate configuration text
    pub fn parse(content: &str) -> Result<Self, ConfigError> {
        let config: Config = toml::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    fn validate(&self) -> Result<(), ConfigError> {
        if self.terminal.identity_file.as_os_str().is_empty() {
            return Err(ConfigError::Invalid("terminal.identity_file is empty".into()));
        }
        if self.terminal.tick_interval_ms == 0 {
            return Err(ConfigError::Invalid("terminal.tick_interval_ms must be > 0".into()));
        }
        if self.tag_reader.port.trim().is_empty() {
            return Err(ConfigError::Invalid("tag_reader.port is empty".into()));
        }
        if self.tag_reader.baud_rate == 0 {
            return Err(ConfigError::Invalid("tag_reader.baud_rate must be > 0".into()));
        }
        if self.fingerprint.port.trim().is_empty() {
            return Err(ConfigError::Invalid("fingerprint.port is empty".into()));
        }
        if self.fingerprint.baud_rate == 0 {
            return Err(ConfigError::Invalid("fingerprint.baud_rate must be > 0".into()));
        }

        let url = Url::parse(self.report.url.trim()).map_err(|e| {
            ConfigError::Invalid(format!("report.url {:?}: {e}", self.report.url))
        })?;
        if !matches!(url.scheme(), "http" | "https") || url.host_str().is_none() {
            return Err(ConfigError::Invalid(format!(
                "report.url must be an http(s) URL with a host, got {:?}",
                self.report.url
            )));
        }
        if self.report.timeout_ms == 0 {
            return Err(ConfigError::Invalid("report.timeout_ms must be > 0".into()));
        }

        if let Some(button) = &self.button
            && button.gpio == self.relay.gpio
        {
            return Err(ConfigError::Invalid(format!(
                "button and relay both use GPIO {}",
                button.gpio
            )));
        }

        Ok(())
    }

    pub fn tick_interval(&self) -> Duration {
        Duration::from_millis(self.terminal.tick_interval_ms)
    }

    pub fn pipeline_config(&self) -> PipelineConfig {
        PipelineConfig {
            removal_timeout: self.terminal.removal_timeout_ms.map(Duration::from_millis),
            ..PipelineConfig::default()
        }
    }

    pub fn tag_reader_config(&self) -> SerialTagReaderConfig {
        SerialTagReaderConfig {
            port: self.tag_reader.port.clone(),
            baud_rate: self.tag_reader.baud_rate,
        }
    }

    pub fn r30x_config(&self) -> R30xConfig {
        R30xConfig {
            address: self.fingerprint.address,
            password: self.fingerprint.password,
            ..R30xConfig::default()
        }
    }

    pub fn reporter_config(&self) -> ReporterConfig {
        ReporterConfig {
            url: self.report.url.trim().to_string(),
            timeout: Duration::from_millis(self.report.timeout_ms),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    const MINIMAL: &str = r#"
[terminal]
identity_file = "/var/lib/gatepost/identity"

[tag_reader]
port = "/dev/ttyUSB0"

[fingerprint]
port = "/dev/ttyS0"

[report]
url = "http://10.0.0.5:8080/api/access"

[relay]
gpio = 17
"#;

    #[test]
    fn test_defaults() {
        let config = Config::parse(MINIMAL).unwrap();

        assert_eq!(config.terminal.tick_interval_ms, 50);
        assert_eq!(config.terminal.removal_timeout_ms, None);
        assert_eq!(config.tag_reader.baud_rate, 9600);
        assert_eq!(config.fingerprint.baud_rate, 57600);
        assert_eq!(config.fingerprint.address, 0xFFFF_FFFF);
        assert_eq!(config.fingerprint.password, 0);
        assert_eq!(config.report.timeout_ms, 5000);
        assert!(!config.relay.active_low);
        assert_eq!(config.button, None);

        assert_eq!(config.pipeline_config(), PipelineConfig::default());
        assert_eq!(config.reporter_config().timeout, Duration::from_secs(5));
    }

    #[test]
    fn test_removal_timeout_reaches_pipeline() {
        let text = MINIMAL.replace(
            "identity_file = \"/var/lib/gatepost/identity\"",
            "identity_file = \"/var/lib/gatepost/identity\"\nremoval_timeout_ms = 15000",
        );
        let config = Config::parse(&text).unwrap();

        assert_eq!(
            config.pipeline_config().removal_timeout,
            Some(Duration::from_secs(15))
        );
    }

    #[rstest]
    #[case("url = \"http://10.0.0.5:8080/api/access\"", "url = \"ftp://10.0.0.5/\"")]
    #[case("url = \"http://10.0.0.5:8080/api/access\"", "url = \"\"")]
    #[case("url = \"http://10.0.0.5:8080/api/access\"", "url = \"http://\"")]
    #[case("url = \"http://10.0.0.5:8080/api/access\"", "url = \"http://:8080/api\"")]
    #[case("url = \"http://10.0.0.5:8080/api/access\"", "url = \"http://bad host/\"")]
    #[case("url = \"http://10.0.0.5:8080/api/access\"", "url = \"10.0.0.5:8080/api\"")]
    #[case("port = \"/dev/ttyUSB0\"", "port = \"  \"")]
    #[case("port = \"/dev/ttyUSB0\"", "port = \"/dev/ttyUSB0\"\nbaud_rate = 0")]
    #[case("[relay]\ngpio = 17", "[relay]\ngpio = 17\n[button]\ngpio = 17")]
    fn test_invalid_values(#[case] from: &str, #[case] to: &str) {
        let text = MINIMAL.replace(from, to);
        assert!(matches!(Config::parse(&text), Err(ConfigError::Invalid(_))));
    }

    #[test]
    fn test_missing_section_is_parse_error() {
        let text = MINIMAL.replace("[relay]\ngpio = 17", "");
        assert!(matches!(Config::parse(&text), Err(ConfigError::Parse(_))));
    }
}
