//! Integration tests for configuration loading

use gatepost_cli::config::ButtonConfig;
use gatepost_cli::{Config, ConfigError};
use std::io::Write;
use std::time::Duration;
use tempfile::NamedTempFile;

#[test]
fn test_load_config_from_file() {
    let mut temp_file = NamedTempFile::new().unwrap();

    let config_content = r#"
[terminal]
identity_file = "/tmp/gatepost-identity"
tick_interval_ms = 20
removal_timeout_ms = 30000

[tag_reader]
port = "/dev/ttyAMA0"
baud_rate = 19200

[fingerprint]
port = "/dev/ttyUSB1"
baud_rate = 115200
address = 0x12345678
password = 42

[report]
url = "https://authority.example/api/access"
timeout_ms = 2500

[relay]
gpio = 22
active_low = true

[button]
gpio = 23
"#;

    temp_file.write_all(config_content.as_bytes()).unwrap();
    temp_file.flush().unwrap();

    let config = Config::from_file(temp_file.path()).unwrap();

    assert_eq!(config.tick_interval(), Duration::from_millis(20));
    assert_eq!(
        config.pipeline_config().removal_timeout,
        Some(Duration::from_secs(30))
    );

    let tags = config.tag_reader_config();
    assert_eq!(tags.port, "/dev/ttyAMA0");
    assert_eq!(tags.baud_rate, 19200);

    let sensor = config.r30x_config();
    assert_eq!(sensor.address, 0x1234_5678);
    assert_eq!(sensor.password, 42);
    assert_eq!(config.fingerprint.baud_rate, 115_200);

    let reporter = config.reporter_config();
    assert_eq!(reporter.url, "https://authority.example/api/access");
    assert_eq!(reporter.timeout, Duration::from_millis(2500));

    assert!(config.relay.active_low);
    assert_eq!(
        config.button,
        Some(ButtonConfig {
            gpio: 23,
            active_low: true
        })
    );
}

#[test]
fn test_missing_file() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("absent.toml");

    match Config::from_file(&path) {
        Err(ConfigError::Read { path: reported, .. }) => assert_eq!(reported, path),
        other => panic!("expected read error, got {other:?}"),
    }
}

#[test]
fn test_broken_toml() {
    let mut temp_file = NamedTempFile::new().unwrap();
    temp_file.write_all(b"[terminal\nidentity_file = ").unwrap();
    temp_file.flush().unwrap();

    assert!(matches!(
        Config::from_file(temp_file.path()),
        Err(ConfigError::Parse(_))
    ));
}
