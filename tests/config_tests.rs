use std::time::Duration;

use dormant::error::{ConfigError, Error};
use dormant::infrastructure::config::settings::Config;

fn write_temp_config(dir: &tempfile::TempDir, contents: &str) -> std::path::PathBuf {
    let path = dir.path().join("dormant.toml");
    std::fs::write(&path, contents).expect("write temp config");
    path
}

#[test]
fn full_config_file_loads() {
    let dir = tempfile::tempdir().unwrap();
    let path = write_temp_config(
        &dir,
        r#"
[logging]
level = "debug"
format = "json"

[sessions]
default_duration_secs = 600
expiration_interval_secs = 5

[strategy]
ready_poll_interval_ms = 1000
blocking_timeout_secs = 30

[provider]
auto_stop_on_startup = false
timeout_secs = 10
group_refresh_interval_ms = 4000
stop_concurrency = 2

[storage]
file = "sessions.json"
"#,
    );

    let config = Config::load(&path).unwrap();
    assert_eq!(config.logging.level, "debug");
    assert_eq!(config.sessions.expiration_interval(), Duration::from_secs(5));
    assert_eq!(config.strategy.blocking_timeout(), Duration::from_secs(30));
    assert!(!config.provider.auto_stop_on_startup);
    assert!(config.storage.file.is_some());

    let session = config.session_config();
    assert_eq!(session.default_duration, Duration::from_secs(600));
    assert_eq!(session.ready_poll_interval, Duration::from_secs(1));
    assert_eq!(session.blocking_timeout, Duration::from_secs(30));
    assert_eq!(session.group_refresh_interval, Duration::from_secs(4));
    assert_eq!(session.provider_timeout, Duration::from_secs(10));
    assert_eq!(session.stop_concurrency, 2);
}

#[test]
fn config_rejects_zero_blocking_timeout() {
    let dir = tempfile::tempdir().unwrap();
    let path = write_temp_config(&dir, "[strategy]\nblocking_timeout_secs = 0\n");

    match Config::load(&path) {
        Err(Error::Config(inner)) => match inner.as_ref() {
            ConfigError::InvalidValue {
                field: "blocking_timeout_secs",
                ..
            } => {}
            other => panic!("expected invalid blocking timeout, got {other}"),
        },
        Err(err) => panic!("expected config error, got {err}"),
        Ok(config) => panic!(
            "expected zero timeout to be rejected, got {:?}",
            config.strategy
        ),
    }
}

#[test]
fn config_rejects_wrong_types() {
    let dir = tempfile::tempdir().unwrap();
    let path = write_temp_config(&dir, "[provider]\ntimeout_secs = \"soon\"\n");
    assert!(Config::load(&path).is_err());
}
