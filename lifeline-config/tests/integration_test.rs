//! Integration tests for lifeline-config

use lifeline_config::*;
use std::io::Write;
use std::time::Duration;
use temp_env::with_vars;

/// Hold the temp-env lock so env-mutating tests cannot leak into file loads
fn without_overrides<R>(f: impl FnOnce() -> R) -> R {
    with_vars(Vec::<(&str, Option<&str>)>::new(), f)
}

#[test]
fn test_default_config_validation() {
    let config = LifelineConfig::default();
    assert!(config.validate_all().is_ok());
}

#[test]
fn test_config_loader_from_env() {
    let vars = vec![
        ("LIFELINE_MAX_RETRIES", Some("5")),
        ("LIFELINE_RETRY_DELAY_MS", Some("250")),
        ("LIFELINE_BACKOFF", Some("fixed")),
        ("LIFELINE_OFFLINE_QUEUE", Some("false")),
        ("LIFELINE_QUEUE_MAX_AGE", Some("3600")),
        ("LIFELINE_CACHE_TTL", Some("60")),
        ("LIFELINE_LOG_LEVEL", Some("debug")),
    ];

    with_vars(vars, || {
        let config = ConfigLoader::new().from_env().unwrap();

        assert_eq!(config.execution.max_retries, 5);
        assert_eq!(config.execution.retry_delay, Duration::from_millis(250));
        assert_eq!(config.execution.backoff, BackoffKind::Fixed);
        assert!(!config.execution.offline_queue);
        assert_eq!(config.queue.max_age, Duration::from_secs(3600));
        assert_eq!(config.cache.default_ttl, Duration::from_secs(60));
        assert_eq!(config.logging.level, LogLevel::Debug);
    });
}

#[test]
fn test_invalid_env_value_reported() {
    with_vars(vec![("LIFELINE_MAX_RETRIES", Some("many"))], || {
        let err = ConfigLoader::new().from_env().unwrap_err();
        assert!(matches!(err, ConfigError::EnvError(_)));
        assert!(err.to_string().contains("LIFELINE_MAX_RETRIES"));
    });

    with_vars(vec![("LIFELINE_BACKOFF", Some("random"))], || {
        assert!(ConfigLoader::new().from_env().is_err());
    });
}

#[test]
fn test_custom_prefix() {
    with_vars(vec![("APP_CACHE_ENABLED", Some("false"))], || {
        let config = ConfigLoader::with_prefix("APP").from_env().unwrap();
        assert!(!config.cache.enabled);
    });
}

#[test]
fn test_yaml_config_serialization() {
    let yaml = LifelineConfig::generate_sample();
    let parsed: LifelineConfig = serde_yaml::from_str(&yaml).unwrap();
    assert!(parsed.validate_all().is_ok());
    assert_eq!(parsed.execution.retry_delay, Duration::from_millis(1000));
    assert_eq!(parsed.execution.max_delay, None);
}

#[test]
fn test_load_yaml_file() {
    let yaml = r#"
execution:
  max_retries: 4
  retry_delay_ms: 100
  max_delay_ms: 5000
  offline_queue: true

queue:
  max_age: 7200

cache:
  default_ttl: 30

connectivity:
  probe_url: "https://status.example.com/ping"
  poll_interval: 15

logging:
  level: warn
  format: json
"#;

    let mut file = tempfile::Builder::new().suffix(".yaml").tempfile().unwrap();
    file.write_all(yaml.as_bytes()).unwrap();

    let config = without_overrides(|| ConfigLoader::new().from_file(file.path())).unwrap();
    assert_eq!(config.execution.max_retries, 4);
    assert_eq!(config.execution.retry_delay, Duration::from_millis(100));
    assert_eq!(config.execution.max_delay, Some(Duration::from_secs(5)));
    assert!(config.execution.retry);
    assert_eq!(config.queue.max_age, Duration::from_secs(7200));
    assert_eq!(config.cache.default_ttl, Duration::from_secs(30));
    assert_eq!(config.connectivity.probe_url, "https://status.example.com/ping");
    assert_eq!(config.connectivity.poll_interval, Duration::from_secs(15));
    assert_eq!(config.logging.format, LogFormat::Json);
}

#[test]
fn test_load_json_file() {
    let json = r#"{ "execution": { "max_retries": 2 }, "cache": { "enabled": false } }"#;

    let mut file = tempfile::Builder::new().suffix(".json").tempfile().unwrap();
    file.write_all(json.as_bytes()).unwrap();

    let config = without_overrides(|| ConfigLoader::new().load(Some(file.path()))).unwrap();
    assert_eq!(config.execution.max_retries, 2);
    assert!(!config.cache.enabled);
}

#[test]
fn test_invalid_file_is_rejected() {
    let yaml = "connectivity:\n  probe_url: \"not a url\"\n";

    let mut file = tempfile::Builder::new().suffix(".yaml").tempfile().unwrap();
    file.write_all(yaml.as_bytes()).unwrap();

    let err = without_overrides(|| ConfigLoader::new().from_file(file.path())).unwrap_err();
    assert!(matches!(err, ConfigError::DomainError { .. }));
}

#[test]
fn test_missing_file() {
    let err = ConfigLoader::new()
        .from_file("/definitely/not/here.yaml")
        .unwrap_err();
    assert!(matches!(err, ConfigError::FileReadError(_)));
}
