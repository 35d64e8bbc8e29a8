mod common;

use bcflow::config::{Config, ConfigError};
use bcflow::{Engine, EngineError};
use common::temp_config;

/// Test that Config::default() produces the expected values.
#[test]
fn test_config_default_values() {
    let config = Config::default();

    assert_eq!(config.api.base_url, "http://127.0.0.1:8080/api/v1");
    assert_eq!(config.api.timeout_seconds, 30);
    assert_eq!(config.api.connect_timeout_seconds, 5);

    assert_eq!(config.engine.page_limit, 30);
    assert_eq!(config.engine.hierarchy_max_depth, 10);
    assert!(config.engine.autosave);
    assert_eq!(config.engine.required_field_message, "This field is mandatory");

    assert_eq!(config.logging.filter, "info");
}

/// Test that Config::config_path() returns a path ending with the expected filename.
#[test]
fn test_config_path_ends_with_expected() {
    let path = Config::config_path();
    assert!(path.ends_with("bcflow/config.toml"));
}

/// Test that a missing file falls back to defaults.
#[test]
fn test_missing_file_yields_default() {
    let dir = tempfile::TempDir::new().unwrap();
    let config = Config::load_from(&dir.path().join("absent.toml")).unwrap();
    assert_eq!(config, Config::default());
}

/// Test that a partial file keeps defaults for everything it leaves out.
#[test]
fn test_partial_file_merges_with_defaults() {
    let (_dir, path) = temp_config(
        r#"
[api]
base_url = "https://crm.example.com/api/v1"

[engine]
page_limit = 50
autosave = false
"#,
    );

    let config = Config::load_from(&path).unwrap();
    assert_eq!(config.api.base_url, "https://crm.example.com/api/v1");
    assert_eq!(config.api.timeout_seconds, 30);
    assert_eq!(config.engine.page_limit, 50);
    assert!(!config.engine.autosave);
    assert_eq!(config.engine.hierarchy_max_depth, 10);
}

/// Test that malformed TOML reports a parse error with the path.
#[test]
fn test_malformed_file_is_parse_error() {
    let (_dir, path) = temp_config("[api\nbase_url = ");

    match Config::load_from(&path) {
        Err(ConfigError::ParseError { path: reported, .. }) => assert_eq!(reported, path),
        other => panic!("Expected ParseError, got {:?}", other),
    }
}

/// Test validation fails for a zero page limit.
#[test]
fn test_validation_fails_zero_page_limit() {
    let (_dir, path) = temp_config(
        r#"
[api]
base_url = "http://localhost"

[engine]
page_limit = 0
"#,
    );

    match Config::load_from(&path).unwrap_err() {
        ConfigError::ValidationError { message } => {
            assert!(message.contains("page_limit"));
        }
        other => panic!("Expected ValidationError, got {:?}", other),
    }
}

/// Test validation fails for an empty base url.
#[test]
fn test_validation_fails_empty_base_url() {
    let mut config = Config::default();
    config.api.base_url = "  ".to_string();

    let result = config.validate();
    assert!(matches!(
        result,
        Err(ConfigError::ValidationError { ref message }) if message.contains("base_url")
    ));
}

/// Test that the engine refuses an invalid configuration.
#[test]
fn test_engine_rejects_invalid_config() {
    let mut config = Config::default();
    config.engine.hierarchy_max_depth = 0;

    let result = Engine::builder(config).build();
    assert!(matches!(result, Err(EngineError::Config(_))));
}
