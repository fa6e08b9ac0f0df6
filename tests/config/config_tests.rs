// Config loading tests - files on disk and environment overrides

use serial_test::serial;
use std::env;
use std::fs;
use std::time::Duration;
use toolrelay_core::config::{AppConfig, ConfigError};

const SAMPLE: &str = r#"
[model]
endpoint = "http://localhost:11434"
model = "llama-3.3-70b-versatile"
temperature = 0.2
max_retries = 0

[session]
request_timeout_secs = 30
shutdown_grace_ms = 500

[agent]
max_steps = 4
system_prompt = "  Answer in one sentence.  "

[interactive]
history_limit = 6
quit_words = ["Bye", "quit"]
"#;

fn clear_model_overrides() {
    unsafe {
        env::remove_var("TOOLRELAY_MODEL");
        env::remove_var("GROQ_MODEL");
    }
}

#[test]
#[serial]
fn loads_explicit_file() {
    clear_model_overrides();
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("toolrelay.toml");
    fs::write(&path, SAMPLE).unwrap();

    let config = AppConfig::load(Some(path.as_path())).expect("config loads");
    assert_eq!(config.model.endpoint, "http://localhost:11434");
    assert_eq!(config.model.model, "llama-3.3-70b-versatile");
    assert_eq!(config.model.max_retries, 0);
    assert_eq!(config.session.request_timeout, Duration::from_secs(30));
    assert_eq!(config.session.shutdown_grace, Duration::from_millis(500));
    assert_eq!(config.agent.max_steps, 4);
    assert_eq!(
        config.agent.system_prompt.as_deref(),
        Some("Answer in one sentence.")
    );
    assert_eq!(config.interactive.history_limit, 6);
    assert_eq!(config.interactive.quit_words, vec!["bye", "quit"]);
}

#[test]
#[serial]
fn missing_explicit_file_is_an_error() {
    let dir = tempfile::tempdir().unwrap();
    let err = AppConfig::load(Some(dir.path().join("absent.toml").as_path())).unwrap_err();
    assert!(matches!(err, ConfigError::NotFound { .. }));
}

#[test]
#[serial]
fn malformed_file_names_its_path() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("broken.toml");
    fs::write(&path, "[model\nendpoint = 1").unwrap();

    let err = AppConfig::load(Some(path.as_path())).unwrap_err();
    assert!(matches!(err, ConfigError::Parse { .. }));
    assert!(err.to_string().contains("broken.toml"));
}

#[test]
#[serial]
fn environment_overrides_model() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("toolrelay.toml");
    fs::write(&path, SAMPLE).unwrap();

    unsafe {
        env::remove_var("TOOLRELAY_MODEL");
        env::set_var("GROQ_MODEL", "gemma2-9b-it");
    }
    let config = AppConfig::load(Some(path.as_path())).unwrap();
    assert_eq!(config.model.model, "gemma2-9b-it");

    unsafe {
        env::set_var("TOOLRELAY_MODEL", "mixtral-8x7b-32768");
    }
    let config = AppConfig::load(Some(path.as_path())).unwrap();
    assert_eq!(config.model.model, "mixtral-8x7b-32768");

    clear_model_overrides();
}

#[test]
#[serial]
fn api_key_comes_from_configured_variable() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("toolrelay.toml");
    fs::write(&path, "[model]\napi_key_env = \"TOOLRELAY_TEST_KEY\"\n").unwrap();
    let config = AppConfig::load(Some(path.as_path())).unwrap();

    unsafe {
        env::remove_var("TOOLRELAY_TEST_KEY");
    }
    let err = config.model.resolve_api_key().unwrap_err();
    assert!(err.to_string().contains("TOOLRELAY_TEST_KEY"));

    unsafe {
        env::set_var("TOOLRELAY_TEST_KEY", "  gsk_test  ");
    }
    assert_eq!(config.model.resolve_api_key().unwrap(), "gsk_test");
    unsafe {
        env::remove_var("TOOLRELAY_TEST_KEY");
    }
}
