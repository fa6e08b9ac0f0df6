use super::app::{AgentConfig, AppConfig, InteractiveConfig, ModelConfig, SessionConfig};
use super::error::ConfigError;
use crate::constants::{CONFIG_PATH, ENV_PATH, MODEL_ENV_OVERRIDES};
use dotenvy::{dotenv, from_filename};
use serde::Deserialize;
use std::env;
use std::fs;
use std::io;
use std::path::Path;
use std::sync::Once;
use std::time::Duration;
use tracing::debug;

static ENV_LOADER: Once = Once::new();

/// Raw configuration structure for deserialization from TOML
#[derive(Debug, Deserialize, Default)]
#[serde(deny_unknown_fields)]
pub(super) struct RawConfig {
    #[serde(default)]
    pub model: RawModel,
    #[serde(default)]
    pub session: RawSession,
    #[serde(default)]
    pub agent: RawAgent,
    #[serde(default)]
    pub interactive: RawInteractive,
}

#[derive(Debug, Deserialize, Default)]
#[serde(deny_unknown_fields)]
pub(super) struct RawModel {
    pub provider: Option<String>,
    pub endpoint: Option<String>,
    pub api_path: Option<String>,
    pub api_key_env: Option<String>,
    pub model: Option<String>,
    pub temperature: Option<f32>,
    pub max_tokens: Option<u32>,
    pub max_retries: Option<u32>,
    pub timeout_secs: Option<u64>,
}

#[derive(Debug, Deserialize, Default)]
#[serde(deny_unknown_fields)]
pub(super) struct RawSession {
    pub handshake_timeout_secs: Option<u64>,
    pub request_timeout_secs: Option<u64>,
    pub shutdown_grace_ms: Option<u64>,
}

#[derive(Debug, Deserialize, Default)]
#[serde(deny_unknown_fields)]
pub(super) struct RawAgent {
    pub max_steps: Option<usize>,
    pub system_prompt: Option<String>,
}

#[derive(Debug, Deserialize, Default)]
#[serde(deny_unknown_fields)]
pub(super) struct RawInteractive {
    pub history_limit: Option<usize>,
    pub quit_words: Option<Vec<String>>,
}

/// Ensures environment variables are loaded from config/.env and ./.env
pub fn ensure_env_loaded() {
    ENV_LOADER.call_once(|| {
        let _ = from_filename(ENV_PATH);
        let _ = dotenv();
    });
}

/// Load and validate configuration.
///
/// A missing file at the default path yields the built-in defaults; a missing
/// file at an explicitly requested path is an error.
pub fn load_config(path: Option<&Path>) -> Result<AppConfig, ConfigError> {
    ensure_env_loaded();
    let parsed = match path {
        Some(path) => read_config(path)?,
        None => {
            let default_path = Path::new(CONFIG_PATH);
            match read_config(default_path) {
                Err(ConfigError::NotFound { .. }) => {
                    debug!("No configuration file found; using defaults");
                    RawConfig::default()
                }
                other => other?,
            }
        }
    };

    let mut config = validate_and_build(parsed)?;
    apply_env_overrides(&mut config);
    Ok(config)
}

/// Parses configuration text without touching the filesystem or environment.
pub fn parse_config(content: &str) -> Result<AppConfig, ConfigError> {
    let parsed: RawConfig = toml::from_str(content).map_err(|source| ConfigError::Parse {
        path: Path::new("<inline>").to_path_buf(),
        source,
    })?;
    validate_and_build(parsed)
}

fn read_config(path: &Path) -> Result<RawConfig, ConfigError> {
    debug!(path = %path.display(), "Reading configuration file");

    let content = fs::read_to_string(path).map_err(|source| {
        if source.kind() == io::ErrorKind::NotFound {
            ConfigError::NotFound {
                path: path.to_path_buf(),
            }
        } else {
            ConfigError::Io {
                path: path.to_path_buf(),
                source,
            }
        }
    })?;

    toml::from_str(&content).map_err(|source| ConfigError::Parse {
        path: path.to_path_buf(),
        source,
    })
}

fn validate_and_build(parsed: RawConfig) -> Result<AppConfig, ConfigError> {
    let defaults = AppConfig::default();

    let raw = parsed.model;
    let model = ModelConfig {
        provider: non_empty("model.provider", raw.provider)?.unwrap_or(defaults.model.provider),
        endpoint: non_empty("model.endpoint", raw.endpoint)?.unwrap_or(defaults.model.endpoint),
        api_path: non_empty("model.api_path", raw.api_path)?.unwrap_or(defaults.model.api_path),
        api_key_env: non_empty("model.api_key_env", raw.api_key_env)?
            .unwrap_or(defaults.model.api_key_env),
        model: non_empty("model.model", raw.model)?.unwrap_or(defaults.model.model),
        temperature: match raw.temperature {
            Some(value) if !(0.0..=2.0).contains(&value) => {
                return Err(ConfigError::Invalid {
                    field: "model.temperature",
                    reason: format!("{value} is outside 0.0..=2.0"),
                });
            }
            Some(value) => value,
            None => defaults.model.temperature,
        },
        max_tokens: positive("model.max_tokens", raw.max_tokens)?
            .unwrap_or(defaults.model.max_tokens),
        max_retries: raw.max_retries.unwrap_or(defaults.model.max_retries),
        timeout: positive("model.timeout_secs", raw.timeout_secs)?
            .map(Duration::from_secs)
            .unwrap_or(defaults.model.timeout),
    };

    let raw = parsed.session;
    let session = SessionConfig {
        handshake_timeout: positive("session.handshake_timeout_secs", raw.handshake_timeout_secs)?
            .map(Duration::from_secs)
            .unwrap_or(defaults.session.handshake_timeout),
        request_timeout: positive("session.request_timeout_secs", raw.request_timeout_secs)?
            .map(Duration::from_secs)
            .unwrap_or(defaults.session.request_timeout),
        shutdown_grace: raw
            .shutdown_grace_ms
            .map(Duration::from_millis)
            .unwrap_or(defaults.session.shutdown_grace),
    };

    let raw = parsed.agent;
    let agent = AgentConfig {
        max_steps: positive("agent.max_steps", raw.max_steps)?.unwrap_or(defaults.agent.max_steps),
        system_prompt: raw
            .system_prompt
            .map(|prompt| prompt.trim().to_string())
            .filter(|prompt| !prompt.is_empty()),
    };

    let raw = parsed.interactive;
    let quit_words = match raw.quit_words {
        Some(words) => {
            let words: Vec<String> = words
                .into_iter()
                .map(|w| w.trim().to_lowercase())
                .filter(|w| !w.is_empty())
                .collect();
            if words.is_empty() {
                return Err(ConfigError::Invalid {
                    field: "interactive.quit_words",
                    reason: "at least one quit word is required".into(),
                });
            }
            words
        }
        None => defaults.interactive.quit_words,
    };
    let interactive = InteractiveConfig {
        history_limit: raw
            .history_limit
            .unwrap_or(defaults.interactive.history_limit),
        quit_words,
    };

    Ok(AppConfig {
        model,
        session,
        agent,
        interactive,
    })
}

fn apply_env_overrides(config: &mut AppConfig) {
    for var in MODEL_ENV_OVERRIDES {
        if let Ok(value) = env::var(var) {
            let value = value.trim();
            if !value.is_empty() {
                debug!(env_var = var, model = value, "Model overridden from environment");
                config.model.model = value.to_string();
                return;
            }
        }
    }
}

fn non_empty(field: &'static str, value: Option<String>) -> Result<Option<String>, ConfigError> {
    match value {
        Some(text) if text.trim().is_empty() => Err(ConfigError::Invalid {
            field,
            reason: "must not be empty".into(),
        }),
        Some(text) => Ok(Some(text.trim().to_string())),
        None => Ok(None),
    }
}

fn positive<T>(field: &'static str, value: Option<T>) -> Result<Option<T>, ConfigError>
where
    T: PartialOrd + Default + Copy + std::fmt::Display,
{
    match value {
        Some(number) if number <= T::default() => Err(ConfigError::Invalid {
            field,
            reason: format!("{number} must be greater than zero"),
        }),
        other => Ok(other),
    }
}
