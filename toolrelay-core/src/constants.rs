//! Application constants
//!
//! Single source of truth for paths, protocol identifiers and defaults.

/// Default configuration file path
pub const CONFIG_PATH: &str = "config/toolrelay.toml";

/// Default environment file path
pub const ENV_PATH: &str = "config/.env";

/// Protocol revision announced during the handshake
pub const PROTOCOL_VERSION: &str = "2025-06-18";

/// Default OpenAI-compatible endpoint (Groq)
pub const DEFAULT_MODEL_ENDPOINT: &str = "https://api.groq.com/openai";

/// Default chat completions path appended to the endpoint
pub const DEFAULT_CHAT_PATH: &str = "/v1/chat/completions";

pub const DEFAULT_PROVIDER_ID: &str = "groq";
pub const DEFAULT_MODEL: &str = "llama-3.1-8b-instant";
pub const DEFAULT_API_KEY_ENV: &str = "GROQ_API_KEY";

/// Environment variables that override the configured model, in priority order
pub const MODEL_ENV_OVERRIDES: [&str; 2] = ["TOOLRELAY_MODEL", "GROQ_MODEL"];

pub const DEFAULT_MAX_TOKENS: u32 = 1024;
pub const DEFAULT_MAX_RETRIES: u32 = 2;
pub const DEFAULT_MODEL_TIMEOUT_SECS: u64 = 60;

pub const DEFAULT_HANDSHAKE_TIMEOUT_SECS: u64 = 10;
pub const DEFAULT_REQUEST_TIMEOUT_SECS: u64 = 60;
pub const DEFAULT_SHUTDOWN_GRACE_MS: u64 = 2_000;

pub const DEFAULT_MAX_STEPS: usize = 8;
pub const DEFAULT_HISTORY_LIMIT: usize = 20;

/// Interpreters used for script launch targets
pub const PYTHON_COMMAND: &str = "python";
pub const NODE_COMMAND: &str = "node";

/// Overrides the interpreter used for `.py` launch targets
pub const PYTHON_ENV_OVERRIDE: &str = "TOOLRELAY_PYTHON";

pub const DEFAULT_QUIT_WORDS: [&str; 2] = ["quit", "exit"];
