pub mod app;
pub mod error;
pub mod loader;
pub mod server;

pub use crate::constants::CONFIG_PATH;

pub use app::{AgentConfig, AppConfig, InteractiveConfig, ModelConfig, SessionConfig};
pub use error::ConfigError;
pub use server::ServerLaunch;
