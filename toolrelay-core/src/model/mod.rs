//! Language-model backend
//!
//! # Structure
//! - `types` - Request, Response, Error types
//! - `traits` - the `ModelProvider` seam used by agents and tools
//! - `clients` - HTTP client implementations

pub mod clients;
pub mod traits;
pub mod types;

pub use clients::OpenAIClient;
pub use traits::ModelProvider;
pub use types::{ModelError, ModelRequest, ModelResponse};
