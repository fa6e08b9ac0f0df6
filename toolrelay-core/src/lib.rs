//! Core of the toolrelay client: tool server sessions, tool discovery and
//! invocation, the directive agent and the session loop that ties them
//! together.

pub mod agent;
pub mod config;
pub mod constants;
pub mod domain;
pub mod model;
pub mod runtime;
pub mod serializer;
pub mod session;
pub mod tooling;

#[cfg(test)]
pub(crate) mod test_support;

pub use domain::types;
