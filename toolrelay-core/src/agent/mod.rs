//! # Agent Module
//!
//! Turns a query into an [`AgentResponse`] transcript, calling discovered
//! tools along the way.
//!
//! ## Agent Loop
//!
//! The [`DirectiveAgent`] operates in a loop bounded by `max_steps`:
//! 1. Send messages to the model
//! 2. Parse the JSON directive (with correction round-trips on parse failure)
//! 3. If a tool call is requested, invoke it and feed the result back
//! 4. If a final response is given, return the transcript

mod directive;
mod errors;
mod instructions;
mod models;
mod runner;


pub use directive::{AgentDirective, parse_directive};
pub use errors::AgentError;
pub use models::{AgentResponse, AgentStatus, MessageEntry, ToolCallEntry};
pub use runner::{Agent, DirectiveAgent};
