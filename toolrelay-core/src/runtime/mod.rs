//! The session loop: open, discover, answer queries, close.

mod classify;
mod error;
mod session_loop;
mod source;
mod state;

pub use classify::{FailureClass, classify, mentions_rate_limit};
pub use error::LoopError;
pub use session_loop::{BANNER, PROMPT, RESPONSE_HEADER, SessionLoop};
pub use source::{LineSource, QuerySource, StdinSource};
pub use state::{LoopExit, LoopReport, LoopState, RunMode};
