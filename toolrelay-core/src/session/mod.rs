//! Child-process tool server sessions.
//!
//! A [`ProcessSession`] owns one spawned server and its stdio pipes. Requests
//! are strictly sequential: every call writes one line and waits for the
//! response carrying the same id before returning.

mod channel;
mod error;
mod process;
mod protocol;
mod state;

pub use channel::ToolChannel;
pub use error::SessionError;
pub use process::ProcessSession;
pub use protocol::ServerInfo;
pub use state::SessionState;
