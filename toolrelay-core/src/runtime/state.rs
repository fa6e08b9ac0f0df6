use std::fmt;

/// Phases of the session loop.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoopState {
    Idle,
    AwaitingInput,
    Dispatching,
    Formatting,
    Terminated,
}

impl LoopState {
    pub fn as_str(self) -> &'static str {
        match self {
            LoopState::Idle => "idle",
            LoopState::AwaitingInput => "awaiting-input",
            LoopState::Dispatching => "dispatching",
            LoopState::Formatting => "formatting",
            LoopState::Terminated => "terminated",
        }
    }

    /// Whether the loop may move from `self` to `next`.
    pub fn can_transition(self, next: LoopState) -> bool {
        use LoopState::*;
        matches!(
            (self, next),
            (Idle, AwaitingInput)
                | (Idle, Dispatching)
                | (AwaitingInput, AwaitingInput)
                | (AwaitingInput, Dispatching)
                | (Dispatching, Formatting)
                | (Dispatching, AwaitingInput)
                | (Formatting, Idle)
                | (_, Terminated)
        )
    }
}

impl fmt::Display for LoopState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// How the loop takes its queries.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RunMode {
    Interactive,
    OneShot(String),
}

/// Why the loop stopped.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoopExit {
    QuitRequested,
    EndOfInput,
    Interrupted,
    OneShotComplete,
    OneShotRateLimited,
}

/// Summary of a finished session loop.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoopReport {
    /// Queries handed to the agent.
    pub queries: usize,
    /// Rate-limit advisories shown.
    pub advisories: usize,
    pub exit: LoopExit,
}

impl LoopReport {
    pub fn exit_code(&self) -> u8 {
        match self.exit {
            LoopExit::OneShotRateLimited => 75,
            LoopExit::Interrupted => 130,
            _ => 0,
        }
    }
}
