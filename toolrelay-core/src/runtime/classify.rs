use crate::agent::AgentError;
use crate::model::ModelError;
use std::error::Error;

const RATE_LIMIT_MARKERS: [&str; 4] = ["429", "rate limit", "quota", "too many requests"];

/// How the loop reacts to a failed dispatch.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailureClass {
    /// Show an advisory and keep going.
    RateLimited,
    Fatal,
}

/// Classifies a dispatch failure.
///
/// Typed rate-limit errors are recognised first; otherwise every message in
/// the source chain is searched for rate-limit wording.
pub fn classify(error: &(dyn Error + 'static)) -> FailureClass {
    let mut current = Some(error);
    while let Some(err) = current {
        if let Some(agent) = err.downcast_ref::<AgentError>() {
            if agent.is_rate_limited() {
                return FailureClass::RateLimited;
            }
        }
        if let Some(model) = err.downcast_ref::<ModelError>() {
            if model.is_rate_limited() {
                return FailureClass::RateLimited;
            }
        }
        if mentions_rate_limit(&err.to_string()) {
            return FailureClass::RateLimited;
        }
        current = err.source();
    }
    FailureClass::Fatal
}

pub fn mentions_rate_limit(message: &str) -> bool {
    let lowered = message.to_lowercase();
    RATE_LIMIT_MARKERS
        .iter()
        .any(|marker| lowered.contains(marker))
}
