//! Canonical textual form of agent transcripts.

use crate::agent::{AgentResponse, MessageEntry};
use serde::Serialize;
use serde::ser::{SerializeMap, SerializeSeq, Serializer};
use std::fmt::Display;
use thiserror::Error;
use tracing::warn;

#[derive(Debug, Error)]
#[error("failed to serialize response: {0}")]
pub struct SerializeError(#[from] serde_json::Error);

/// Borrowing view that serializes a transcript as
/// `{"messages": [{"kind": ..., "content": ...}, ...]}`.
struct Canonical<'a>(&'a AgentResponse);

struct Entries<'a>(&'a [MessageEntry]);

struct Entry<'a>(&'a MessageEntry);

impl Serialize for Canonical<'_> {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(1))?;
        map.serialize_entry("messages", &Entries(&self.0.messages))?;
        map.end()
    }
}

impl Serialize for Entries<'_> {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut seq = serializer.serialize_seq(Some(self.0.len()))?;
        for entry in self.0 {
            seq.serialize_element(&Entry(entry))?;
        }
        seq.end()
    }
}

impl Serialize for Entry<'_> {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match (self.0.kind(), self.0.content()) {
            (Some(kind), Some(content)) => {
                let mut map = serializer.serialize_map(Some(2))?;
                map.serialize_entry("kind", kind)?;
                map.serialize_entry("content", &content)?;
                map.end()
            }
            _ => serializer.collect_str(self.0),
        }
    }
}

/// Pretty JSON of any serializable value.
pub fn render<T: Serialize + ?Sized>(value: &T) -> Result<String, SerializeError> {
    Ok(serde_json::to_string_pretty(value)?)
}

/// Canonical text for a transcript. Never fails and never mutates the input.
pub fn canonicalize(response: &AgentResponse) -> String {
    render_or_fallback(&Canonical(response), response)
}

/// Pretty JSON of `value`, or the `Display` rendering of `fallback` when
/// serialization fails.
pub fn render_or_fallback<T, D>(value: &T, fallback: &D) -> String
where
    T: Serialize + ?Sized,
    D: Display + ?Sized,
{
    match render(value) {
        Ok(text) => text,
        Err(err) => {
            warn!(error = %err, "Structured rendering failed; falling back to plain text");
            fallback.to_string()
        }
    }
}
