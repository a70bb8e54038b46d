//! Execution traces for pipeline runs
//!
//! Each run produces an ordered list of [`TraceEvent`]s: one `Started`,
//! `Input` and `Output` (or `Error`) per step attempted, plus pipeline-level
//! markers. The trace is the only observable side channel of the executor;
//! rendering it to the terminal or the log store is entirely the caller's
//! business.

use serde::Serialize;

/// Maximum payload preview length in characters.
const PREVIEW_CHARS: usize = 80;

/// What a trace event records.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum TraceStatus {
    Started,
    Input,
    Output,
    Error,
    Completed,
}

/// One event in a pipeline execution trace.
#[derive(Debug, Clone, Serialize)]
pub struct TraceEvent {
    /// Zero-based position of the step this event belongs to.
    pub index: usize,

    /// Step name; `None` for pipeline-level events.
    pub step: Option<String>,

    pub status: TraceStatus,

    /// Human-readable payload (previews are truncated, error text is not).
    pub payload: String,
}

impl TraceEvent {
    pub fn step(index: usize, name: &str, status: TraceStatus, payload: impl Into<String>) -> Self {
        Self {
            index,
            step: Some(name.to_string()),
            status,
            payload: payload.into(),
        }
    }

    pub fn pipeline(status: TraceStatus, payload: impl Into<String>) -> Self {
        Self {
            index: 0,
            step: None,
            status,
            payload: payload.into(),
        }
    }
}

/// Truncated single-line preview of a payload: first 80 characters, newlines
/// rendered visibly, ellipsis when text was cut.
pub fn preview(text: &str) -> String {
    let mut out: String = text
        .chars()
        .take(PREVIEW_CHARS)
        .map(|c| if c == '\n' { '↵' } else { c })
        .collect();
    if text.chars().count() > PREVIEW_CHARS {
        out.push('…');
    }
    out
}
