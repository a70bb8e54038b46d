//! Run narration
//!
//! Turns an executor trace into the terminal lines and log records users
//! actually see. The same [`Reporter`] feeds both sinks so the session log
//! always matches what was printed.

use crate::domain::{TraceEvent, TraceStatus, TransformEntry};
use crate::pipeline::RunReport;
use crate::storage::{LogStore, LogTag};

use super::output::Output;

/// Fans one message out to the terminal and, when present, the session log.
/// Either sink may be absent: `run` logs without narrating, tests narrate
/// without logging.
pub struct Reporter<'a> {
    output: Option<&'a Output>,
    store: Option<&'a LogStore>,
}

impl<'a> Reporter<'a> {
    pub fn new(output: &'a Output, store: Option<&'a LogStore>) -> Self {
        Self {
            output: Some(output),
            store,
        }
    }

    /// Log-only reporter; nothing reaches the terminal.
    pub fn silent(store: &'a LogStore) -> Self {
        Self {
            output: None,
            store: Some(store),
        }
    }

    pub fn emit(&self, tag: LogTag, message: &str, transform: &str) {
        if let Some(output) = self.output {
            output.event(tag, message);
        }
        if let Some(store) = self.store {
            store.log(message, tag, transform);
        }
    }

    /// Announces a run before it starts.
    pub fn announce(&self, steps: &[&TransformEntry], source: &str) {
        let (tag, headline) = match steps {
            [only] => (LogTag::Info, format!("▶ {} via {}", only.label, source)),
            many => {
                let names: Vec<&str> = many.iter().map(|e| e.name.as_str()).collect();
                (
                    LogTag::Chain,
                    format!("▶ Chain [{}] via {}", names.join(" → "), source),
                )
            }
        };
        let first = steps.first().map(|e| e.name.as_str()).unwrap_or("");
        self.emit(tag, &headline, first);
    }

    /// Narrates a finished run, event by event.
    pub fn render(&self, report: &RunReport, destination: &str) {
        for event in &report.trace {
            self.render_event(event, destination);
        }
    }

    fn render_event(&self, event: &TraceEvent, destination: &str) {
        let name = event.step.as_deref().unwrap_or("");
        match event.status {
            // Started lines duplicate the announcement; the trace keeps them
            // for the JSON surface only.
            TraceStatus::Started => {}
            TraceStatus::Input => {
                self.emit(LogTag::Preview, &format!("  In:  {}", event.payload), name);
            }
            TraceStatus::Output => {
                self.emit(LogTag::Preview, &format!("  Out: {}", event.payload), name);
            }
            TraceStatus::Error => {
                let line = if name.is_empty() {
                    format!("✗ {}", event.payload)
                } else {
                    format!("✗ Error in [{}]: {}", name, event.payload)
                };
                self.emit(LogTag::Err, &line, name);
            }
            TraceStatus::Completed => {
                self.emit(
                    LogTag::Ok,
                    &format!("✓ {} written to {}", event.payload, destination),
                    name,
                );
            }
        }
    }

    pub fn warn(&self, message: &str) {
        self.emit(LogTag::Warn, message, "");
    }

    pub fn info(&self, message: &str) {
        self.emit(LogTag::Info, message, "");
    }
}
