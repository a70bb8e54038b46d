//! Domain models for clipchain
//!
//! Core pipeline types without any I/O concerns: registry entries, chain
//! resolution, typed override values, and execution traces.

mod chain;
mod entry;
mod trace;
mod value;

pub use chain::Resolution;
pub use entry::{EntryKind, Registry, Transform, TransformEntry, TransformError};
pub use trace::{preview, TraceEvent, TraceStatus};
pub use value::ConfigValue;
