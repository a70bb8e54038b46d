//! Pipeline execution and clipboard watching.

pub mod executor;
pub mod watcher;

pub use executor::{run, Completed, PipelineError, RunReport};
pub use watcher::Watcher;
