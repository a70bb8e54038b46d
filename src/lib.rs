//! Clipchain - scripted text pipelines for the clipboard
//!
//! Clipchain watches the clipboard and feeds every change through a pipeline
//! of small Rhai scripts ("transforms"), writing the result back. Transforms
//! live in a folder next to a `transforms.ini` file that configures option
//! overrides and multi-step chains. The same pipelines also run one-off over
//! stdin, files, or the clipboard.

pub mod cli;
pub mod clipboard;
pub mod domain;
pub mod pipeline;
pub mod plugin;
pub mod storage;

pub use domain::{EntryKind, Registry, Transform, TransformEntry, TransformError};
