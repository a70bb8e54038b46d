//! Script loading and folder scanning.

pub mod scanner;
pub mod script;

pub use scanner::{fingerprint, scan, LoadOptions};
pub use script::{LoadedScript, ScriptError, FALLBACK_DESCRIPTION};
