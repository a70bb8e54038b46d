//! Command-line interface.

pub mod app;
pub mod init_cmd;
pub mod list_cmd;
pub mod log_cmd;
pub mod output;
pub mod report;
pub mod run_cmd;
pub mod watch_cmd;

pub use app::run;
