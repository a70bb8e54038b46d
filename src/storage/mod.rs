//! # Storage Layer
//!
//! Configuration files and the SQLite log store.
//!
//! | Data | Format | Location |
//! |------|--------|----------|
//! | Chains + overrides | INI | `transforms.ini` (transforms folder, then parent) |
//! | App settings | TOML | `clipchain.toml` (transforms folder, then parent) |
//! | Run log | SQLite | platform data dir, or `database` setting |
//!
//! Configuration is re-read on every registry scan. Plugin authors edit
//! overrides between scans and expect them to take effect without a restart.

mod ini;
mod log;
mod settings;

pub use ini::{ChainConfig, ChainDef, IniError, INI_FILE};
pub use log::{EntryFilter, LogEntry, LogError, LogStore, LogTag, SessionRow};
pub use settings::{Settings, SETTINGS_FILE};
