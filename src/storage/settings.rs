//! Application settings (`clipchain.toml`)
//!
//! Separate from `transforms.ini`: the INI file describes transforms and
//! chains, this file tunes the host application itself. Searched in the
//! transforms folder, then its parent; absence means defaults. CLI flags
//! override anything loaded here.

use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::{Context, Result};
use directories::ProjectDirs;
use serde::{Deserialize, Serialize};

pub const SETTINGS_FILE: &str = "clipchain.toml";

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    /// Clipboard poll interval in seconds (fractional).
    pub poll_seconds: f64,

    /// Per-step script timeout in milliseconds; 0 disables the limit.
    pub script_timeout_ms: u64,

    /// Log entries older than this many days are purged at startup.
    pub retain_days: u32,

    /// Log database location; defaults to the platform data directory.
    pub database: Option<PathBuf>,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            poll_seconds: 0.5,
            script_timeout_ms: 10_000,
            retain_days: 30,
            database: None,
        }
    }
}

impl Settings {
    /// Loads settings for a transforms folder, falling back to defaults.
    pub fn load(folder: &Path) -> Result<Self> {
        let mut candidates = vec![folder.join(SETTINGS_FILE)];
        if let Some(parent) = folder.parent() {
            candidates.push(parent.join(SETTINGS_FILE));
        }

        for path in candidates {
            if path.is_file() {
                let content = fs::read_to_string(&path)
                    .with_context(|| format!("Failed to read settings: {}", path.display()))?;
                return toml::from_str(&content)
                    .with_context(|| format!("Failed to parse settings: {}", path.display()));
            }
        }

        Ok(Self::default())
    }

    pub fn poll_interval(&self) -> Duration {
        Duration::from_secs_f64(self.poll_seconds.max(0.05))
    }

    pub fn script_timeout(&self) -> Duration {
        Duration::from_millis(self.script_timeout_ms)
    }

    /// Effective log database path: explicit setting, else the platform
    /// data directory, else a dotfile next to the current directory.
    pub fn database_path(&self) -> PathBuf {
        if let Some(path) = &self.database {
            return path.clone();
        }
        if let Some(dirs) = ProjectDirs::from("dev", "clipchain", "clipchain") {
            return dirs.data_dir().join("clipchain.db");
        }
        PathBuf::from(".clipchain.db")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn defaults_match_the_documented_contract() {
        let s = Settings::default();
        assert_eq!(s.poll_seconds, 0.5);
        assert_eq!(s.retain_days, 30);
        assert_eq!(s.poll_interval(), Duration::from_millis(500));
    }

    #[test]
    fn missing_file_yields_defaults() {
        let dir = TempDir::new().unwrap();
        let s = Settings::load(dir.path()).unwrap();
        assert_eq!(s.poll_seconds, 0.5);
    }

    #[test]
    fn partial_file_keeps_remaining_defaults() {
        let dir = TempDir::new().unwrap();
        fs::write(dir.path().join(SETTINGS_FILE), "poll_seconds = 1.5\n").unwrap();
        let s = Settings::load(dir.path()).unwrap();
        assert_eq!(s.poll_seconds, 1.5);
        assert_eq!(s.retain_days, 30);
    }

    #[test]
    fn poll_interval_has_a_floor() {
        let s = Settings {
            poll_seconds: 0.0,
            ..Settings::default()
        };
        assert!(s.poll_interval() >= Duration::from_millis(50));
    }
}
