//! Folder scanning
//!
//! Builds a [`Registry`] snapshot from one transforms folder: every `.rhai`
//! file in alphabetical order (names starting with `_` are skipped), then the
//! configured chains in file order. A script that fails to load becomes a
//! `Broken` entry instead of aborting the scan.

use std::fs;
use std::path::Path;
use std::time::Duration;

use crate::domain::{Registry, TransformEntry};
use crate::storage::{ChainConfig, INI_FILE};

use super::script::LoadedScript;

/// Script file extension, without the dot.
const SCRIPT_EXT: &str = "rhai";

/// Load parameters shared by every script in one scan.
#[derive(Debug, Clone)]
pub struct LoadOptions {
    /// Per-invocation execution limit; zero disables it.
    pub timeout: Duration,
}

impl Default for LoadOptions {
    fn default() -> Self {
        Self {
            timeout: Duration::from_secs(10),
        }
    }
}

/// Scans `folder` and returns a fresh registry snapshot. A missing or
/// unreadable folder yields an empty registry rather than an error; the
/// caller decides whether that is worth reporting.
pub fn scan(folder: &Path, config: &ChainConfig, options: &LoadOptions) -> Registry {
    let mut entries = Vec::new();

    for path in script_files(folder) {
        let name = match path.file_stem().and_then(|s| s.to_str()) {
            Some(stem) => stem.to_string(),
            None => continue,
        };
        let overrides = config.overrides_for(&name);
        match LoadedScript::load(&path, &overrides, options.timeout) {
            Ok(script) => {
                let description = script.description().to_string();
                let details = script.details().to_string();
                let source = script.path().to_path_buf();
                entries.push(TransformEntry::script(
                    &name,
                    Box::new(script),
                    source,
                    description,
                    details,
                ));
            }
            Err(err) => {
                entries.push(TransformEntry::broken(&name, path, err.to_string()));
            }
        }
    }

    for chain in config.chains() {
        entries.push(TransformEntry::chain(
            &chain.name,
            chain.description.clone(),
            chain.steps.clone(),
        ));
    }

    Registry::new(entries)
}

fn script_files(folder: &Path) -> Vec<std::path::PathBuf> {
    let Ok(dir) = fs::read_dir(folder) else {
        return Vec::new();
    };
    let mut paths: Vec<_> = dir
        .filter_map(|e| e.ok())
        .map(|e| e.path())
        .filter(|p| {
            p.is_file()
                && p.extension().and_then(|e| e.to_str()) == Some(SCRIPT_EXT)
                && !p
                    .file_name()
                    .and_then(|n| n.to_str())
                    .is_some_and(|n| n.starts_with('_'))
        })
        .collect();
    paths.sort();
    paths
}

/// Cheap change fingerprint for a transforms folder: script names, their
/// modification times, and the configuration file's. Watch mode compares
/// fingerprints between runs and rescans only when they differ.
pub fn fingerprint(folder: &Path) -> String {
    let mut hasher = blake3::Hasher::new();
    for path in script_files(folder) {
        if let Some(name) = path.file_name().and_then(|n| n.to_str()) {
            hasher.update(name.as_bytes());
        }
        hasher.update(&mtime_nanos(&path).to_le_bytes());
    }
    for candidate in [folder.join(INI_FILE), ini_in_parent(folder)] {
        if candidate.exists() {
            hasher.update(&mtime_nanos(&candidate).to_le_bytes());
            break;
        }
    }
    hasher.finalize().to_hex().to_string()
}

fn ini_in_parent(folder: &Path) -> std::path::PathBuf {
    folder
        .parent()
        .map(|p| p.join(INI_FILE))
        .unwrap_or_else(|| folder.join(INI_FILE))
}

fn mtime_nanos(path: &Path) -> u128 {
    fs::metadata(path)
        .and_then(|m| m.modified())
        .ok()
        .and_then(|t| t.duration_since(std::time::UNIX_EPOCH).ok())
        .map(|d| d.as_nanos())
        .unwrap_or(0)
}
