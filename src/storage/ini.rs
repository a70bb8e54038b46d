//! Parsing for `transforms.ini`: chain definitions and per-transform overrides
//!
//! The file lives in the transforms folder itself or, failing that, in its
//! parent directory; the first match wins and absence is valid (empty
//! configuration). Format:
//!
//! ```ini
//! [transform:my_script]
//! bookmark = bk2
//! heading_rows = 2
//!
//! [chain:my_chain]
//! description = Clean, convert, insert
//! steps = trim_whitespace, csv_to_yaml, word_from_yaml
//! ```
//!
//! Override values are kept as raw strings here; type coercion happens at
//! script load time so that edits between scans always take effect.

use std::fs;
use std::path::{Path, PathBuf};

use thiserror::Error;

pub const INI_FILE: &str = "transforms.ini";

#[derive(Debug, Error)]
pub enum IniError {
    #[error("failed to read {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("{file}:{line}: expected '[section]' or 'key = value', got '{text}'")]
    Syntax {
        file: String,
        line: usize,
        text: String,
    },
}

/// One `[chain:<name>]` section.
#[derive(Debug, Clone, PartialEq)]
pub struct ChainDef {
    pub name: String,
    pub description: String,
    /// Ordered step names; whitespace trimmed, empty entries dropped.
    pub steps: Vec<String>,
}

/// Parsed `transforms.ini`: overrides per transform plus chain definitions.
#[derive(Debug, Default)]
pub struct ChainConfig {
    /// `(transform name, key, raw value)` in file order. Kept flat so that
    /// key order within a section is preserved.
    overrides: Vec<(String, String, String)>,

    chains: Vec<ChainDef>,

    /// The file the configuration came from, if any.
    pub source: Option<PathBuf>,
}

impl ChainConfig {
    /// Loads configuration for a transforms folder: the folder itself is
    /// searched first, then its parent. A missing file yields an empty,
    /// valid configuration.
    pub fn load(folder: &Path) -> Result<Self, IniError> {
        let mut candidates = vec![folder.join(INI_FILE)];
        if let Some(parent) = folder.parent() {
            candidates.push(parent.join(INI_FILE));
        }

        for path in candidates {
            if path.is_file() {
                let text = fs::read_to_string(&path).map_err(|source| IniError::Io {
                    path: path.clone(),
                    source,
                })?;
                let mut config = Self::parse(&text, &path.display().to_string())?;
                config.source = Some(path);
                return Ok(config);
            }
        }

        Ok(Self::default())
    }

    /// Parses INI text. `file` is only used in error messages.
    pub fn parse(text: &str, file: &str) -> Result<Self, IniError> {
        let mut config = Self::default();
        let mut section: Option<String> = None;

        // A BOM may be present when the file was written on Windows.
        let text = text.trim_start_matches('\u{feff}');

        for (lineno, raw) in text.lines().enumerate() {
            let line = raw.trim();
            if line.is_empty() || line.starts_with('#') || line.starts_with(';') {
                continue;
            }

            if let Some(name) = line.strip_prefix('[').and_then(|l| l.strip_suffix(']')) {
                let name = name.trim().to_string();
                if let Some(chain_name) = name.strip_prefix("chain:") {
                    config.chains.push(ChainDef {
                        name: chain_name.trim().to_string(),
                        description: String::new(),
                        steps: Vec::new(),
                    });
                }
                section = Some(name);
                continue;
            }

            let Some((key, value)) = line.split_once('=') else {
                return Err(IniError::Syntax {
                    file: file.to_string(),
                    line: lineno + 1,
                    text: line.to_string(),
                });
            };
            let key = key.trim().to_string();
            let value = value.trim().to_string();

            match section.as_deref() {
                Some(s) if s.starts_with("transform:") => {
                    let name = s["transform:".len()..].trim().to_string();
                    config.overrides.push((name, key, value));
                }
                Some(s) if s.starts_with("chain:") => {
                    // The section header above just pushed this chain.
                    if let Some(chain) = config.chains.last_mut() {
                        match key.as_str() {
                            "description" => chain.description = value,
                            "steps" => {
                                chain.steps = value
                                    .split(',')
                                    .map(str::trim)
                                    .filter(|s| !s.is_empty())
                                    .map(str::to_string)
                                    .collect();
                            }
                            _ => {} // unknown chain keys are ignored
                        }
                    }
                }
                // Keys in unknown sections (or before any section) are ignored.
                _ => {}
            }
        }

        Ok(config)
    }

    /// Raw override pairs scoped to one transform name, in file order.
    pub fn overrides_for(&self, name: &str) -> Vec<(String, String)> {
        self.overrides
            .iter()
            .filter(|(n, _, _)| n == name)
            .map(|(_, k, v)| (k.clone(), v.clone()))
            .collect()
    }

    /// Chain definitions in file order.
    pub fn chains(&self) -> &[ChainDef] {
        &self.chains
    }
}
