//! The `init` command: seed a transforms folder with starter scripts

use std::fs;
use std::path::Path;

use anyhow::{Context, Result};

use crate::storage::{INI_FILE, SETTINGS_FILE};

use super::output::Output;

/// Starter scripts written by `init`. Each demonstrates one scripting
/// pattern: pure string calls, line iteration, arrays, option overrides.
const STARTERS: &[(&str, &str)] = &[
    (
        "upper.rhai",
        r#"// Convert all text to UPPERCASE.
fn transform(text) {
    text.to_upper()
}
"#,
    ),
    (
        "lower.rhai",
        r#"// Convert all text to lowercase.
fn transform(text) {
    text.to_lower()
}
"#,
    ),
    (
        "title_case.rhai",
        r#"// Capitalize The First Letter Of Every Word.
fn transform(text) {
    let out = "";
    let first = true;
    for word in text.split(' ') {
        if !first { out += " "; }
        if word.len() > 0 {
            out += word.sub_string(0, 1).to_upper();
            out += word.sub_string(1).to_lower();
        }
        first = false;
    }
    out
}
"#,
    ),
    (
        "trim_whitespace.rhai",
        r#"// Trim leading and trailing whitespace from every line.
fn transform(text) {
    let out = "";
    let first = true;
    for line in text.split('\n') {
        if !first { out += "\n"; }
        let t = line;
        t.trim();
        out += t;
        first = false;
    }
    out
}
"#,
    ),
    (
        "line_sort.rhai",
        r#"// Sort lines alphabetically.
// Duplicate lines are removed.
fn transform(text) {
    let lines = [];
    for line in text.split('\n') {
        if !(line in lines) { lines.push(line); }
    }
    lines.sort(|a, b| if a < b { -1 } else if a > b { 1 } else { 0 });
    let out = "";
    let first = true;
    for line in lines {
        if !first { out += "\n"; }
        out += line;
        first = false;
    }
    out
}
"#,
    ),
    (
        "tabs_to_pipes.rhai",
        r#"// Replace tab characters with " | " separators.
fn transform(text) {
    let out = text;
    out.replace("\t", " | ");
    out
}
"#,
    ),
    (
        "prefix_lines.rhai",
        r#"// Prefix every line with a marker.
// The marker comes from option("prefix", "> ").
fn transform(text) {
    let prefix = option("prefix", "> ");
    let out = "";
    let first = true;
    for line in text.split('\n') {
        if !first { out += "\n"; }
        out += prefix;
        out += line;
        first = false;
    }
    out
}
"#,
    ),
];

const STARTER_INI: &str = r#"# Per-transform option overrides and chain definitions.
#
# [transform:<name>] keys override option() defaults inside <name>.rhai.
# [chain:<name>] defines an ordered pipeline of scripts.

[transform:prefix_lines]
prefix = >>

[chain:clean_shout]
description = Trim every line, then uppercase everything.
steps = trim_whitespace, upper
"#;

const STARTER_SETTINGS: &str = r#"# Clipboard poll interval in seconds.
poll_seconds = 0.5

# Per-script execution limit in milliseconds. 0 disables it.
script_timeout_ms = 10000

# Days of log history to keep.
retain_days = 30
"#;

pub fn run(output: &Output, folder: &Path, force: bool) -> Result<()> {
    fs::create_dir_all(folder)
        .with_context(|| format!("Failed to create folder: {}", folder.display()))?;

    let mut written = Vec::new();
    let mut skipped = Vec::new();

    let mut files: Vec<(String, &str)> = STARTERS
        .iter()
        .map(|(name, body)| (name.to_string(), *body))
        .collect();
    files.push((INI_FILE.to_string(), STARTER_INI));
    files.push((SETTINGS_FILE.to_string(), STARTER_SETTINGS));

    for (name, body) in files {
        let path = folder.join(&name);
        if path.exists() && !force {
            skipped.push(name);
            continue;
        }
        fs::write(&path, body)
            .with_context(|| format!("Failed to write {}", path.display()))?;
        written.push(name);
    }

    output.verbose_ctx(
        "init",
        &format!("wrote {} files, skipped {}", written.len(), skipped.len()),
    );

    if output.is_json() {
        output.data(&serde_json::json!({
            "folder": folder.display().to_string(),
            "written": written,
            "skipped": skipped,
        }));
    } else {
        output.success(&format!(
            "Initialized {} with {} starter file(s)",
            folder.display(),
            written.len()
        ));
        if !skipped.is_empty() {
            println!(
                "Skipped {} existing file(s); use --force to overwrite",
                skipped.len()
            );
        }
    }

    Ok(())
}
