//! The `log` command: inspect the session log database

use std::path::Path;

use anyhow::{bail, Result};
use clap::Subcommand;

use crate::storage::{EntryFilter, LogStore, LogTag, Settings};

use super::output::Output;

#[derive(Subcommand)]
pub enum LogCommands {
    /// Show recent log entries
    Show {
        /// Only entries from this session
        #[arg(long)]
        session: Option<String>,

        /// Only entries with this tag (info, ok, warn, err, chain, preview)
        #[arg(long)]
        tag: Option<String>,

        /// Number of entries to show
        #[arg(short = 'n', long, default_value = "50")]
        limit: usize,
    },

    /// List recorded sessions, newest first
    Sessions {
        /// Number of sessions to show
        #[arg(short = 'n', long, default_value = "20")]
        limit: usize,
    },
}

pub fn run(cmd: LogCommands, output: &Output, folder: &Path) -> Result<()> {
    let settings = Settings::load(folder)?;
    let store = LogStore::open_read(&settings.database_path())?;

    match cmd {
        LogCommands::Show {
            session,
            tag,
            limit,
        } => show(output, &store, session, tag, limit),
        LogCommands::Sessions { limit } => sessions(output, &store, limit),
    }
}

fn show(
    output: &Output,
    store: &LogStore,
    session: Option<String>,
    tag: Option<String>,
    limit: usize,
) -> Result<()> {
    let tag = match tag {
        Some(raw) => match raw.parse::<LogTag>() {
            Ok(tag) => Some(tag),
            Err(_) => bail!("Unknown tag '{}'; expected info, ok, warn, err, chain or preview", raw),
        },
        None => None,
    };

    let entries = store.entries(&EntryFilter {
        session_id: session,
        tag,
        limit,
    })?;

    if output.is_json() {
        let items: Vec<_> = entries
            .iter()
            .map(|e| {
                serde_json::json!({
                    "session": e.session_id,
                    "timestamp": e.timestamp,
                    "tag": e.tag,
                    "message": e.message,
                    "transform": e.transform_name,
                })
            })
            .collect();
        output.data(&items);
        return Ok(());
    }

    if entries.is_empty() {
        println!("No log entries");
        return Ok(());
    }

    for entry in &entries {
        println!(
            "{}  {:<8} {:<16} {}",
            entry.timestamp, entry.tag, entry.transform_name, entry.message
        );
    }
    output.blank();
    println!("{} entr(ies) from {}", entries.len(), store.db_path().display());

    Ok(())
}

fn sessions(output: &Output, store: &LogStore, limit: usize) -> Result<()> {
    let rows = store.sessions(limit)?;

    if output.is_json() {
        let items: Vec<_> = rows
            .iter()
            .map(|s| {
                serde_json::json!({
                    "id": s.id,
                    "started_at": s.started_at,
                    "transforms_folder": s.transforms_folder,
                })
            })
            .collect();
        output.data(&items);
        return Ok(());
    }

    if rows.is_empty() {
        println!("No sessions recorded");
        return Ok(());
    }

    println!("{:<10} {:<28} FOLDER", "SESSION", "STARTED");
    println!("{}", "-".repeat(70));
    for session in &rows {
        println!(
            "{:<10} {:<28} {}",
            session.id, session.started_at, session.transforms_folder
        );
    }

    Ok(())
}
