//! Main CLI application structure

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};

use super::output::{Output, OutputFormat};
use super::{init_cmd, list_cmd, log_cmd, run_cmd, watch_cmd};
use crate::domain::Registry;
use crate::plugin::{self, LoadOptions};
use crate::storage::{ChainConfig, LogStore, Settings};

#[derive(Parser)]
#[command(name = "clipchain")]
#[command(author, version, about = "Clipboard transform pipelines, scripted in Rhai")]
#[command(propagate_version = true)]
pub struct Cli {
    /// Output format
    #[arg(long, short = 'f', global = true, default_value = "text")]
    pub format: OutputFormat,

    /// Enable verbose output for debugging
    #[arg(long, short = 'v', global = true)]
    pub verbose: bool,

    /// Transforms folder to load scripts from
    #[arg(
        long,
        short = 't',
        global = true,
        env = "CLIPCHAIN_TRANSFORMS",
        default_value = "transforms"
    )]
    pub transforms: PathBuf,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Create a transforms folder with starter scripts
    Init {
        /// Folder to create (defaults to the --transforms folder)
        path: Option<PathBuf>,

        /// Overwrite starter files that already exist
        #[arg(long)]
        force: bool,
    },

    /// List discovered transforms and chains
    List {
        /// Show full documentation and source paths
        #[arg(long)]
        details: bool,
    },

    /// Run a transform or chain once
    Run {
        /// Transform or chain name
        name: Option<String>,

        /// Ad-hoc pipeline of script names, in order
        #[arg(long, value_delimiter = ',')]
        steps: Vec<String>,

        /// Read input from a file instead of stdin
        #[arg(long, short = 'i')]
        input: Option<PathBuf>,

        /// Read input from the clipboard
        #[arg(long)]
        clipboard: bool,

        /// Write the result back to the clipboard
        #[arg(long)]
        copy: bool,
    },

    /// Watch the clipboard and run a pipeline on every change
    Watch {
        /// Transform or chain name
        name: Option<String>,

        /// Ad-hoc pipeline of script names, in order
        #[arg(long, value_delimiter = ',')]
        steps: Vec<String>,

        /// Clipboard poll interval in seconds (overrides clipchain.toml)
        #[arg(long)]
        poll: Option<f64>,

        /// Preview results without writing them back to the clipboard
        #[arg(long)]
        dry_run: bool,

        /// Exit after the first triggered run
        #[arg(long)]
        once: bool,
    },

    /// Inspect the session log
    #[command(subcommand)]
    Log(log_cmd::LogCommands),
}

/// Everything a command needs from one transforms folder: its settings, its
/// chain configuration, and a way to scan it.
pub struct Env {
    pub folder: PathBuf,
    pub settings: Settings,
    pub config: ChainConfig,
}

impl Env {
    pub fn load(folder: &Path) -> Result<Self> {
        let settings = Settings::load(folder)?;
        let config = ChainConfig::load(folder)
            .with_context(|| format!("Failed to load chain config from {}", folder.display()))?;
        Ok(Self {
            folder: folder.to_path_buf(),
            settings,
            config,
        })
    }

    pub fn scan(&self) -> Registry {
        plugin::scan(
            &self.folder,
            &self.config,
            &LoadOptions {
                timeout: self.settings.script_timeout(),
            },
        )
    }

    pub fn open_log(&self) -> Result<LogStore> {
        LogStore::open(
            &self.settings.database_path(),
            &self.folder.display().to_string(),
            self.settings.retain_days,
        )
    }
}

/// Main entry point for the CLI
pub fn run() -> Result<()> {
    let cli = Cli::parse();
    let output = Output::new(cli.format, cli.verbose);

    output.verbose_ctx("cli", &format!("transforms folder: {}", cli.transforms.display()));

    match cli.command {
        Commands::Init { path, force } => {
            let target = path.unwrap_or_else(|| cli.transforms.clone());
            init_cmd::run(&output, &target, force)?
        }

        Commands::List { details } => list_cmd::run(&output, &cli.transforms, details)?,

        Commands::Run {
            name,
            steps,
            input,
            clipboard,
            copy,
        } => run_cmd::run(
            &output,
            &cli.transforms,
            name.as_deref(),
            &steps,
            input.as_deref(),
            clipboard,
            copy,
        )?,

        Commands::Watch {
            name,
            steps,
            poll,
            dry_run,
            once,
        } => watch_cmd::run(
            &output,
            &cli.transforms,
            name.as_deref(),
            &steps,
            poll,
            dry_run,
            once,
        )?,

        Commands::Log(cmd) => log_cmd::run(cmd, &output, &cli.transforms)?,
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn watch_accepts_poll_and_dry_run() {
        let cli = Cli::try_parse_from([
            "clipchain",
            "watch",
            "clean_shout",
            "--poll",
            "0.25",
            "--dry-run",
            "--once",
        ])
        .unwrap();

        match cli.command {
            Commands::Watch {
                name,
                poll,
                dry_run,
                once,
                ..
            } => {
                assert_eq!(name.as_deref(), Some("clean_shout"));
                assert_eq!(poll, Some(0.25));
                assert!(dry_run);
                assert!(once);
            }
            _ => panic!("expected watch command"),
        }
    }

    #[test]
    fn watch_defaults_to_settings_poll_and_writeback() {
        let cli = Cli::try_parse_from(["clipchain", "watch", "upper"]).unwrap();
        match cli.command {
            Commands::Watch { poll, dry_run, .. } => {
                assert_eq!(poll, None);
                assert!(!dry_run);
            }
            _ => panic!("expected watch command"),
        }
    }
}
