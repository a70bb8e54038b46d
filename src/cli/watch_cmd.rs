//! The `watch` command: run a pipeline on every clipboard change

use std::path::Path;
use std::sync::Arc;

use anyhow::{Context, Result};

use crate::clipboard::{Clipboard, SystemClipboard};
use crate::pipeline::{self, Watcher};
use crate::plugin;

use super::app::Env;
use super::output::Output;
use super::report::Reporter;
use super::run_cmd;

#[allow(clippy::too_many_arguments)]
pub fn run(
    output: &Output,
    folder: &Path,
    name: Option<&str>,
    steps: &[String],
    poll: Option<f64>,
    dry_run: bool,
    once: bool,
) -> Result<()> {
    let mut env = Env::load(folder)?;
    if let Some(seconds) = poll {
        env.settings.poll_seconds = seconds;
    }
    let mut registry = env.scan();

    // Fail fast on a bad selection before touching the clipboard.
    run_cmd::select(&registry, name, steps)?;

    let store = env.open_log()?;
    let reporter = Reporter::new(output, Some(&store));

    let clipboard: Arc<dyn Clipboard + Sync> = Arc::new(SystemClipboard::new());
    let interval = env.settings.poll_interval();
    let (watcher, rx) =
        Watcher::spawn(clipboard, interval).context("Failed to start clipboard watcher")?;

    let what = name
        .map(str::to_string)
        .unwrap_or_else(|| steps.join(" → "));
    reporter.info(&format!(
        "Watching clipboard every {:.1}s for: {}{}",
        interval.as_secs_f64(),
        what,
        if dry_run { " (dry run)" } else { "" }
    ));
    output.verbose_ctx("watch", &format!("session {}", store.session_id()));

    let mut folder_mark = plugin::fingerprint(&env.folder);

    // The watcher keeps polling during a run. A change landing mid-run waits
    // in the capacity-1 channel and is picked up on the next iteration.
    while let Ok(text) = rx.recv() {
        // Script or config edits are only picked up between runs, never
        // mid-pipeline.
        let mark = plugin::fingerprint(&env.folder);
        if mark != folder_mark {
            match Env::load(folder) {
                Ok(fresh) => {
                    env = fresh;
                    registry = env.scan();
                    let (scripts, broken, chains) = registry.counts();
                    reporter.info(&format!(
                        "Transforms folder changed; rescanned: {} script(s), {} chain(s), {} broken",
                        scripts, chains, broken
                    ));
                }
                Err(err) => reporter.warn(&format!("Rescan failed: {}", err)),
            }
            folder_mark = mark;
        }

        match run_cmd::select(&registry, name, steps) {
            Ok(selected) => {
                reporter.announce(&selected, "clipboard");
                let report = pipeline::run(&selected, &text);
                let destination = if dry_run { "preview" } else { "clipboard" };
                reporter.render(&report, destination);
                if !dry_run {
                    if let Ok(done) = &report.outcome {
                        if let Err(err) = watcher.commit(&done.output) {
                            reporter.warn(&format!("Clipboard write failed: {}", err));
                        }
                    }
                }
            }
            Err(err) => reporter.warn(&err.to_string()),
        }

        if once {
            break;
        }
    }

    drop(watcher);
    Ok(())
}
