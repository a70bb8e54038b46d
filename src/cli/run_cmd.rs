//! The `run` command: execute a transform or chain once

use std::io::Read;
use std::path::Path;

use anyhow::{bail, Context, Result};

use crate::clipboard::{Clipboard, SystemClipboard};
use crate::domain::{EntryKind, Registry, TransformEntry};
use crate::pipeline;

use super::app::Env;
use super::output::Output;
use super::report::Reporter;

/// Resolves what to run: an ad-hoc `--steps` list, a chain name, or a single
/// script name. Chain names shadow script names, matching how they are
/// listed.
pub fn select<'a>(
    registry: &'a Registry,
    name: Option<&str>,
    steps: &[String],
) -> Result<Vec<&'a TransformEntry>> {
    if !steps.is_empty() {
        if name.is_some() {
            bail!("Pass either a name or --steps, not both");
        }
        let resolution = registry.resolve(steps);
        if !resolution.is_complete() {
            bail!(
                "Unknown or unloadable step(s): {}",
                resolution.missing.join(", ")
            );
        }
        return Ok(resolution.steps);
    }

    let Some(name) = name else {
        bail!("Pass a transform or chain name, or --steps");
    };

    if let Some(chain) = registry.chain(name) {
        let resolution = registry.resolve(&chain.steps);
        if !resolution.is_complete() {
            bail!(
                "Chain '{}' has missing step(s): {}",
                name,
                resolution.missing.join(", ")
            );
        }
        return Ok(resolution.steps);
    }

    if let Some(script) = registry.script(name) {
        return Ok(vec![script]);
    }

    if let Some(broken) = registry
        .iter()
        .find(|e| e.kind == EntryKind::Broken && e.name == name)
    {
        bail!("Transform '{}' failed to load: {}", name, broken.description);
    }

    bail!("Unknown transform or chain: '{}'", name)
}

#[allow(clippy::too_many_arguments)]
pub fn run(
    output: &Output,
    folder: &Path,
    name: Option<&str>,
    steps: &[String],
    input: Option<&Path>,
    from_clipboard: bool,
    copy: bool,
) -> Result<()> {
    let env = Env::load(folder)?;
    let registry = env.scan();
    let selected = select(&registry, name, steps)?;

    let (text, source) = read_input(input, from_clipboard)?;
    output.verbose_ctx(
        "run",
        &format!("{} step(s), {} chars from {}", selected.len(), text.chars().count(), source),
    );

    let store = env.open_log()?;
    let reporter = Reporter::silent(&store);
    reporter.announce(&selected, source);

    let report = pipeline::run(&selected, &text);
    let destination = if copy { "clipboard" } else { "stdout" };
    reporter.render(&report, destination);

    match report.outcome {
        Ok(done) => {
            if copy {
                SystemClipboard::new()
                    .write(&done.output)
                    .context("Failed to write result to clipboard")?;
            }
            if output.is_json() {
                output.data(&serde_json::json!({
                    "output": done.output,
                    "chars": done.chars,
                    "steps": done.steps_run,
                    "trace": report.trace,
                }));
            } else {
                print!("{}", done.output);
                if !done.output.ends_with('\n') {
                    println!();
                }
                if copy {
                    eprintln!("✓ {} chars written to clipboard", done.chars);
                }
            }
            Ok(())
        }
        Err(err) => Err(err.into()),
    }
}

fn read_input(input: Option<&Path>, from_clipboard: bool) -> Result<(String, &'static str)> {
    if from_clipboard {
        let text = SystemClipboard::new()
            .read()
            .context("Failed to read clipboard")?;
        return Ok((text, "clipboard"));
    }
    if let Some(path) = input {
        let text = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read input file: {}", path.display()))?;
        return Ok((text, "file"));
    }
    let mut text = String::new();
    std::io::stdin()
        .read_to_string(&mut text)
        .context("Failed to read stdin")?;
    Ok((text, "stdin"))
}
