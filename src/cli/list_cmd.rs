//! The `list` command: show discovered transforms and chains

use std::path::Path;

use anyhow::Result;

use crate::domain::EntryKind;

use super::app::Env;
use super::output::Output;

pub fn run(output: &Output, folder: &Path, details: bool) -> Result<()> {
    let env = Env::load(folder)?;
    let registry = env.scan();
    let (scripts, broken, chains) = registry.counts();

    output.verbose_ctx(
        "list",
        &format!("{} scripts, {} broken, {} chains", scripts, broken, chains),
    );

    if output.is_json() {
        let items: Vec<_> = registry
            .iter()
            .map(|e| {
                serde_json::json!({
                    "name": e.name,
                    "label": e.label,
                    "kind": match e.kind {
                        EntryKind::Script => "script",
                        EntryKind::Chain => "chain",
                        EntryKind::Broken => "broken",
                    },
                    "description": e.description,
                    "steps": e.steps,
                    "source": e.source_path.as_ref().map(|p| p.display().to_string()),
                })
            })
            .collect();
        output.data(&items);
        return Ok(());
    }

    if registry.is_empty() {
        println!("No transforms found in {}", folder.display());
        println!("Run 'clipchain init' to create starter scripts");
        return Ok(());
    }

    println!("{:<24} {}", "NAME", "DESCRIPTION");
    println!("{}", "-".repeat(70));
    for entry in registry.iter() {
        println!("{:<24} {}", entry.label, entry.description);
        if entry.kind == EntryKind::Chain {
            println!("{:<24} steps: {}", "", entry.steps.join(" → "));
        }
        if details {
            if let Some(path) = &entry.source_path {
                println!("{:<24} from: {}", "", path.display());
            }
            if entry.details != entry.description {
                for line in entry.details.lines().skip(1) {
                    println!("{:<24} {}", "", line);
                }
            }
        }
    }

    output.blank();
    println!(
        "{} transform(s), {} chain(s){}",
        scripts,
        chains,
        if broken > 0 {
            format!(", {} failed to load", broken)
        } else {
            String::new()
        }
    );

    Ok(())
}
