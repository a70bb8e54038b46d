//! Transform registry entries
//!
//! A [`Registry`] is an immutable snapshot of one folder scan: script entries
//! sorted by filename, then chain entries in configuration order. Rescanning
//! always builds a fresh snapshot; nothing is patched in place.

use std::path::PathBuf;
use std::time::Duration;

use thiserror::Error;

/// Runtime failure of a single transform invocation.
#[derive(Debug, Error)]
pub enum TransformError {
    #[error("timed out after {0:?}")]
    Timeout(Duration),

    #[error("{0}")]
    Failed(String),
}

/// The unit of work: a named text-to-text function.
///
/// Loaded scripts implement this; tests may substitute plain closures.
pub trait Transform: Send {
    fn apply(&self, text: &str) -> Result<String, TransformError>;
}

/// What kind of registry entry this is.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EntryKind {
    /// A loaded script with a callable transform.
    Script,
    /// A named, ordered list of script names from configuration.
    Chain,
    /// A script file that failed to load; kept visible for diagnosis.
    Broken,
}

/// One available transform, chain, or load failure.
pub struct TransformEntry {
    /// Stable identifier, derived from the file stem. Unique among
    /// non-chain entries in one snapshot.
    pub name: String,

    /// Human-readable display form; the UI-selection namespace.
    pub label: String,

    pub kind: EntryKind,

    /// Present only for `Script` entries.
    pub function: Option<Box<dyn Transform>>,

    /// Present only for `Chain` entries: ordered step names, unresolved.
    pub steps: Vec<String>,

    /// First non-empty doc line, or the load error for broken entries.
    pub description: String,

    /// Full documentation text for detail display.
    pub details: String,

    /// Where the entry was loaded from; `None` for chains.
    pub source_path: Option<PathBuf>,
}

impl std::fmt::Debug for TransformEntry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TransformEntry")
            .field("name", &self.name)
            .field("label", &self.label)
            .field("kind", &self.kind)
            .field("function", &self.function.as_ref().map(|_| "<transform>"))
            .field("steps", &self.steps)
            .field("description", &self.description)
            .field("details", &self.details)
            .field("source_path", &self.source_path)
            .finish()
    }
}

impl TransformEntry {
    pub fn script(
        name: &str,
        function: Box<dyn Transform>,
        path: PathBuf,
        description: String,
        details: String,
    ) -> Self {
        Self {
            name: name.to_string(),
            label: display_label(name),
            kind: EntryKind::Script,
            function: Some(function),
            steps: Vec::new(),
            description,
            details,
            source_path: Some(path),
        }
    }

    pub fn broken(name: &str, path: PathBuf, error: String) -> Self {
        Self {
            name: name.to_string(),
            label: format!("⚠ {}", name),
            kind: EntryKind::Broken,
            function: None,
            steps: Vec::new(),
            description: format!("Load error: {}", error),
            details: format!("Load error: {}", error),
            source_path: Some(path),
        }
    }

    pub fn chain(name: &str, description: String, steps: Vec<String>) -> Self {
        Self {
            name: name.to_string(),
            label: format!("⛓ {}", display_label(name)),
            kind: EntryKind::Chain,
            function: None,
            steps,
            description: description.clone(),
            details: description,
            source_path: None,
        }
    }

    pub fn is_chain(&self) -> bool {
        self.kind == EntryKind::Chain
    }

    pub fn is_runnable(&self) -> bool {
        self.kind == EntryKind::Script && self.function.is_some()
    }
}

/// `title_case` → `Title Case`
fn display_label(name: &str) -> String {
    name.split('_')
        .map(|word| {
            let mut chars = word.chars();
            match chars.next() {
                Some(first) => first.to_uppercase().chain(chars).collect::<String>(),
                None => String::new(),
            }
        })
        .collect::<Vec<_>>()
        .join(" ")
}

/// One snapshot of discovered transforms and chains.
///
/// Lookups by `label` (selection) and by `name` (chain-step resolution) are
/// distinct namespaces: a chain and a script may share a name.
#[derive(Default)]
pub struct Registry {
    entries: Vec<TransformEntry>,
}

impl Registry {
    pub fn new(entries: Vec<TransformEntry>) -> Self {
        Self { entries }
    }

    pub fn iter(&self) -> impl Iterator<Item = &TransformEntry> {
        self.entries.iter()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Looks up any entry by display label.
    pub fn by_label(&self, label: &str) -> Option<&TransformEntry> {
        self.entries.iter().find(|e| e.label == label)
    }

    /// Looks up a loadable script entry by name. Chains and broken entries
    /// never match.
    pub fn script(&self, name: &str) -> Option<&TransformEntry> {
        self.entries
            .iter()
            .find(|e| e.kind == EntryKind::Script && e.name == name)
    }

    /// Looks up a chain entry by name.
    pub fn chain(&self, name: &str) -> Option<&TransformEntry> {
        self.entries
            .iter()
            .find(|e| e.kind == EntryKind::Chain && e.name == name)
    }

    pub fn scripts(&self) -> impl Iterator<Item = &TransformEntry> {
        self.entries.iter().filter(|e| e.kind == EntryKind::Script)
    }

    pub fn chains(&self) -> impl Iterator<Item = &TransformEntry> {
        self.entries.iter().filter(|e| e.kind == EntryKind::Chain)
    }

    pub fn broken(&self) -> impl Iterator<Item = &TransformEntry> {
        self.entries.iter().filter(|e| e.kind == EntryKind::Broken)
    }

    /// (scripts, broken, chains) counts for status lines.
    pub fn counts(&self) -> (usize, usize, usize) {
        (
            self.scripts().count(),
            self.broken().count(),
            self.chains().count(),
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Upper;

    impl Transform for Upper {
        fn apply(&self, text: &str) -> Result<String, TransformError> {
            Ok(text.to_uppercase())
        }
    }

    fn sample_registry() -> Registry {
        Registry::new(vec![
            TransformEntry::script(
                "upper",
                Box::new(Upper),
                PathBuf::from("/t/upper.rhai"),
                "Uppercase everything.".into(),
                "Uppercase everything.".into(),
            ),
            TransformEntry::broken(
                "bad_one",
                PathBuf::from("/t/bad_one.rhai"),
                "parse error".into(),
            ),
            TransformEntry::chain("upper", "shadows a script name".into(), vec!["upper".into()]),
        ])
    }

    #[test]
    fn labels_are_title_cased() {
        assert_eq!(display_label("trim_whitespace"), "Trim Whitespace");
        assert_eq!(display_label("upper"), "Upper");
    }

    #[test]
    fn broken_entries_are_marked_and_described() {
        let reg = sample_registry();
        let broken: Vec<_> = reg.broken().collect();
        assert_eq!(broken.len(), 1);
        assert!(broken[0].label.starts_with('⚠'));
        assert!(broken[0].description.contains("parse error"));
        assert!(broken[0].function.is_none());
    }

    #[test]
    fn name_lookup_namespaces_do_not_conflate() {
        let reg = sample_registry();
        // A chain and a script share the name "upper"; each lookup sees its own kind.
        assert_eq!(reg.script("upper").map(|e| e.kind), Some(EntryKind::Script));
        assert_eq!(reg.chain("upper").map(|e| e.kind), Some(EntryKind::Chain));
    }

    #[test]
    fn broken_never_matches_script_lookup() {
        let reg = sample_registry();
        assert!(reg.script("bad_one").is_none());
    }
}
