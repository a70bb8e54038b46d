//! Transform script loading
//!
//! A transform is a Rhai script defining `fn transform(text)`. The file's
//! leading `//` comment block (or the `///` doc comment on `transform`)
//! becomes its registry description. Configuration overrides are exposed to
//! the script through a registered `option(key, default)` function; the
//! override wins when present, the script-side default applies otherwise:
//!
//! ```rhai
//! // Prefix every line with a marker.
//! fn transform(text) {
//!     let prefix = option("prefix", "> ");
//!     ...
//! }
//! ```
//!
//! Every load re-reads and re-compiles from disk; reloading is how edits are
//! picked up.

use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};

use rhai::{Dynamic, Engine, EvalAltResult, Scope, AST};
use thiserror::Error;

use crate::domain::{ConfigValue, Transform, TransformError};

/// Shown when a script carries no documentation at all.
pub const FALLBACK_DESCRIPTION: &str = "No description.";

/// The entry point every transform script must define.
const TRANSFORM_FN: &str = "transform";

#[derive(Debug, Error)]
pub enum ScriptError {
    #[error("script not found: {0}")]
    NotFound(PathBuf),

    #[error("failed to read {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("parse error: {0}")]
    Parse(String),

    #[error("script must define 'fn transform(text)'")]
    MissingTransform,
}

/// A compiled transform script, ready to run.
#[derive(Debug)]
pub struct LoadedScript {
    engine: Engine,
    ast: AST,
    path: PathBuf,
    short_desc: String,
    full_desc: String,
    timeout: Duration,
    deadline: Arc<Mutex<Option<Instant>>>,
}

impl LoadedScript {
    /// Loads and validates one script. `overrides` are raw key/value strings
    /// from configuration, coerced int-then-float-then-string and made
    /// visible through `option()`. A zero `timeout` disables the per-call
    /// execution limit.
    pub fn load(
        path: &Path,
        overrides: &[(String, String)],
        timeout: Duration,
    ) -> Result<Self, ScriptError> {
        if !path.exists() {
            return Err(ScriptError::NotFound(path.to_path_buf()));
        }
        let path = path.canonicalize().map_err(|source| ScriptError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let source = fs::read_to_string(&path).map_err(|source| ScriptError::Io {
            path: path.clone(),
            source,
        })?;

        let mut bound: HashMap<String, Dynamic> = HashMap::new();
        for (key, value) in overrides {
            bound.insert(key.clone(), to_dynamic(&ConfigValue::coerce(value)));
        }
        let bound = Arc::new(bound);

        let mut engine = Engine::new();
        let with_default = Arc::clone(&bound);
        engine.register_fn("option", move |key: &str, default: Dynamic| -> Dynamic {
            with_default.get(key).cloned().unwrap_or(default)
        });
        let without_default = Arc::clone(&bound);
        engine.register_fn("option", move |key: &str| -> Dynamic {
            without_default.get(key).cloned().unwrap_or(Dynamic::UNIT)
        });

        let deadline: Arc<Mutex<Option<Instant>>> = Arc::new(Mutex::new(None));
        if !timeout.is_zero() {
            let watch = Arc::clone(&deadline);
            engine.on_progress(move |_| {
                let expired = watch
                    .lock()
                    .ok()
                    .and_then(|d| *d)
                    .is_some_and(|d| Instant::now() > d);
                if expired {
                    Some(Dynamic::from("timeout"))
                } else {
                    None
                }
            });
        }

        let ast = engine
            .compile(&source)
            .map_err(|e| ScriptError::Parse(e.to_string()))?;

        let has_transform = ast
            .iter_functions()
            .any(|f| f.name == TRANSFORM_FN && f.params.len() == 1);
        if !has_transform {
            return Err(ScriptError::MissingTransform);
        }

        let full_desc = extract_doc(&source).unwrap_or_else(|| FALLBACK_DESCRIPTION.to_string());
        let short_desc = full_desc
            .lines()
            .map(str::trim)
            .find(|l| !l.is_empty())
            .unwrap_or(FALLBACK_DESCRIPTION)
            .to_string();

        Ok(Self {
            engine,
            ast,
            path,
            short_desc,
            full_desc,
            timeout,
            deadline,
        })
    }

    /// Canonical path the script was loaded from.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// First non-empty documentation line.
    pub fn description(&self) -> &str {
        &self.short_desc
    }

    /// Full documentation text, for detail display.
    pub fn details(&self) -> &str {
        &self.full_desc
    }
}

impl Transform for LoadedScript {
    fn apply(&self, text: &str) -> Result<String, TransformError> {
        if !self.timeout.is_zero() {
            if let Ok(mut d) = self.deadline.lock() {
                *d = Some(Instant::now() + self.timeout);
            }
        }

        let mut scope = Scope::new();
        let result: Result<Dynamic, _> =
            self.engine
                .call_fn(&mut scope, &self.ast, TRANSFORM_FN, (text.to_string(),));

        if let Ok(mut d) = self.deadline.lock() {
            *d = None;
        }

        match result {
            Ok(value) => Ok(coerce_output(value)),
            Err(err) => {
                if matches!(*err, EvalAltResult::ErrorTerminated(..)) {
                    Err(TransformError::Timeout(self.timeout))
                } else {
                    Err(TransformError::Failed(err.to_string()))
                }
            }
        }
    }
}

/// Non-string return values are coerced to their display form before being
/// fed to the next step.
fn coerce_output(value: Dynamic) -> String {
    match value.clone().into_string() {
        Ok(s) => s,
        Err(_) => value.to_string(),
    }
}

fn to_dynamic(value: &ConfigValue) -> Dynamic {
    match value {
        ConfigValue::Int(i) => Dynamic::from(*i),
        ConfigValue::Float(f) => Dynamic::from(*f),
        ConfigValue::Str(s) => Dynamic::from(s.clone()),
    }
}

/// Documentation resolution order: leading `//` comment block at the top of
/// the file, else the `///` block directly above `fn transform`.
fn extract_doc(source: &str) -> Option<String> {
    let lines: Vec<&str> = source.lines().collect();

    let mut module_doc = Vec::new();
    for line in &lines {
        let trimmed = line.trim();
        if trimmed.is_empty() && module_doc.is_empty() {
            continue;
        }
        if let Some(rest) = trimmed.strip_prefix("//") {
            let rest = rest.strip_prefix('/').unwrap_or(rest);
            let rest = rest.strip_prefix('!').unwrap_or(rest);
            module_doc.push(rest.trim().to_string());
        } else {
            break;
        }
    }
    if module_doc.iter().any(|l| !l.is_empty()) {
        return Some(module_doc.join("\n").trim().to_string());
    }

    let fn_index = lines
        .iter()
        .position(|l| l.trim_start().starts_with("fn transform"))?;
    let mut fn_doc = Vec::new();
    for line in lines[..fn_index].iter().rev() {
        let trimmed = line.trim();
        if let Some(rest) = trimmed.strip_prefix("///") {
            fn_doc.push(rest.trim().to_string());
        } else {
            break;
        }
    }
    if fn_doc.iter().any(|l| !l.is_empty()) {
        fn_doc.reverse();
        Some(fn_doc.join("\n").trim().to_string())
    } else {
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn write_script(dir: &TempDir, name: &str, body: &str) -> PathBuf {
        let path = dir.path().join(name);
        fs::write(&path, body).unwrap();
        path
    }

    fn no_overrides() -> Vec<(String, String)> {
        Vec::new()
    }

    #[test]
    fn loads_and_applies_a_simple_script() {
        let dir = TempDir::new().unwrap();
        let path = write_script(
            &dir,
            "upper.rhai",
            "// Convert all text to UPPERCASE.\nfn transform(text) { text.to_upper() }\n",
        );

        let script = LoadedScript::load(&path, &no_overrides(), Duration::ZERO).unwrap();
        assert_eq!(script.description(), "Convert all text to UPPERCASE.");
        assert_eq!(script.apply("hello").unwrap(), "HELLO");
        // Loading is reproducible: same file, same output.
        assert_eq!(script.apply("hello").unwrap(), "HELLO");
    }

    #[test]
    fn missing_file_is_not_found() {
        let dir = TempDir::new().unwrap();
        let err = LoadedScript::load(
            &dir.path().join("absent.rhai"),
            &no_overrides(),
            Duration::ZERO,
        )
        .unwrap_err();
        assert!(matches!(err, ScriptError::NotFound(_)));
    }

    #[test]
    fn script_without_transform_is_invalid() {
        let dir = TempDir::new().unwrap();
        let path = write_script(&dir, "bad.rhai", "fn helper(x) { x }\n");
        let err = LoadedScript::load(&path, &no_overrides(), Duration::ZERO).unwrap_err();
        assert!(matches!(err, ScriptError::MissingTransform));
    }

    #[test]
    fn syntax_error_is_a_parse_failure() {
        let dir = TempDir::new().unwrap();
        let path = write_script(&dir, "broken.rhai", "fn transform(text) { text.\n");
        let err = LoadedScript::load(&path, &no_overrides(), Duration::ZERO).unwrap_err();
        assert!(matches!(err, ScriptError::Parse(_)));
    }

    #[test]
    fn overrides_win_over_script_defaults() {
        let dir = TempDir::new().unwrap();
        let path = write_script(
            &dir,
            "mark.rhai",
            "fn transform(text) { let m = option(\"marker\", \"-\"); `${m}${text}` }\n",
        );

        let plain = LoadedScript::load(&path, &no_overrides(), Duration::ZERO).unwrap();
        assert_eq!(plain.apply("x").unwrap(), "-x");

        let overridden = LoadedScript::load(
            &path,
            &[("marker".to_string(), "*".to_string())],
            Duration::ZERO,
        )
        .unwrap();
        assert_eq!(overridden.apply("x").unwrap(), "*x");
    }

    #[test]
    fn integer_overrides_arrive_typed() {
        let dir = TempDir::new().unwrap();
        let path = write_script(
            &dir,
            "repeat.rhai",
            "fn transform(text) { let n = option(\"count\", 1); let out = \"\"; \
             for i in 0..n { out += text; } out }\n",
        );
        let script = LoadedScript::load(
            &path,
            &[("count".to_string(), "3".to_string())],
            Duration::ZERO,
        )
        .unwrap();
        assert_eq!(script.apply("ab").unwrap(), "ababab");
    }

    #[test]
    fn runtime_error_carries_the_message() {
        let dir = TempDir::new().unwrap();
        let path = write_script(
            &dir,
            "raise.rhai",
            "fn transform(text) { throw \"no thanks\"; }\n",
        );
        let script = LoadedScript::load(&path, &no_overrides(), Duration::ZERO).unwrap();
        let err = script.apply("x").unwrap_err();
        assert!(matches!(err, TransformError::Failed(_)));
        assert!(err.to_string().contains("no thanks"));
    }

    #[test]
    fn non_string_return_is_coerced() {
        let dir = TempDir::new().unwrap();
        let path = write_script(&dir, "len.rhai", "fn transform(text) { text.len() }\n");
        let script = LoadedScript::load(&path, &no_overrides(), Duration::ZERO).unwrap();
        assert_eq!(script.apply("four").unwrap(), "4");
    }

    #[test]
    fn runaway_script_times_out() {
        let dir = TempDir::new().unwrap();
        let path = write_script(
            &dir,
            "spin.rhai",
            "fn transform(text) { loop { } }\n",
        );
        let script =
            LoadedScript::load(&path, &no_overrides(), Duration::from_millis(50)).unwrap();
        let err = script.apply("x").unwrap_err();
        assert!(matches!(err, TransformError::Timeout(_)));
    }

    #[test]
    fn doc_falls_back_to_fn_comment_then_literal() {
        let dir = TempDir::new().unwrap();

        let fn_doc = write_script(
            &dir,
            "a.rhai",
            "/// Trim the ends.\nfn transform(text) { text }\n",
        );
        let script = LoadedScript::load(&fn_doc, &no_overrides(), Duration::ZERO).unwrap();
        assert_eq!(script.description(), "Trim the ends.");

        let bare = write_script(&dir, "b.rhai", "fn transform(text) { text }\n");
        let script = LoadedScript::load(&bare, &no_overrides(), Duration::ZERO).unwrap();
        assert_eq!(script.description(), FALLBACK_DESCRIPTION);
    }

    #[test]
    fn only_first_line_is_the_short_description() {
        let dir = TempDir::new().unwrap();
        let path = write_script(
            &dir,
            "multi.rhai",
            "// Sort lines alphabetically.\n// Duplicates are removed.\nfn transform(text) { text }\n",
        );
        let script = LoadedScript::load(&path, &no_overrides(), Duration::ZERO).unwrap();
        assert_eq!(script.description(), "Sort lines alphabetically.");
        assert!(script.details().contains("Duplicates are removed."));
    }
}
