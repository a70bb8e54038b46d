//! Chain resolution
//!
//! A chain declares its steps as names, not objects; resolution against the
//! current registry snapshot happens at selection time. Chains may only
//! reference leaf scripts, never other chains, which rules out cycles by
//! construction.

use super::entry::{Registry, TransformEntry};

/// The outcome of expanding a chain's declared steps against a registry.
pub struct Resolution<'a> {
    /// Matched script entries, in declaration order.
    pub steps: Vec<&'a TransformEntry>,

    /// Declared names with no matching script, in declaration order.
    pub missing: Vec<String>,
}

impl Resolution<'_> {
    /// A chain is fully loadable when nothing is missing. Must be recomputed
    /// after every scan: a script turning broken invalidates chains that
    /// reference it.
    pub fn is_complete(&self) -> bool {
        self.missing.is_empty()
    }
}

impl Registry {
    /// Expands step names into currently loaded script entries. Unmatched
    /// names go to `missing`; a partial resolution is valid and the caller
    /// decides whether it is still worth loading.
    pub fn resolve<'a>(&'a self, step_names: &[String]) -> Resolution<'a> {
        let mut steps = Vec::new();
        let mut missing = Vec::new();
        for name in step_names {
            match self.script(name) {
                Some(entry) => steps.push(entry),
                None => missing.push(name.clone()),
            }
        }
        Resolution { steps, missing }
    }
}
