//! Deployment ordering.
//!
//! Orders component kinds so every kind comes after the kinds its
//! constructor takes. Requested kinds pull in their transitive dependencies.
//! Among kinds that are ready at the same time the order follows
//! [`ComponentKind`]'s declaration order, which keeps logs stable between runs.

use std::collections::{BTreeMap, BTreeSet};

use dtranche_types::ComponentKind;

use crate::{OrchestratorError, Result};

/// Topological deployment order covering `kinds` and everything they depend on.
///
/// # Errors
///
/// - [`OrchestratorError::Config`] if the dependency graph has a cycle
pub fn deployment_order(kinds: &[ComponentKind]) -> Result<Vec<ComponentKind>> {
    let mut pending: BTreeMap<ComponentKind, BTreeSet<ComponentKind>> = BTreeMap::new();
    let mut stack: Vec<ComponentKind> = kinds.to_vec();
    while let Some(kind) = stack.pop() {
        if pending.contains_key(&kind) {
            continue;
        }
        let deps: BTreeSet<ComponentKind> = kind.dependencies().into_iter().collect();
        stack.extend(deps.iter().cloned());
        pending.insert(kind, deps);
    }

    let mut order = Vec::with_capacity(pending.len());
    let mut done: BTreeSet<ComponentKind> = BTreeSet::new();
    loop {
        let ready = pending
            .iter()
            .find(|(_, deps)| deps.iter().all(|dep| done.contains(dep)))
            .map(|(kind, _)| kind.clone());
        match ready {
            Some(kind) => {
                pending.remove(&kind);
                done.insert(kind.clone());
                order.push(kind);
            }
            None if pending.is_empty() => break,
            None => {
                let stuck: Vec<String> = pending.keys().map(ToString::to_string).collect();
                return Err(OrchestratorError::Config(format!(
                    "dependency cycle among: {}",
                    stuck.join(", ")
                )));
            }
        }
    }
    Ok(order)
}
