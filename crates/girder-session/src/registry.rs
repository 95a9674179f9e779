use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};

/// The set of task ids currently executing on the backend.
///
/// Independent of which task is foregrounded: several tasks can run at
/// once while the user watches one of them. Mutated only by lifecycle
/// events and by explicit user actions (prompt submit, approve, reject),
/// and cleared wholesale on transport disconnect — a stale "not running"
/// beats a stuck spinner.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RunningRegistry(BTreeSet<String>);

impl RunningRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, task_id: impl Into<String>) {
        self.0.insert(task_id.into());
    }

    pub fn remove(&mut self, task_id: &str) {
        self.0.remove(task_id);
    }

    pub fn clear(&mut self) {
        self.0.clear();
    }

    pub fn contains(&self, task_id: &str) -> bool {
        self.0.contains(task_id)
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.0.iter().map(String::as_str)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn insert_is_idempotent() {
        let mut registry = RunningRegistry::new();
        registry.insert("t-1");
        registry.insert("t-1");
        assert_eq!(registry.len(), 1);
        assert!(registry.contains("t-1"));
    }

    #[test]
    fn remove_unknown_id_is_a_noop() {
        let mut registry = RunningRegistry::new();
        registry.insert("t-1");
        registry.remove("t-2");
        assert!(registry.contains("t-1"));
    }

    #[test]
    fn clear_empties_multiple_entries() {
        let mut registry = RunningRegistry::new();
        registry.insert("t-1");
        registry.insert("t-2");
        registry.insert("t-3");
        registry.clear();
        assert!(registry.is_empty());
    }
}
