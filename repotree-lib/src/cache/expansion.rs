//! Expansion state

use dashmap::DashMap;

/// Which paths are currently open. Absent paths are collapsed.
#[derive(Debug, Default)]
pub struct ExpansionState {
    open: DashMap<String, bool>,
}

impl ExpansionState {
    /// Creates an empty expansion state (everything collapsed).
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns `true` if `path` is expanded.
    pub fn is_expanded(&self, path: &str) -> bool {
        self.open.get(path).is_some_and(|open| *open)
    }

    /// Flips `path` and returns the new state.
    ///
    /// The read and the write happen under one entry lock, so concurrent
    /// toggles never observe the same old value.
    pub fn toggle(&self, path: &str) -> bool {
        let mut open = self.open.entry(path.to_string()).or_insert(false);
        *open = !*open;
        *open
    }

    /// Sets `path` and returns the previous state.
    pub fn set(&self, path: &str, expanded: bool) -> bool {
        self.open
            .insert(path.to_string(), expanded)
            .unwrap_or(false)
    }

    /// Returns all expanded paths, in no particular order.
    pub fn expanded_paths(&self) -> Vec<String> {
        self.open
            .iter()
            .filter(|entry| *entry.value())
            .map(|entry| entry.key().clone())
            .collect()
    }

    /// Collapses everything.
    pub fn clear(&self) {
        self.open.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_absent_is_collapsed() {
        let state = ExpansionState::new();
        assert!(!state.is_expanded("src"));
    }

    #[test]
    fn test_toggle_twice_restores() {
        let state = ExpansionState::new();
        assert!(state.toggle("src"));
        assert!(state.is_expanded("src"));
        assert!(!state.toggle("src"));
        assert!(!state.is_expanded("src"));
    }

    #[test]
    fn test_set_returns_previous() {
        let state = ExpansionState::new();
        assert!(!state.set("src", true));
        assert!(state.set("src", true));
        assert!(state.set("src", false));
        assert!(state.expanded_paths().is_empty());
    }
}
