//! Change Tracker
//!
//! Listener handles for the containers whose controls can diverge the live
//! settings from the active scenario. Containers get re-rendered and replaced
//! by their owning modules, which then reattach; changes reported through a
//! replaced or detached handle are ignored.

use std::collections::HashMap;
use std::sync::Arc;

/// Controls whose interaction marks the live settings as modified
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TrackedControl {
    /// Add/remove/apply filter buttons
    FilterButton,
    /// Field enable checkbox
    EnableToggle,
    /// Numeric format select
    FormatSelect,
    /// Info tip text input
    TipInput,
    /// Transformation rule buttons
    RuleButton,
    /// Save button of a settings modal
    ModalSave,
}

/// Handle returned when a container is attached
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ListenerHandle {
    container: Arc<str>,
    generation: u64,
}

impl ListenerHandle {
    pub fn container(&self) -> &str {
        &self.container
    }

    pub fn generation(&self) -> u64 {
        self.generation
    }
}

/// Registry of live listener handles, one per container
#[derive(Debug, Default)]
pub struct ChangeTracker {
    listeners: HashMap<Arc<str>, u64>,
    next_generation: u64,
}

impl ChangeTracker {
    pub fn new() -> Self {
        Self::default()
    }

    /// Attach to a container, replacing any previous handle for it
    pub fn attach(&mut self, container: &str) -> ListenerHandle {
        self.next_generation += 1;
        let container: Arc<str> = Arc::from(container);
        let replaced = self
            .listeners
            .insert(container.clone(), self.next_generation)
            .is_some();

        tracing::debug!(container = %container, generation = self.next_generation, replaced, "Attached change listener");

        ListenerHandle {
            container,
            generation: self.next_generation,
        }
    }

    /// Detach a handle; stale handles are a no-op
    pub fn detach(&mut self, handle: &ListenerHandle) -> bool {
        if self.is_live(handle) {
            self.listeners.remove(&handle.container);
            true
        } else {
            false
        }
    }

    /// Drop every listener (teardown before re-initialization)
    pub fn detach_all(&mut self) {
        self.listeners.clear();
    }

    /// Whether the handle is the current one for its container
    pub fn is_live(&self, handle: &ListenerHandle) -> bool {
        self.listeners.get(&handle.container) == Some(&handle.generation)
    }

    /// Attached container names, sorted
    pub fn containers(&self) -> Vec<&str> {
        let mut containers: Vec<&str> = self.listeners.keys().map(|c| c.as_ref()).collect();
        containers.sort_unstable();
        containers
    }

    pub fn len(&self) -> usize {
        self.listeners.len()
    }

    pub fn is_empty(&self) -> bool {
        self.listeners.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn reattach_invalidates_previous_handle() {
        let mut tracker = ChangeTracker::new();
        let first = tracker.attach("filters-panel");
        let second = tracker.attach("filters-panel");

        assert!(!tracker.is_live(&first));
        assert!(tracker.is_live(&second));
        assert_eq!(tracker.len(), 1);
    }

    #[test]
    fn stale_detach_keeps_current_listener() {
        let mut tracker = ChangeTracker::new();
        let first = tracker.attach("rules-panel");
        let second = tracker.attach("rules-panel");

        assert!(!tracker.detach(&first));
        assert!(tracker.is_live(&second));
        assert!(tracker.detach(&second));
        assert!(tracker.is_empty());
    }

    #[test]
    fn containers_are_listed_sorted() {
        let mut tracker = ChangeTracker::new();
        tracker.attach("rules-panel");
        tracker.attach("field-config-table");
        assert_eq!(tracker.containers(), vec!["field-config-table", "rules-panel"]);

        tracker.detach_all();
        assert!(tracker.is_empty());
    }
}
