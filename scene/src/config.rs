use serde::{Deserialize, Serialize};

/// Runtime options for a [`crate::SceneGraph`].
///
/// Serializable so a host engine can keep it alongside its own settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct GraphConfig {
    /// Number of node slots to reserve up front.
    pub initial_capacity: usize,
    /// Log a warning whenever a degenerate input is replaced by a fallback
    /// (identity rotation, ignored offset).
    pub degenerate_warnings: bool,
    /// Queue a [`crate::HierarchyEvent`] for every attach, detach and destroy,
    /// to be collected with [`crate::SceneGraph::drain_events`].
    pub record_events: bool,
}

impl Default for GraphConfig {
    fn default() -> Self {
        Self {
            initial_capacity: 64,
            degenerate_warnings: true,
            record_events: false,
        }
    }
}

impl GraphConfig {
    pub fn with_capacity(mut self, capacity: usize) -> Self {
        self.initial_capacity = capacity;
        self
    }

    pub fn with_degenerate_warnings(mut self, enabled: bool) -> Self {
        self.degenerate_warnings = enabled;
        self
    }

    pub fn with_event_recording(mut self, enabled: bool) -> Self {
        self.record_events = enabled;
        self
    }
}
