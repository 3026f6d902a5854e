//! Display-ready activity records and the live per-turn buffer that collects them.

use serde::{Deserialize, Serialize};

/// Display-ready description of one step the agent took.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ActivityRecord {
    pub title: String,
    pub description: String,
}

impl ActivityRecord {
    #[must_use]
    pub fn new(title: impl Into<String>, description: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            description: description.into(),
        }
    }
}

/// Ordered activity of the turn currently in flight.
///
/// Only the session writes to it: `reset` once per submitted turn, then `append` for
/// every classified event. Consumers that outlive the turn must take a `snapshot`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LiveTimeline {
    records: Vec<ActivityRecord>,
}

impl LiveTimeline {
    pub fn append(&mut self, record: ActivityRecord) {
        self.records.push(record);
    }

    pub fn reset(&mut self) {
        self.records.clear();
    }

    #[must_use]
    pub fn records(&self) -> &[ActivityRecord] {
        &self.records
    }

    /// Returns an owned copy that later appends or resets cannot reach.
    #[must_use]
    pub fn snapshot(&self) -> Vec<ActivityRecord> {
        self.records.clone()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.records.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}
