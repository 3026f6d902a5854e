//! Session-lifetime archive of finalized activity, keyed by agent message id.

use std::collections::hash_map::Entry;
use std::collections::HashMap;

use agent_transport::MessageId;

use crate::timeline::ActivityRecord;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CommitOutcome {
    Recorded,
    /// The id already had an entry; the existing snapshot was kept.
    AlreadyRecorded,
}

/// Write-once map from agent message id to the activity that produced it.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct HistoryMap {
    entries: HashMap<MessageId, Vec<ActivityRecord>>,
}

impl HistoryMap {
    /// Stores `snapshot` under `message_id` unless that id was already committed.
    pub fn commit(&mut self, message_id: MessageId, snapshot: Vec<ActivityRecord>) -> CommitOutcome {
        match self.entries.entry(message_id) {
            Entry::Vacant(slot) => {
                slot.insert(snapshot);
                CommitOutcome::Recorded
            }
            Entry::Occupied(_) => CommitOutcome::AlreadyRecorded,
        }
    }

    #[must_use]
    pub fn get(&self, message_id: &MessageId) -> Option<&[ActivityRecord]> {
        self.entries.get(message_id).map(Vec::as_slice)
    }

    #[must_use]
    pub fn contains(&self, message_id: &MessageId) -> bool {
        self.entries.contains_key(message_id)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&MessageId, &[ActivityRecord])> {
        self.entries
            .iter()
            .map(|(message_id, records)| (message_id, records.as_slice()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn commit_records_a_new_entry() {
        let mut history = HistoryMap::default();
        let outcome = history.commit(
            MessageId::new("42"),
            vec![ActivityRecord::new("RAG", "routed")],
        );

        assert_eq!(outcome, CommitOutcome::Recorded);
        assert_eq!(
            history.get(&MessageId::new("42")),
            Some(&[ActivityRecord::new("RAG", "routed")][..])
        );
        assert_eq!(history.len(), 1);
    }

    #[test]
    fn commit_never_overwrites_an_existing_entry() {
        let mut history = HistoryMap::default();
        history.commit(MessageId::new("42"), vec![ActivityRecord::new("RAG", "first")]);

        let outcome = history.commit(
            MessageId::new("42"),
            vec![ActivityRecord::new("Analytic", "second")],
        );

        assert_eq!(outcome, CommitOutcome::AlreadyRecorded);
        assert_eq!(
            history.get(&MessageId::new("42")),
            Some(&[ActivityRecord::new("RAG", "first")][..])
        );
    }

    #[test]
    fn empty_snapshots_are_still_recorded() {
        let mut history = HistoryMap::default();
        history.commit(MessageId::new("7"), Vec::new());

        assert!(history.contains(&MessageId::new("7")));
        assert_eq!(history.get(&MessageId::new("7")), Some(&[][..]));
    }
}
