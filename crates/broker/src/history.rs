#![forbid(unsafe_code)]

use crate::types::{HistoryAction, HistoryEntry};
use gm_core::time::now_ms;
use serde_json::Value;
use std::collections::VecDeque;

/// Bounded audit ring. When full, the oldest entry is dropped.
#[derive(Debug)]
pub(crate) struct BrokerHistory {
    entries: VecDeque<HistoryEntry>,
    capacity: usize,
}

impl BrokerHistory {
    pub(crate) fn new(capacity: usize) -> Self {
        Self {
            entries: VecDeque::with_capacity(capacity.min(64)),
            capacity: capacity.max(1),
        }
    }

    pub(crate) fn push(&mut self, action: HistoryAction, agent_id: Option<&str>, detail: Value) {
        if self.entries.len() == self.capacity {
            self.entries.pop_front();
        }
        self.entries.push_back(HistoryEntry {
            ts_ms: now_ms(),
            action,
            agent_id: agent_id.map(|s| s.to_string()),
            detail,
        });
    }

    /// Newest `limit` entries, newest first.
    pub(crate) fn newest(&self, limit: usize) -> Vec<HistoryEntry> {
        self.entries.iter().rev().take(limit).cloned().collect()
    }

    #[cfg(test)]
    pub(crate) fn len(&self) -> usize {
        self.entries.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn oldest_entries_are_evicted_first() {
        let mut history = BrokerHistory::new(3);
        for index in 0..5 {
            history.push(HistoryAction::CommandQueued, None, json!({ "index": index }));
        }
        assert_eq!(history.len(), 3);
        let newest = history.newest(10);
        assert_eq!(newest.len(), 3);
        assert_eq!(newest[0].detail["index"], 4);
        assert_eq!(newest[2].detail["index"], 2);
    }

    #[test]
    fn newest_respects_the_limit() {
        let mut history = BrokerHistory::new(10);
        for index in 0..4 {
            history.push(HistoryAction::WaitStarted, Some("agent"), json!({ "index": index }));
        }
        let newest = history.newest(2);
        assert_eq!(newest.len(), 2);
        assert_eq!(newest[0].detail["index"], 3);
        assert_eq!(newest[1].detail["index"], 2);
    }
}
