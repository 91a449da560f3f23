use std::collections::VecDeque;

use crate::LogEntry;

/// Append-only log of the events received on one subscription.
///
/// Entries keep their arrival order. With a limit set, the oldest entries
/// are evicted first once the log is full.
#[derive(Debug, Clone, Default)]
pub struct EventLog {
    entries: VecDeque<LogEntry>,
    limit: Option<usize>,
}

impl EventLog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_limit(limit: Option<usize>) -> Self {
        Self {
            entries: VecDeque::new(),
            limit: limit.filter(|l| *l > 0),
        }
    }

    pub fn push(&mut self, entry: LogEntry) {
        if let Some(limit) = self.limit {
            while self.entries.len() >= limit {
                self.entries.pop_front();
            }
        }
        self.entries.push_back(entry);
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn limit(&self) -> Option<usize> {
        self.limit
    }

    pub fn get(&self, index: usize) -> Option<&LogEntry> {
        self.entries.get(index)
    }

    pub fn last(&self) -> Option<&LogEntry> {
        self.entries.back()
    }

    pub fn iter(&self) -> impl DoubleEndedIterator<Item = &LogEntry> + ExactSizeIterator {
        self.entries.iter()
    }

    pub fn to_vec(&self) -> Vec<LogEntry> {
        self.entries.iter().cloned().collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn keeps_arrival_order_without_dedup() {
        let mut log = EventLog::new();
        log.push(LogEntry::success("a"));
        log.push(LogEntry::success("a"));
        log.push(LogEntry::info("b"));

        let contents: Vec<&str> = log.iter().map(|e| e.content.as_str()).collect();
        assert_eq!(contents, ["a", "a", "b"]);
    }

    #[test]
    fn limit_evicts_oldest() {
        let mut log = EventLog::with_limit(Some(2));
        for i in 0..5 {
            log.push(LogEntry::success(i.to_string()));
        }

        assert_eq!(log.len(), 2);
        assert_eq!(log.get(0).map(|e| e.content.as_str()), Some("3"));
        assert_eq!(log.last().map(|e| e.content.as_str()), Some("4"));
    }

    #[test]
    fn zero_limit_means_unbounded() {
        let mut log = EventLog::with_limit(Some(0));
        for _ in 0..100 {
            log.push(LogEntry::info("x"));
        }
        assert_eq!(log.limit(), None);
        assert_eq!(log.len(), 100);
    }
}
