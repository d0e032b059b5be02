use std::collections::VecDeque;

use crate::model::LogEntry;

pub const LOG_CAPACITY: usize = 100;

// Fixed-capacity FIFO of log entries. Appends evict from the head once the
// capacity is reached; entries are never reordered.
#[derive(Debug, Clone)]
pub struct LogRing {
    entries: VecDeque<LogEntry>,
    capacity: usize,
}

impl Default for LogRing {
    fn default() -> Self {
        Self::new(LOG_CAPACITY)
    }
}

impl LogRing {
    pub fn new(capacity: usize) -> Self {
        Self {
            entries: VecDeque::with_capacity(capacity),
            capacity,
        }
    }

    pub fn append(&mut self, entry: LogEntry) {
        self.entries.push_back(entry);
        while self.entries.len() > self.capacity {
            self.entries.pop_front();
        }
    }

    // Seeds the buffer from a full snapshot, keeping the last `capacity`
    // entries in arrival order.
    pub fn replace_all(&mut self, entries: Vec<LogEntry>) {
        let skip = entries.len().saturating_sub(self.capacity);
        self.entries = entries.into_iter().skip(skip).collect();
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &LogEntry> {
        self.entries.iter()
    }

    #[allow(dead_code)]
    pub fn last(&self) -> Option<&LogEntry> {
        self.entries.back()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::LogLevel;

    fn entry(n: usize) -> LogEntry {
        LogEntry {
            level: LogLevel::Info,
            message: format!("line {n}"),
            timestamp: format!("2024-01-01T00:00:{:02}Z", n % 60),
        }
    }

    #[test]
    fn append_stays_within_capacity() {
        let mut ring = LogRing::default();
        for n in 0..250 {
            ring.append(entry(n));
            assert!(ring.len() <= LOG_CAPACITY);
        }
        assert_eq!(ring.len(), LOG_CAPACITY);
    }

    #[test]
    fn append_keeps_last_entries_in_order() {
        let mut ring = LogRing::default();
        for n in 0..250 {
            ring.append(entry(n));
        }
        let messages: Vec<&str> = ring.iter().map(|e| e.message.as_str()).collect();
        let expected: Vec<String> = (150..250).map(|n| format!("line {n}")).collect();
        assert_eq!(messages, expected);
    }

    #[test]
    fn append_below_capacity_preserves_everything() {
        let mut ring = LogRing::default();
        for n in 0..5 {
            ring.append(entry(n));
        }
        assert_eq!(ring.len(), 5);
        assert_eq!(ring.last().unwrap().message, "line 4");
    }

    #[test]
    fn replace_all_truncates_to_last_capacity_entries() {
        let mut ring = LogRing::default();
        ring.replace_all((0..130).map(entry).collect());
        assert_eq!(ring.len(), LOG_CAPACITY);
        assert_eq!(ring.iter().next().unwrap().message, "line 30");
        assert_eq!(ring.last().unwrap().message, "line 129");
    }

    #[test]
    fn replace_all_with_short_snapshot_keeps_given_order() {
        let mut ring = LogRing::default();
        for n in 0..50 {
            ring.append(entry(n));
        }
        ring.replace_all((100..103).map(entry).collect());
        let messages: Vec<&str> = ring.iter().map(|e| e.message.as_str()).collect();
        assert_eq!(messages, vec!["line 100", "line 101", "line 102"]);
    }
}
