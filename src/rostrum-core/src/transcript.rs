//! The transcript log.
//!
//! An ordered log of everything said and announced during a session. The
//! log only ever grows at the tail: entries are appended, and the final
//! entry may be replaced while a generated speech is being revealed.
//! Nothing is reordered or deleted, and timestamps never go backwards.
//!
//! Persistence sits a layer above: the controller pushes the full entry
//! list to the backend after each durable mutation, best effort, and keeps
//! this in-memory log as the source of truth.

use crate::session::TranscriptEntry;

#[derive(Debug, Clone, Default)]
pub struct TranscriptLog {
    entries: Vec<TranscriptEntry>,
}

impl TranscriptLog {
    pub fn new() -> Self {
        Self::default()
    }

    /// Wraps entries fetched from the backend, raising any timestamp that
    /// sits below its predecessor so the monotonic invariant holds locally.
    pub fn from_entries(mut entries: Vec<TranscriptEntry>) -> Self {
        for i in 1..entries.len() {
            if entries[i].timestamp < entries[i - 1].timestamp {
                entries[i].timestamp = entries[i - 1].timestamp;
            }
        }
        Self { entries }
    }

    /// Appends an entry at the tail. An entry stamped earlier than the
    /// current tail is raised to the tail's timestamp.
    pub fn append(&mut self, mut entry: TranscriptEntry) {
        if let Some(last) = self.entries.last() {
            if entry.timestamp < last.timestamp {
                entry.timestamp = last.timestamp;
            }
        }
        self.entries.push(entry);
    }

    /// Replaces the final entry. No-op on an empty log; returns whether a
    /// replacement happened.
    pub fn replace_last(&mut self, mut entry: TranscriptEntry) -> bool {
        let len = self.entries.len();
        if len == 0 {
            return false;
        }
        if len > 1 && entry.timestamp < self.entries[len - 2].timestamp {
            entry.timestamp = self.entries[len - 2].timestamp;
        }
        self.entries[len - 1] = entry;
        true
    }

    /// Rewrites just the text of the final entry. Used by the typing reveal
    /// between the placeholder append and the final replacement; not a
    /// durable mutation.
    pub(crate) fn set_last_text(&mut self, text: &str) -> bool {
        match self.entries.last_mut() {
            Some(entry) => {
                entry.text = text.to_string();
                true
            }
            None => false,
        }
    }

    pub fn entries(&self) -> &[TranscriptEntry] {
        &self.entries
    }

    pub fn last(&self) -> Option<&TranscriptEntry> {
        self.entries.last()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Snapshot for a persistence payload.
    pub fn to_vec(&self) -> Vec<TranscriptEntry> {
        self.entries.clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, Utc};

    #[test]
    fn test_replace_last_on_empty_log_is_noop() {
        let mut log = TranscriptLog::new();
        assert!(!log.replace_last(TranscriptEntry::info("Moderator", "nothing")));
        assert!(log.is_empty());
    }

    #[test]
    fn test_append_then_replace_keeps_length() {
        let mut log = TranscriptLog::new();
        log.append(TranscriptEntry::speech("Prime Minister", "Opening."));
        log.append(TranscriptEntry::info("Leader Of Opposition", "Thinking..."));
        assert_eq!(log.len(), 2);
        assert!(log.replace_last(TranscriptEntry::speech(
            "Leader Of Opposition",
            "Here is our case.",
        )));
        assert_eq!(log.len(), 2);
        assert_eq!(log.last().unwrap().text, "Here is our case.");
    }

    #[test]
    fn test_entries_keep_insertion_order() {
        let mut log = TranscriptLog::new();
        for i in 0..5 {
            log.append(TranscriptEntry::speech("Speaker", format!("part {i}")));
        }
        let texts: Vec<_> = log.entries().iter().map(|e| e.text.as_str()).collect();
        assert_eq!(texts, ["part 0", "part 1", "part 2", "part 3", "part 4"]);
    }

    #[test]
    fn test_append_raises_stale_timestamp() {
        let mut log = TranscriptLog::new();
        log.append(TranscriptEntry::speech("A", "first"));
        let tail = log.last().unwrap().timestamp;
        let stale =
            TranscriptEntry::speech("B", "second").with_timestamp(tail - Duration::seconds(30));
        log.append(stale);
        assert_eq!(log.entries()[1].timestamp, tail);
    }

    #[test]
    fn test_from_entries_normalizes_out_of_order_stamps() {
        let now = Utc::now();
        let entries = vec![
            TranscriptEntry::speech("A", "one").with_timestamp(now),
            TranscriptEntry::speech("B", "two").with_timestamp(now - Duration::seconds(5)),
            TranscriptEntry::speech("C", "three").with_timestamp(now + Duration::seconds(5)),
        ];
        let log = TranscriptLog::from_entries(entries);
        let stamps: Vec<_> = log.entries().iter().map(|e| e.timestamp).collect();
        assert!(stamps[0] <= stamps[1] && stamps[1] <= stamps[2]);
    }

    #[test]
    fn test_set_last_text_rewrites_in_place() {
        let mut log = TranscriptLog::new();
        assert!(!log.set_last_text("nobody home"));
        log.append(TranscriptEntry::speech("Whip", ""));
        assert!(log.set_last_text("partial rev"));
        assert_eq!(log.last().unwrap().text, "partial rev");
        assert_eq!(log.len(), 1);
    }
}
