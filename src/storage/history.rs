//! Watch history management

use crate::storage::document::JsonDocument;
use crate::types::{HistoryEntry, MovieRecord, Progress};
use chrono::Utc;
use std::collections::HashSet;
use tokio::sync::watch;

/// Storage key of the history document
pub const HISTORY_KEY: &str = "mflix_history";

pub const DEFAULT_CAPACITY: usize = 10;

/// Playback positions, most recently saved first, one per movie, bounded.
#[derive(Debug)]
pub struct WatchHistory {
    document: JsonDocument,
    capacity: usize,
    state: watch::Sender<Vec<HistoryEntry>>,
}

/// Negative, NaN and infinite positions all mean "unknown"
fn seconds(value: f64) -> f64 {
    if value.is_finite() && value > 0.0 {
        value
    } else {
        0.0
    }
}

/// Percentage watched; zero while the duration is unknown
pub fn compute_progress(current_time: f64, duration: f64) -> f64 {
    let (current_time, duration) = (seconds(current_time), seconds(duration));
    if duration > 0.0 {
        (current_time / duration * 100.0).clamp(0.0, 100.0)
    } else {
        0.0
    }
}

impl WatchHistory {
    pub fn load(document: JsonDocument, capacity: usize) -> Self {
        let capacity = capacity.max(1);
        let stored: Vec<HistoryEntry> = document.load();

        let mut seen = HashSet::new();
        let mut entries: Vec<HistoryEntry> = stored
            .into_iter()
            .filter(|e| seen.insert(e.movie.movie_id.clone()))
            .collect();
        entries.truncate(capacity);

        tracing::debug!(key = document.key(), count = entries.len(), capacity, "history loaded");

        Self {
            document,
            capacity,
            state: watch::Sender::new(entries),
        }
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Snapshot of all entries, newest first
    pub fn list(&self) -> Vec<HistoryEntry> {
        self.state.borrow().clone()
    }

    pub fn len(&self) -> usize {
        self.state.borrow().len()
    }

    pub fn is_empty(&self) -> bool {
        self.state.borrow().is_empty()
    }

    /// Record the playback position of a movie.
    ///
    /// Replaces any earlier entry for the same movie and moves it to the
    /// front; the oldest entries fall off once capacity is exceeded.
    pub fn save_progress(
        &self,
        movie: &MovieRecord,
        current_time: f64,
        duration: f64,
    ) -> HistoryEntry {
        let entry = HistoryEntry {
            movie: movie.clone(),
            progress: compute_progress(current_time, duration),
            last_watched: Utc::now().timestamp_millis(),
            current_time: seconds(current_time),
            duration: seconds(duration),
        };

        let mut written = Ok(());
        self.state.send_modify(|entries| {
            entries.retain(|e| e.movie.movie_id != movie.movie_id);
            entries.insert(0, entry.clone());
            entries.truncate(self.capacity);
            written = self.document.save(entries);
        });
        self.document.report(written);

        tracing::debug!(
            movie_id = %movie.movie_id,
            progress = entry.progress,
            current_time = entry.current_time,
            "progress saved"
        );
        entry
    }

    pub fn get_progress(&self, movie_id: &str) -> Option<Progress> {
        self.state
            .borrow()
            .iter()
            .find(|e| e.movie.movie_id == movie_id)
            .map(|e| Progress {
                progress: e.progress,
                current_time: e.current_time,
            })
    }

    /// Returns false if there was no entry for the movie
    pub fn remove_from_history(&self, movie_id: &str) -> bool {
        let mut written = Ok(());
        let removed = self.state.send_if_modified(|entries| {
            let before = entries.len();
            entries.retain(|e| e.movie.movie_id != movie_id);
            if entries.len() == before {
                return false;
            }
            written = self.document.save(entries);
            true
        });
        self.document.report(written);

        if removed {
            tracing::debug!(movie_id, "removed from history");
        }
        removed
    }

    /// Drop every entry and delete the stored document
    pub fn clear_history(&self) {
        let mut written = Ok(());
        self.state.send_modify(|entries| {
            entries.clear();
            written = self.document.clear();
        });
        self.document.report(written);
        tracing::info!("history cleared");
    }

    /// Sum of the saved playback positions, in seconds
    pub fn total_watched_seconds(&self) -> f64 {
        self.state.borrow().iter().map(|e| e.current_time).sum()
    }

    /// Sum of the listed runtimes of every movie in the history, in minutes.
    /// Movies without a readable runtime count as zero.
    pub fn total_runtime_minutes(&self) -> u64 {
        self.state
            .borrow()
            .iter()
            .map(|e| e.movie.runtime_minutes())
            .sum()
    }

    /// Receiver that observes every committed change to the history
    pub fn subscribe(&self) -> watch::Receiver<Vec<HistoryEntry>> {
        self.state.subscribe()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::StorageError;
    use crate::storage::backend::{KeyValueStore, MemoryStore};
    use crate::storage::document::{FailureSink, LogSink};
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::{Arc, OnceLock, mpsc};
    use std::time::Duration;

    fn open(backend: &Arc<MemoryStore>, capacity: usize) -> WatchHistory {
        WatchHistory::load(
            JsonDocument::new(HISTORY_KEY, backend.clone(), Arc::new(LogSink)),
            capacity,
        )
    }

    fn movie(n: usize) -> MovieRecord {
        MovieRecord::new(format!("m{n}"), format!("Movie {n}"))
    }

    fn ids(history: &WatchHistory) -> Vec<String> {
        history.list().into_iter().map(|e| e.movie.movie_id).collect()
    }

    #[test]
    fn keeps_only_the_most_recent_ten() {
        let history = open(&Arc::new(MemoryStore::new()), DEFAULT_CAPACITY);
        for n in 0..13 {
            history.save_progress(&movie(n), 10.0, 100.0);
        }

        let expected: Vec<String> = (3..13).rev().map(|n| format!("m{n}")).collect();
        assert_eq!(ids(&history), expected);
    }

    #[test]
    fn resave_replaces_entry_and_moves_it_to_front() {
        let history = open(&Arc::new(MemoryStore::new()), DEFAULT_CAPACITY);
        history.save_progress(&movie(1), 10.0, 100.0);
        history.save_progress(&movie(2), 10.0, 100.0);
        history.save_progress(&movie(1), 30.0, 100.0);

        assert_eq!(ids(&history), vec!["m1", "m2"]);
        let front = &history.list()[0];
        assert_eq!(front.current_time, 30.0);
        assert!((front.progress - 30.0).abs() < 1e-9);
    }

    #[test]
    fn progress_is_percentage_or_zero() {
        let history = open(&Arc::new(MemoryStore::new()), DEFAULT_CAPACITY);

        assert_eq!(history.save_progress(&movie(1), 45.0, 90.0).progress, 50.0);
        assert_eq!(history.save_progress(&movie(2), 10.0, 0.0).progress, 0.0);
        assert_eq!(history.save_progress(&movie(3), 10.0, f64::NAN).progress, 0.0);
        assert_eq!(history.save_progress(&movie(4), 120.0, 90.0).progress, 100.0);

        let entry = history.save_progress(&movie(5), -3.0, 90.0);
        assert_eq!(entry.current_time, 0.0);
        assert_eq!(entry.progress, 0.0);
    }

    #[test]
    fn get_progress_reports_latest_position() {
        let history = open(&Arc::new(MemoryStore::new()), DEFAULT_CAPACITY);
        assert!(history.get_progress("m1").is_none());

        history.save_progress(&movie(1), 45.0, 90.0);
        assert_eq!(
            history.get_progress("m1"),
            Some(Progress {
                progress: 50.0,
                current_time: 45.0
            })
        );
    }

    #[test]
    fn remove_drops_exactly_one_entry() {
        let history = open(&Arc::new(MemoryStore::new()), DEFAULT_CAPACITY);
        for n in 0..3 {
            history.save_progress(&movie(n), 1.0, 2.0);
        }

        assert!(!history.remove_from_history("absent"));
        assert_eq!(history.len(), 3);

        assert!(history.remove_from_history("m1"));
        assert_eq!(ids(&history), vec!["m2", "m0"]);
    }

    #[test]
    fn clear_empties_memory_and_storage() {
        let backend = Arc::new(MemoryStore::new());
        let history = open(&backend, DEFAULT_CAPACITY);
        history.save_progress(&movie(1), 1.0, 2.0);

        history.clear_history();

        assert!(history.is_empty());
        assert!(backend.get(HISTORY_KEY).unwrap().is_none());
        assert!(open(&backend, DEFAULT_CAPACITY).is_empty());
    }

    #[test]
    fn reload_reproduces_history() {
        let backend = Arc::new(MemoryStore::new());
        let history = open(&backend, DEFAULT_CAPACITY);
        history.save_progress(&movie(1), 45.0, 90.0);
        history.save_progress(&movie(2), 5.0, 0.0);

        assert_eq!(open(&backend, DEFAULT_CAPACITY).list(), history.list());
    }

    #[test]
    fn reload_applies_smaller_capacity() {
        let backend = Arc::new(MemoryStore::new());
        let history = open(&backend, DEFAULT_CAPACITY);
        for n in 0..6 {
            history.save_progress(&movie(n), 1.0, 2.0);
        }

        let smaller = open(&backend, 3);
        assert_eq!(ids(&smaller), vec!["m5", "m4", "m3"]);
    }

    #[test]
    fn corrupt_storage_yields_empty_history() {
        let backend = Arc::new(MemoryStore::new());
        backend.set(HISTORY_KEY, "not json at all").unwrap();
        assert!(open(&backend, DEFAULT_CAPACITY).is_empty());

        backend.set(HISTORY_KEY, r#"[{"movie": {"movie_id": "m1"}}]"#).unwrap();
        assert!(open(&backend, DEFAULT_CAPACITY).is_empty());
    }

    #[test]
    fn zero_capacity_is_raised_to_one() {
        let history = open(&Arc::new(MemoryStore::new()), 0);
        history.save_progress(&movie(1), 1.0, 2.0);
        history.save_progress(&movie(2), 1.0, 2.0);

        assert_eq!(history.capacity(), 1);
        assert_eq!(ids(&history), vec!["m2"]);
    }

    #[test]
    fn total_watched_sums_positions() {
        let history = open(&Arc::new(MemoryStore::new()), DEFAULT_CAPACITY);
        history.save_progress(&movie(1), 60.0, 100.0);
        history.save_progress(&movie(2), 30.0, 100.0);

        assert_eq!(history.total_watched_seconds(), 90.0);
    }

    #[test]
    fn total_runtime_sums_listed_runtimes() {
        let history = open(&Arc::new(MemoryStore::new()), DEFAULT_CAPACITY);
        history.save_progress(&movie(1).with_field("runtime", "2h 15m"), 60.0, 100.0);
        history.save_progress(&movie(2).with_field("runtime", "9m"), 1.0, 100.0);
        history.save_progress(&movie(3), 1.0, 100.0);

        assert_eq!(history.total_runtime_minutes(), 144);
    }

    fn counting_sink() -> (Arc<dyn FailureSink>, Arc<AtomicUsize>) {
        let failures = Arc::new(AtomicUsize::new(0));
        let counter = Arc::clone(&failures);
        let sink: Arc<dyn FailureSink> = Arc::new(move |key: &str, _: &StorageError| {
            assert_eq!(key, HISTORY_KEY);
            counter.fetch_add(1, Ordering::SeqCst);
        });
        (sink, failures)
    }

    #[test]
    fn unavailable_storage_keeps_history_in_memory_and_reports() {
        let backend = Arc::new(MemoryStore::new());
        backend.set_available(false);
        let (sink, failures) = counting_sink();
        let history =
            WatchHistory::load(JsonDocument::new(HISTORY_KEY, backend, sink), DEFAULT_CAPACITY);
        assert_eq!(failures.load(Ordering::SeqCst), 1);

        history.save_progress(&movie(1), 45.0, 90.0);
        history.save_progress(&movie(2), 10.0, 90.0);
        assert_eq!(ids(&history), vec!["m2", "m1"]);
        assert_eq!(history.get_progress("m1").map(|p| p.current_time), Some(45.0));
        assert_eq!(failures.load(Ordering::SeqCst), 3);

        assert!(history.remove_from_history("m2"));
        assert_eq!(failures.load(Ordering::SeqCst), 4);

        history.clear_history();
        assert!(history.is_empty());
        assert_eq!(failures.load(Ordering::SeqCst), 5);
    }

    #[test]
    fn sink_can_read_the_history_it_reports_for() {
        let backend = Arc::new(MemoryStore::new());
        backend.set_available(false);
        let slot: Arc<OnceLock<Arc<WatchHistory>>> = Arc::new(OnceLock::new());
        let seen_len = Arc::new(AtomicUsize::new(usize::MAX));

        let (history_slot, seen) = (Arc::clone(&slot), Arc::clone(&seen_len));
        let sink: Arc<dyn FailureSink> = Arc::new(move |_: &str, _: &StorageError| {
            if let Some(history) = history_slot.get() {
                seen.store(history.len(), Ordering::SeqCst);
            }
        });
        let history = Arc::new(WatchHistory::load(
            JsonDocument::new(HISTORY_KEY, backend, sink),
            DEFAULT_CAPACITY,
        ));
        let _ = slot.set(Arc::clone(&history));

        let (done_tx, done_rx) = mpsc::channel();
        let worker = Arc::clone(&history);
        std::thread::spawn(move || {
            worker.save_progress(&movie(1), 45.0, 90.0);
            let _ = done_tx.send(());
        });
        done_rx
            .recv_timeout(Duration::from_secs(3))
            .expect("save finished while the sink read the history");
        assert_eq!(seen_len.load(Ordering::SeqCst), 1);

        let (done_tx, done_rx) = mpsc::channel();
        let worker = Arc::clone(&history);
        std::thread::spawn(move || {
            worker.clear_history();
            let _ = done_tx.send(());
        });
        done_rx
            .recv_timeout(Duration::from_secs(3))
            .expect("clear finished while the sink read the history");
        assert_eq!(seen_len.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn subscribers_see_every_save() {
        let history = open(&Arc::new(MemoryStore::new()), DEFAULT_CAPACITY);
        let mut rx = history.subscribe();

        history.save_progress(&movie(1), 1.0, 2.0);
        assert!(rx.has_changed().unwrap());
        assert_eq!(rx.borrow_and_update()[0].movie.movie_id, "m1");

        history.remove_from_history("absent");
        assert!(!rx.has_changed().unwrap());
    }
}
