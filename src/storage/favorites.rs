//! My List: movies the user has saved

use crate::storage::document::JsonDocument;
use crate::types::MovieRecord;
use std::collections::HashSet;
use tokio::sync::watch;

/// Storage key of the favorites document
pub const FAVORITES_KEY: &str = "mflix_watchlist";

/// Saved movies, newest first, at most one per `movie_id`.
///
/// The watch channel holds the live list. Each mutation runs as one
/// `send_if_modified` closure, so the decision, the write-through and the
/// notification all happen against the current state. Write failures reach
/// the sink only after the channel lock is released.
#[derive(Debug)]
pub struct FavoritesStore {
    document: JsonDocument,
    state: watch::Sender<Vec<MovieRecord>>,
}

impl FavoritesStore {
    /// Hydrate from the document; duplicate ids in stored data keep their first occurrence
    pub fn load(document: JsonDocument) -> Self {
        let stored: Vec<MovieRecord> = document.load();
        let mut seen = HashSet::new();
        let movies: Vec<MovieRecord> = stored
            .into_iter()
            .filter(|m| seen.insert(m.movie_id.clone()))
            .collect();

        tracing::debug!(key = document.key(), count = movies.len(), "favorites loaded");

        Self {
            document,
            state: watch::Sender::new(movies),
        }
    }

    /// Snapshot of the list, newest first
    pub fn list(&self) -> Vec<MovieRecord> {
        self.state.borrow().clone()
    }

    pub fn len(&self) -> usize {
        self.state.borrow().len()
    }

    pub fn is_empty(&self) -> bool {
        self.state.borrow().is_empty()
    }

    pub fn contains(&self, movie_id: &str) -> bool {
        self.state.borrow().iter().any(|m| m.movie_id == movie_id)
    }

    /// Save a movie at the front. Returns false if it was already saved;
    /// the existing entry keeps its position and snapshot.
    pub fn add(&self, movie: &MovieRecord) -> bool {
        let mut written = Ok(());
        let added = self.state.send_if_modified(|movies| {
            if movies.iter().any(|m| m.movie_id == movie.movie_id) {
                return false;
            }
            movies.insert(0, movie.clone());
            written = self.document.save(movies);
            true
        });
        self.document.report(written);

        if added {
            tracing::debug!(movie_id = %movie.movie_id, "added to favorites");
        }
        added
    }

    /// Returns false if nothing was removed
    pub fn remove(&self, movie_id: &str) -> bool {
        let mut written = Ok(());
        let removed = self.state.send_if_modified(|movies| {
            let before = movies.len();
            movies.retain(|m| m.movie_id != movie_id);
            if movies.len() == before {
                return false;
            }
            written = self.document.save(movies);
            true
        });
        self.document.report(written);

        if removed {
            tracing::debug!(movie_id, "removed from favorites");
        }
        removed
    }

    /// Flip membership based on the live list. Returns true if the movie is
    /// now saved.
    pub fn toggle(&self, movie: &MovieRecord) -> bool {
        let mut saved = false;
        let mut written = Ok(());
        self.state.send_if_modified(|movies| {
            match movies.iter().position(|m| m.movie_id == movie.movie_id) {
                Some(index) => {
                    movies.remove(index);
                }
                None => {
                    movies.insert(0, movie.clone());
                    saved = true;
                }
            }
            written = self.document.save(movies);
            true
        });
        self.document.report(written);

        tracing::debug!(movie_id = %movie.movie_id, saved, "favorite toggled");
        saved
    }

    /// Receiver that observes every committed change to the list
    pub fn subscribe(&self) -> watch::Receiver<Vec<MovieRecord>> {
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

    fn open(backend: &Arc<MemoryStore>) -> FavoritesStore {
        FavoritesStore::load(JsonDocument::new(
            FAVORITES_KEY,
            backend.clone(),
            Arc::new(LogSink),
        ))
    }

    fn ids(store: &FavoritesStore) -> Vec<String> {
        store.list().into_iter().map(|m| m.movie_id).collect()
    }

    #[test]
    fn add_is_idempotent() {
        let store = open(&Arc::new(MemoryStore::new()));
        let movie = MovieRecord::new("m1", "Heat");

        assert!(store.add(&movie));
        assert!(!store.add(&movie));
        assert_eq!(ids(&store), vec!["m1"]);
    }

    #[test]
    fn add_prepends_and_keeps_existing_snapshot() {
        let store = open(&Arc::new(MemoryStore::new()));
        store.add(&MovieRecord::new("m1", "Heat"));
        store.add(&MovieRecord::new("m2", "Ronin"));
        store.add(&MovieRecord::new("m1", "Heat (Remastered)"));

        assert_eq!(ids(&store), vec!["m2", "m1"]);
        assert_eq!(store.list()[1].title(), "Heat");
    }

    #[test]
    fn toggle_twice_restores_original_state() {
        let store = open(&Arc::new(MemoryStore::new()));
        store.add(&MovieRecord::new("m0", "Alien"));
        let before = store.list();
        let movie = MovieRecord::new("m1", "Heat");

        assert!(store.toggle(&movie));
        assert!(store.contains("m1"));
        assert!(!store.toggle(&movie));
        assert!(!store.contains("m1"));
        assert_eq!(store.list(), before);
    }

    #[test]
    fn remove_absent_id_is_a_no_op() {
        let store = open(&Arc::new(MemoryStore::new()));
        store.add(&MovieRecord::new("m1", "Heat"));

        assert!(!store.remove("nope"));
        assert!(store.remove("m1"));
        assert!(store.is_empty());
    }

    #[test]
    fn reload_reproduces_list() {
        let backend = Arc::new(MemoryStore::new());
        let store = open(&backend);
        store.add(&MovieRecord::new("m1", "Heat").with_field("year", 1995));
        store.add(&MovieRecord::new("m2", "Ronin"));
        store.remove("nothing");

        let reloaded = open(&backend);
        assert_eq!(reloaded.list(), store.list());
    }

    #[test]
    fn corrupt_storage_yields_empty_list() {
        let backend = Arc::new(MemoryStore::new());
        backend.set(FAVORITES_KEY, "<html>").unwrap();
        assert!(open(&backend).is_empty());

        backend.set(FAVORITES_KEY, r#"[{"title": "no id"}]"#).unwrap();
        assert!(open(&backend).is_empty());
    }

    #[test]
    fn duplicate_stored_ids_are_collapsed() {
        let backend = Arc::new(MemoryStore::new());
        backend
            .set(
                FAVORITES_KEY,
                r#"[{"movie_id":"a","title":"first"},{"movie_id":"a","title":"second"}]"#,
            )
            .unwrap();

        let store = open(&backend);
        assert_eq!(store.len(), 1);
        assert_eq!(store.list()[0].title(), "first");
    }

    #[test]
    fn unavailable_storage_degrades_to_memory_and_reports() {
        let backend = Arc::new(MemoryStore::new());
        backend.set_available(false);
        let failures = Arc::new(AtomicUsize::new(0));
        let counter = Arc::clone(&failures);
        let sink: Arc<dyn FailureSink> = Arc::new(move |_: &str, _: &StorageError| {
            counter.fetch_add(1, Ordering::SeqCst);
        });
        let store = FavoritesStore::load(JsonDocument::new(FAVORITES_KEY, backend, sink));

        store.add(&MovieRecord::new("m1", "Heat"));
        store.toggle(&MovieRecord::new("m2", "Ronin"));

        assert_eq!(ids(&store), vec!["m2", "m1"]);
        // one failed load plus two failed writes
        assert_eq!(failures.load(Ordering::SeqCst), 3);
    }

    #[test]
    fn sink_can_read_the_store_it_reports_for() {
        let backend = Arc::new(MemoryStore::new());
        backend.set_available(false);
        let slot: Arc<OnceLock<Arc<FavoritesStore>>> = Arc::new(OnceLock::new());
        let seen_len = Arc::new(AtomicUsize::new(usize::MAX));

        let (store_slot, seen) = (Arc::clone(&slot), Arc::clone(&seen_len));
        let sink: Arc<dyn FailureSink> = Arc::new(move |_: &str, _: &StorageError| {
            if let Some(store) = store_slot.get() {
                seen.store(store.len(), Ordering::SeqCst);
            }
        });
        let store = Arc::new(FavoritesStore::load(JsonDocument::new(
            FAVORITES_KEY,
            backend,
            sink,
        )));
        let _ = slot.set(Arc::clone(&store));

        // a sink called under the channel lock would block forever
        let (done_tx, done_rx) = mpsc::channel();
        let worker = Arc::clone(&store);
        std::thread::spawn(move || {
            worker.add(&MovieRecord::new("m1", "Heat"));
            worker.toggle(&MovieRecord::new("m2", "Ronin"));
            let _ = done_tx.send(());
        });

        done_rx
            .recv_timeout(Duration::from_secs(3))
            .expect("writes finished while the sink read the store");
        assert_eq!(seen_len.load(Ordering::SeqCst), 2);
    }

    #[test]
    fn subscribers_see_changes_but_not_no_ops() {
        let store = open(&Arc::new(MemoryStore::new()));
        let mut rx = store.subscribe();
        let movie = MovieRecord::new("m1", "Heat");

        store.add(&movie);
        assert!(rx.has_changed().unwrap());
        assert_eq!(rx.borrow_and_update().len(), 1);

        store.add(&movie);
        store.remove("absent");
        assert!(!rx.has_changed().unwrap());

        store.toggle(&movie);
        assert!(rx.has_changed().unwrap());
        assert!(rx.borrow_and_update().is_empty());
    }

    #[test]
    fn concurrent_toggles_never_double_add() {
        let store = Arc::new(open(&Arc::new(MemoryStore::new())));
        let movie = MovieRecord::new("m1", "Heat");

        let handles: Vec<_> = (0..8)
            .map(|_| {
                let store = Arc::clone(&store);
                let movie = movie.clone();
                std::thread::spawn(move || store.toggle(&movie))
            })
            .collect();
        let adds = handles
            .into_iter()
            .map(|h| h.join().unwrap())
            .filter(|saved| *saved)
            .count();

        assert_eq!(adds, 4);
        assert!(!store.contains("m1"));
        assert!(store.len() <= 1);
    }
}
