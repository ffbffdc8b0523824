//! The user's library: favorites, watch history and recent searches behind
//! one handle.
//!
//! Built once at startup and passed to every consumer; there is no global.

use crate::storage::backend::KeyValueStore;
use crate::storage::document::{FailureSink, JsonDocument, LogSink};
use crate::storage::favorites::{FAVORITES_KEY, FavoritesStore};
use crate::storage::history::{HISTORY_KEY, WatchHistory};
use crate::storage::searches::{RecentSearches, SEARCHES_KEY};
use std::sync::Arc;

#[derive(Debug)]
pub struct Library {
    pub favorites: FavoritesStore,
    pub history: WatchHistory,
    pub searches: RecentSearches,
}

impl Library {
    /// Open every store over one backend, logging persistence failures
    pub fn open(backend: Arc<dyn KeyValueStore>, history_capacity: usize) -> Self {
        Self::open_with_sink(backend, history_capacity, Arc::new(LogSink))
    }

    pub fn open_with_sink(
        backend: Arc<dyn KeyValueStore>,
        history_capacity: usize,
        sink: Arc<dyn FailureSink>,
    ) -> Self {
        let favorites = FavoritesStore::load(JsonDocument::new(
            FAVORITES_KEY,
            Arc::clone(&backend),
            Arc::clone(&sink),
        ));
        let history = WatchHistory::load(
            JsonDocument::new(HISTORY_KEY, Arc::clone(&backend), Arc::clone(&sink)),
            history_capacity,
        );
        let searches = RecentSearches::load(JsonDocument::new(SEARCHES_KEY, backend, sink));

        Self {
            favorites,
            history,
            searches,
        }
    }
}
