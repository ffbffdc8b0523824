//! Recent searches

use crate::storage::document::JsonDocument;
use tokio::sync::watch;

/// Storage key of the recent-searches document
pub const SEARCHES_KEY: &str = "mflix_searches";

/// Terms kept at most
pub const MAX_RECENT: usize = 8;

/// Search terms, newest first, without duplicates
#[derive(Debug)]
pub struct RecentSearches {
    document: JsonDocument,
    state: watch::Sender<Vec<String>>,
}

impl RecentSearches {
    pub fn load(document: JsonDocument) -> Self {
        let mut terms: Vec<String> = Vec::new();
        for term in document.load::<Vec<String>>() {
            if !term.trim().is_empty() && !terms.contains(&term) {
                terms.push(term);
            }
        }
        terms.truncate(MAX_RECENT);

        tracing::debug!(key = document.key(), count = terms.len(), "recent searches loaded");

        Self {
            document,
            state: watch::Sender::new(terms),
        }
    }

    /// Snapshot of the terms, newest first
    pub fn list(&self) -> Vec<String> {
        self.state.borrow().clone()
    }

    pub fn len(&self) -> usize {
        self.state.borrow().len()
    }

    pub fn is_empty(&self) -> bool {
        self.state.borrow().is_empty()
    }

    /// Move `term` to the front, dropping the oldest beyond [`MAX_RECENT`].
    /// Blank terms are ignored.
    pub fn record(&self, term: &str) -> bool {
        let term = term.trim();
        if term.is_empty() {
            return false;
        }

        let mut written = Ok(());
        let changed = self.state.send_if_modified(|terms| {
            if terms.first().is_some_and(|t| t == term) {
                return false;
            }
            terms.retain(|t| t != term);
            terms.insert(0, term.to_string());
            terms.truncate(MAX_RECENT);
            written = self.document.save(terms);
            true
        });
        self.document.report(written);

        if changed {
            tracing::debug!(term, "search recorded");
        }
        changed
    }

    /// Forget every term and delete the stored document
    pub fn clear(&self) {
        let mut written = Ok(());
        self.state.send_modify(|terms| {
            terms.clear();
            written = self.document.clear();
        });
        self.document.report(written);
        tracing::debug!("recent searches cleared");
    }

    pub fn subscribe(&self) -> watch::Receiver<Vec<String>> {
        self.state.subscribe()
    }
}
