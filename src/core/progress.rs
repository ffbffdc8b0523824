//! Playback progress reporting
//!
//! The player samples its position far more often than history should be
//! written. [`ProgressTracker`] sits between the two: it saves at most once
//! per interval and always writes the last known position when playback ends.

use crate::storage::history::WatchHistory;
use crate::types::{HistoryEntry, MovieRecord, Progress};
use std::time::{Duration, Instant};

/// Positions closer than this to the start are not worth resuming
const MIN_RESUME_SECS: f64 = 5.0;

/// Where to start playback, if anywhere but the beginning
pub fn resume_offset(progress: Option<Progress>, completed_percent: f64) -> Option<f64> {
    let progress = progress?;
    if progress.current_time < MIN_RESUME_SECS || progress.progress >= completed_percent {
        return None;
    }
    Some(progress.current_time)
}

/// Throttled writer of one movie's playback position.
///
/// Dropping the tracker flushes the pending position, so an early return
/// from the playback loop cannot lose it.
#[derive(Debug)]
pub struct ProgressTracker<'a> {
    history: &'a WatchHistory,
    movie: MovieRecord,
    interval: Duration,
    last_save: Option<Instant>,
    pending: Option<(f64, f64)>,
}

impl<'a> ProgressTracker<'a> {
    pub fn new(history: &'a WatchHistory, movie: MovieRecord, interval: Duration) -> Self {
        Self {
            history,
            movie,
            interval,
            last_save: None,
            pending: None,
        }
    }

    pub fn movie(&self) -> &MovieRecord {
        &self.movie
    }

    /// Report a playback sample. Returns true if it was written through.
    pub fn record(&mut self, current_time: f64, duration: f64, now: Instant) -> bool {
        let due = self
            .last_save
            .is_none_or(|last| now.saturating_duration_since(last) >= self.interval);

        if !due {
            self.pending = Some((current_time, duration));
            return false;
        }

        self.history.save_progress(&self.movie, current_time, duration);
        self.last_save = Some(now);
        self.pending = None;
        true
    }

    /// Write the last unsaved sample, if any
    pub fn finish(mut self) -> Option<HistoryEntry> {
        self.flush()
    }

    fn flush(&mut self) -> Option<HistoryEntry> {
        let (current_time, duration) = self.pending.take()?;
        tracing::debug!(movie_id = %self.movie.movie_id, current_time, "flushing final position");
        Some(self.history.save_progress(&self.movie, current_time, duration))
    }
}

impl Drop for ProgressTracker<'_> {
    fn drop(&mut self) {
        self.flush();
    }
}
