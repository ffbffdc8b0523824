//! Type definitions for mflix
//!
//! Source of truth for all data structures.

use clap::ValueEnum;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

// ============================================
// Catalog Types
// ============================================

/// A movie as delivered by the catalog.
///
/// Only `movie_id` is interpreted. Every other field is kept as-is so a
/// stored copy can render a card without going back to the catalog.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MovieRecord {
    pub movie_id: String,
    #[serde(flatten)]
    pub fields: Map<String, Value>,
}

impl MovieRecord {
    pub fn new(movie_id: impl Into<String>, title: impl Into<String>) -> Self {
        let mut fields = Map::new();
        fields.insert("title".into(), Value::String(title.into()));
        Self {
            movie_id: movie_id.into(),
            fields,
        }
    }

    /// Builder-style setter for an arbitrary descriptive field
    pub fn with_field(mut self, name: &str, value: impl Into<Value>) -> Self {
        self.fields.insert(name.into(), value.into());
        self
    }

    /// Read a descriptive field as text.
    ///
    /// The catalog is loosely typed (`"2024"` and `2024` both occur), so
    /// numbers and booleans are stringified. Empty strings count as absent.
    pub fn field(&self, name: &str) -> Option<String> {
        match self.fields.get(name)? {
            Value::String(s) if !s.trim().is_empty() => Some(s.clone()),
            Value::Number(n) => Some(n.to_string()),
            Value::Bool(b) => Some(b.to_string()),
            _ => None,
        }
    }

    pub fn title(&self) -> String {
        self.field("title").unwrap_or_else(|| self.movie_id.clone())
    }

    pub fn year(&self) -> Option<String> {
        self.field("year").or_else(|| self.field("release_year"))
    }

    pub fn rating(&self) -> Option<String> {
        self.field("rating")
    }

    pub fn genre(&self) -> Option<String> {
        self.field("genre")
    }

    pub fn video_url(&self) -> Option<String> {
        self.field("video_url")
    }

    /// A field read as a number, 0 when missing or not numeric
    pub fn number(&self, name: &str) -> f64 {
        self.field(name)
            .and_then(|s| s.trim().parse::<f64>().ok())
            .filter(|n| n.is_finite())
            .unwrap_or(0.0)
    }

    /// Minutes from a runtime such as `"2h 15m"`, `"1h"` or `"95"`
    pub fn runtime_minutes(&self) -> u64 {
        self.field("runtime")
            .map(|r| parse_runtime_minutes(&r))
            .unwrap_or(0)
    }
}

/// `<h>h [<m>]m` anywhere in the text counts as hours and minutes;
/// otherwise the leading integer is taken as minutes.
pub fn parse_runtime_minutes(text: &str) -> u64 {
    let bytes = text.as_bytes();
    let digits_from = |start: usize| {
        bytes[start..]
            .iter()
            .take_while(|b| b.is_ascii_digit())
            .count()
    };

    let mut i = 0;
    while i < bytes.len() {
        if !bytes[i].is_ascii_digit() {
            i += 1;
            continue;
        }
        let run = digits_from(i);
        let end = i + run;
        if bytes.get(end) == Some(&b'h') {
            let hours: u64 = text[i..end].parse().unwrap_or(0);
            let mut j = end + 1;
            while bytes.get(j).is_some_and(|b| b.is_ascii_whitespace()) {
                j += 1;
            }
            let minutes: u64 = text[j..j + digits_from(j)].parse().unwrap_or(0);
            return hours.saturating_mul(60).saturating_add(minutes);
        }
        i = end;
    }

    let trimmed = text.trim_start();
    let lead = trimmed.bytes().take_while(|b| b.is_ascii_digit()).count();
    trimmed[..lead].parse().unwrap_or(0)
}

/// Catalog orderings offered when browsing
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, ValueEnum)]
pub enum SortOrder {
    /// Catalog order
    #[default]
    Featured,
    /// Latest release year first
    Newest,
    /// Earliest release year first
    Oldest,
    /// Highest rating first
    #[value(name = "top-rated")]
    TopRated,
    /// Title, A to Z
    #[value(name = "a-z")]
    Title,
}

// ============================================
// Watch State Types
// ============================================

/// A movie in watch history with its playback position
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HistoryEntry {
    /// Snapshot of the record at the time of the last save
    pub movie: MovieRecord,
    /// Percentage watched, 0..=100
    pub progress: f64,
    /// Milliseconds since epoch
    pub last_watched: i64,
    /// Seconds
    pub current_time: f64,
    /// Seconds, 0 when unknown
    pub duration: f64,
}

/// Resume information for a single movie
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Progress {
    pub progress: f64,
    pub current_time: f64,
}

// ============================================
// Config Types
// ============================================

/// Menu selector type
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum SelectorType {
    #[default]
    Fzf,
    Dialoguer,
}

/// User configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Base URL of the catalog; empty means the built-in sample catalog
    pub catalog_url: String,
    /// Max history entries (default: 10)
    pub history_capacity: usize,
    /// Minimum seconds between progress saves during playback (default: 5)
    pub save_interval_secs: u64,
    /// Progress at which a movie counts as finished and restarts from zero
    pub completed_percent: f64,
    /// Catalog rows shown per menu (default: 25)
    pub limit: usize,
    /// Editor command (default: "nvim")
    pub editor: String,
    /// Menu selector
    pub selector: SelectorType,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            catalog_url: String::new(),
            history_capacity: 10,
            save_interval_secs: 5,
            completed_percent: 95.0,
            limit: 25,
            editor: "nvim".into(),
            selector: SelectorType::default(),
        }
    }
}

// ============================================
// Selector Types
// ============================================

/// Item displayed in selector menu
#[derive(Debug, Clone)]
pub struct MenuItem<T> {
    /// Display text
    pub label: String,
    /// Underlying value
    pub value: T,
}

// ============================================
// State Machine Types
// ============================================

/// Application state
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AppState {
    /// Initial menu selection
    Init,
    /// Pick a recent search or enter a new one
    Search,
    /// Browse the catalog
    Browse,
    /// Saved movies
    MyList,
    /// Watch history, newest first
    ContinueWatching,
    /// Act on the selected movie
    Movie,
    /// Play selected movie
    Play,
    /// Exit application
    Exit,
}

/// What to do with a selected movie
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MovieAction {
    Play,
    ToggleList,
    RemoveFromHistory,
    Back,
}

/// Choices on the search menu
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SearchAction {
    New,
    Recent(String),
    ClearRecent,
    Back,
}
