//! Catalog access, playback and progress reporting

pub mod catalog;
pub mod player;
pub mod progress;
