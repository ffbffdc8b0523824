//! mflix library
//!
//! Favorites and resumable watch history for a movie catalog, plus the
//! pieces the `mflix` CLI is built from.

pub mod core;
pub mod error;
pub mod library;
pub mod logging;
pub mod storage;
pub mod types;
pub mod ui;
pub mod utils;
