//! Storage modules: config, key/value backends, favorites, history, searches

pub mod backend;
pub mod config;
pub mod document;
pub mod favorites;
pub mod history;
pub mod searches;
