//! Interactive menus

pub mod dialoguer_selector;
pub mod fzf;
pub mod selector;
