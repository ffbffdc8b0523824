//! Selector factory

use crate::types::{MenuItem, SelectorType};
use super::fzf::FzfSelector;
use super::dialoguer_selector::DialoguerSelector;

/// Selector enum for interactive menus
pub enum Selector {
    Fzf(FzfSelector),
    Dialoguer(DialoguerSelector),
}

impl Selector {
    /// Select an item from the menu; `None` when cancelled
    pub fn select<T: Clone + Send + 'static>(
        &self,
        items: &[MenuItem<T>],
        prompt: &str,
    ) -> Option<T> {
        match self {
            Selector::Fzf(s) => s.select(items, prompt),
            Selector::Dialoguer(s) => s.select(items, prompt),
        }
    }
}

/// Create the configured selector, falling back to dialoguer without fzf
pub fn create_selector(selector_type: SelectorType) -> Selector {
    match selector_type {
        SelectorType::Fzf => {
            let fzf = FzfSelector::new();
            if fzf.is_available() {
                return Selector::Fzf(fzf);
            }
            tracing::debug!("fzf not found, using dialoguer");
            Selector::Dialoguer(DialoguerSelector::new())
        }
        SelectorType::Dialoguer => Selector::Dialoguer(DialoguerSelector::new()),
    }
}
