//! dialoguer selector implementation (fallback)

use crate::types::MenuItem;
use dialoguer::{Select, theme::ColorfulTheme};

/// Rows visible at once before the menu scrolls
const PAGE_SIZE: usize = 15;

/// Arrow-key menu; works in any terminal
pub struct DialoguerSelector {
    theme: ColorfulTheme,
}

impl DialoguerSelector {
    pub fn new() -> Self {
        Self {
            theme: ColorfulTheme::default(),
        }
    }

    pub fn select<T: Clone + Send + 'static>(
        &self,
        items: &[MenuItem<T>],
        prompt: &str,
    ) -> Option<T> {
        if items.is_empty() {
            return None;
        }

        let labels: Vec<&str> = items.iter().map(|i| i.label.as_str()).collect();

        // Esc or a terminal error both count as "no selection"
        let index = Select::with_theme(&self.theme)
            .with_prompt(prompt)
            .items(&labels)
            .default(0)
            .max_length(PAGE_SIZE)
            .interact_opt()
            .ok()
            .flatten()?;

        items.get(index).map(|item| item.value.clone())
    }
}
