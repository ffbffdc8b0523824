//! fzf selector implementation

use crate::types::MenuItem;
use std::io::Write;
use std::process::{Command, Stdio};

/// Fuzzy menu through an external `fzf` process
pub struct FzfSelector;

impl FzfSelector {
    pub fn new() -> Self {
        Self
    }

    pub fn select<T: Clone + Send + 'static>(
        &self,
        items: &[MenuItem<T>],
        prompt: &str,
    ) -> Option<T> {
        if items.is_empty() {
            return None;
        }

        let mut child = Command::new("fzf")
            .args([
                "--prompt", &format!("{} > ", prompt),
                "--height", "50%",
                "--reverse",
                "--ansi",
                // Rows arrive newest-first; keep that order until the user types
                "--no-sort",
                "--delimiter", "\t",
                "--with-nth", "2..",
            ])
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::inherit())
            .spawn()
            .ok()?;

        if let Some(mut stdin) = child.stdin.take() {
            stdin.write_all(menu_input(items).as_bytes()).ok()?;
        }

        let output = child.wait_with_output().ok()?;
        if !output.status.success() {
            return None; // Esc / Ctrl-C
        }

        let index = parse_selection(&String::from_utf8_lossy(&output.stdout))?;
        items.get(index).map(|item| item.value.clone())
    }

    pub fn is_available(&self) -> bool {
        Command::new("which")
            .arg("fzf")
            .output()
            .map(|o| o.status.success())
            .unwrap_or(false)
    }
}

/// One `index<TAB>label` line per item; only the label is shown
fn menu_input<T>(items: &[MenuItem<T>]) -> String {
    items
        .iter()
        .enumerate()
        .map(|(i, item)| format!("{}\t{}", i, item.label.replace(['\t', '\n'], " ")))
        .collect::<Vec<_>>()
        .join("\n")
}

fn parse_selection(stdout: &str) -> Option<usize> {
    stdout.trim().split('\t').next()?.parse().ok()
}
