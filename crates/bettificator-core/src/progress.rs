//! Terminal progress for the two retrieval paths
//!
//! Bars are drawn only when stderr is a terminal. Otherwise every bar handed
//! out is hidden and log lines are the only sign of progress.

use std::io::IsTerminal;
use std::sync::Arc;
use std::time::Duration;

use indicatif::{MultiProgress, ProgressBar, ProgressStyle};

use crate::catalog::CatalogKey;

const DAY_TEMPLATE: &str =
    "{prefix:.cyan.bold} {bar:40.green/dim} {pos}/{len} days {msg} [{elapsed_precise}, eta {eta}]";
const CATALOG_TEMPLATE: &str = "{spinner:.green} {prefix:.cyan.bold} page {msg} ({pos}/{len})";

fn style(template: &str) -> ProgressStyle {
    ProgressStyle::with_template(template).expect("invalid template")
}

/// Owns the `MultiProgress` all bars of a run are drawn on
pub struct ProgressContext {
    multi: MultiProgress,
    is_tty: bool,
}

impl ProgressContext {
    /// Draw bars if stderr is a terminal
    pub fn new() -> Self {
        Self::with_tty(std::io::stderr().is_terminal())
    }

    /// Never draws; for tests and piped output
    pub fn hidden() -> Self {
        Self::with_tty(false)
    }

    fn with_tty(is_tty: bool) -> Self {
        Self {
            multi: MultiProgress::new(),
            is_tty,
        }
    }

    /// One tick per finished day. The dispatcher sets the length.
    pub fn day_bar(&self) -> ProgressBar {
        if !self.is_tty {
            return ProgressBar::hidden();
        }
        let bar = ProgressBar::new(0)
            .with_style(style(DAY_TEMPLATE).progress_chars("=>-"))
            .with_prefix("matches");
        self.multi.add(bar)
    }

    /// Spinner naming the catalog page being fetched, one tick per page
    pub fn catalog_line(&self) -> ProgressBar {
        if !self.is_tty {
            return ProgressBar::hidden();
        }
        let bar = ProgressBar::new(CatalogKey::COUNT as u64)
            .with_style(style(CATALOG_TEMPLATE))
            .with_prefix("clubs");
        let bar = self.multi.add(bar);
        bar.enable_steady_tick(Duration::from_millis(80));
        bar
    }

    pub fn is_tty(&self) -> bool {
        self.is_tty
    }

    /// Target for the log bridge in TTY mode
    pub fn multi(&self) -> &MultiProgress {
        &self.multi
    }
}

impl Default for ProgressContext {
    fn default() -> Self {
        Self::new()
    }
}

/// Shared between the CLI commands of one process
pub type SharedProgress = Arc<ProgressContext>;

/// `1234567` -> `1,234,567`
pub fn fmt_num(n: usize) -> String {
    let digits = n.to_string();
    let head = digits.len() % 3;
    let mut out = String::with_capacity(digits.len() + digits.len() / 3);
    for (i, c) in digits.char_indices() {
        if i > 0 && (i + 3 - head) % 3 == 0 {
            out.push(',');
        }
        out.push(c);
    }
    out
}
