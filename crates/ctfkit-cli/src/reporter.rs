//! Terminal rendering of batch progress and status lines.

use std::cell::RefCell;

use console::style;
use indicatif::{ProgressBar, ProgressStyle};

use ctfkit_core::batch::BatchReporter;

/// Colored status lines and a progress bar for multi-challenge batches.
///
/// While a bar is active, lines are printed above it.
#[derive(Default)]
pub struct ConsoleReporter {
    bar: RefCell<Option<ProgressBar>>,
}

impl ConsoleReporter {
    pub fn new() -> Self {
        Self::default()
    }

    fn line(&self, message: String) {
        match self.bar.borrow().as_ref() {
            Some(bar) => bar.println(message),
            None => println!("{}", message),
        }
    }
}

impl BatchReporter for ConsoleReporter {
    fn begin(&self, label: &str, total: usize) {
        let bar = ProgressBar::new(total as u64);
        if let Ok(progress_style) = ProgressStyle::default_bar()
            .template("{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} {msg}")
        {
            bar.set_style(progress_style.progress_chars("#>-"));
        }
        bar.set_message(label.to_string());
        *self.bar.borrow_mut() = Some(bar);
    }

    fn advance(&self) {
        if let Some(bar) = self.bar.borrow().as_ref() {
            bar.inc(1);
        }
    }

    fn info(&self, message: &str) {
        self.line(style(message).blue().to_string());
    }

    fn success(&self, message: &str) {
        self.line(style(message).green().to_string());
    }

    fn warn(&self, message: &str) {
        self.line(style(message).yellow().to_string());
    }

    fn error(&self, message: &str) {
        self.line(style(message).red().to_string());
    }

    fn item(&self, message: &str) {
        self.line(message.to_string());
    }

    fn finish(&self) {
        if let Some(bar) = self.bar.borrow_mut().take() {
            bar.finish_and_clear();
        }
    }
}
