//! Batch orchestration.
//!
//! A batch walks a resolved list of items strictly in order, records one
//! outcome per item, and never stops early: the aggregate result is decided
//! only after the full pass.

use crate::error::{Error, Result};

/// Receives user-facing progress and status lines.
///
/// The CLI renders these with colors and a progress bar; library callers
/// and tests can use [`SilentReporter`].
pub trait BatchReporter {
    /// A pass over `total` items starts.
    fn begin(&self, label: &str, total: usize);
    /// One item is done.
    fn advance(&self);
    fn info(&self, message: &str);
    fn success(&self, message: &str);
    fn warn(&self, message: &str);
    fn error(&self, message: &str);
    /// A line of a summary listing.
    fn item(&self, message: &str);
    /// The pass is over.
    fn finish(&self);
}

/// Discards everything.
#[derive(Debug, Default, Clone, Copy)]
pub struct SilentReporter;

impl BatchReporter for SilentReporter {
    fn begin(&self, _label: &str, _total: usize) {}
    fn advance(&self) {}
    fn info(&self, _message: &str) {}
    fn success(&self, _message: &str) {}
    fn warn(&self, _message: &str) {}
    fn error(&self, _message: &str) {}
    fn item(&self, _message: &str) {}
    fn finish(&self) {}
}

/// One processed item.
#[derive(Debug)]
pub struct BatchEntry<T> {
    /// Display identity (challenge name, or key when it never loaded)
    pub name: String,
    pub outcome: Result<T>,
}

/// Ordered outcomes of a batch.
#[derive(Debug)]
pub struct BatchReport<T> {
    entries: Vec<BatchEntry<T>>,
}

impl<T> Default for BatchReport<T> {
    fn default() -> Self {
        Self {
            entries: Vec::new(),
        }
    }
}

impl<T> BatchReport<T> {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, name: impl Into<String>, outcome: Result<T>) {
        self.entries.push(BatchEntry {
            name: name.into(),
            outcome,
        });
    }

    pub fn entries(&self) -> &[BatchEntry<T>] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn succeeded(&self) -> impl Iterator<Item = (&str, &T)> {
        self.entries.iter().filter_map(|entry| match &entry.outcome {
            Ok(value) => Some((entry.name.as_str(), value)),
            Err(_) => None,
        })
    }

    pub fn failed(&self) -> impl Iterator<Item = (&str, &Error)> {
        self.entries.iter().filter_map(|entry| match &entry.outcome {
            Ok(_) => None,
            Err(err) => Some((entry.name.as_str(), err)),
        })
    }

    pub fn failed_names(&self) -> Vec<&str> {
        self.failed().map(|(name, _)| name).collect()
    }

    pub fn is_success(&self) -> bool {
        self.failed().next().is_none()
    }

    /// 0 when every item succeeded, 1 otherwise.
    pub fn exit_code(&self) -> i32 {
        if self.is_success() { 0 } else { 1 }
    }
}

/// Runs one pass and prints its banner.
pub struct Batch<'r> {
    label: String,
    reporter: &'r dyn BatchReporter,
    quiet: bool,
}

impl<'r> Batch<'r> {
    pub fn new(label: impl Into<String>, reporter: &'r dyn BatchReporter) -> Self {
        Self {
            label: label.into(),
            reporter,
            quiet: false,
        }
    }

    /// Suppress the progress indicator and the summary banner.
    pub fn quiet(mut self, quiet: bool) -> Self {
        self.quiet = quiet;
        self
    }

    pub fn reporter(&self) -> &'r dyn BatchReporter {
        self.reporter
    }

    /// Process every item in order, appending to `report`.
    ///
    /// An item error is shown at the point of failure and recorded; the pass
    /// continues with the next item.
    pub fn run<I, T, N, F>(&self, items: &mut [I], report: &mut BatchReport<T>, name: N, mut op: F)
    where
        N: Fn(&I) -> String,
        F: FnMut(&mut I) -> Result<T>,
    {
        let show_progress = !self.quiet && items.len() > 1;
        if show_progress {
            self.reporter.begin(&self.label, items.len());
        }

        for item in items.iter_mut() {
            let outcome = op(item);
            if let Err(err) = &outcome {
                self.reporter.error(&err.to_string());
            }
            report.push(name(item), outcome);
            if show_progress {
                self.reporter.advance();
            }
        }

        if show_progress {
            self.reporter.finish();
        }
    }

    /// `Success! All challenges <done>!` or `<Action> failed for:` and the list.
    pub fn announce<T>(&self, report: &BatchReport<T>, action: &str, done: &str) {
        if self.quiet {
            return;
        }
        if report.is_success() {
            self.reporter
                .success(&format!("Success! All challenges {}!", done));
            return;
        }
        self.reporter.error(&format!("{} failed for:", action));
        for name in report.failed_names() {
            self.reporter.item(&format!(" - {}", name));
        }
    }
}
