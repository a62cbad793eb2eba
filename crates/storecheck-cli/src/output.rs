//! Output formatting and progress reporting

use console::{style, Style, Term};
use indicatif::{ProgressBar, ProgressStyle};
use std::time::Duration;
use storecheck::{FixtureRecord, ListingEntry, PriceField};

/// Progress reporter for storefront runs
#[derive(Debug)]
pub struct ProgressReporter {
    term: Term,
    spinner: Option<ProgressBar>,
    /// Whether to use colors
    pub use_color: bool,
    /// Quiet mode
    pub quiet: bool,
}

impl Default for ProgressReporter {
    fn default() -> Self {
        Self::new(true, false)
    }
}

impl ProgressReporter {
    /// Create a new progress reporter
    #[must_use]
    pub fn new(use_color: bool, quiet: bool) -> Self {
        Self {
            term: Term::stderr(),
            spinner: None,
            use_color,
            quiet,
        }
    }

    /// Show a spinner while a browser step runs
    pub fn start_spinner(&mut self, message: &str) {
        if self.quiet {
            return;
        }

        let pb = ProgressBar::new_spinner();
        pb.set_style(
            ProgressStyle::default_spinner()
                .template("{spinner:.green} {msg} [{elapsed}]")
                .unwrap_or_else(|_| ProgressStyle::default_spinner()),
        );
        pb.enable_steady_tick(Duration::from_millis(120));
        pb.set_message(message.to_string());
        self.spinner = Some(pb);
    }

    /// Update spinner message
    pub fn set_message(&self, message: &str) {
        if let Some(ref pb) = self.spinner {
            pb.set_message(message.to_string());
        }
    }

    /// Remove the spinner
    pub fn finish(&mut self) {
        if let Some(pb) = self.spinner.take() {
            pb.finish_and_clear();
        }
    }

    fn line(&self, prefix: String, message: &str) {
        match self.spinner {
            Some(ref pb) => pb.println(format!("{prefix} {message}")),
            None => {
                let _ = self.term.write_line(&format!("{prefix} {message}"));
            }
        }
    }

    /// Print a success message
    pub fn success(&self, message: &str) {
        if self.quiet {
            return;
        }
        let prefix = if self.use_color {
            style("✓").green().bold().to_string()
        } else {
            "PASS".to_string()
        };
        self.line(prefix, message);
    }

    /// Print a failure message
    pub fn failure(&self, message: &str) {
        // Failures print even in quiet mode
        let prefix = if self.use_color {
            style("✗").red().bold().to_string()
        } else {
            "FAIL".to_string()
        };
        self.line(prefix, message);
    }

    /// Print a warning message
    pub fn warning(&self, message: &str) {
        if self.quiet {
            return;
        }
        let prefix = if self.use_color {
            style("⚠").yellow().bold().to_string()
        } else {
            "WARN".to_string()
        };
        self.line(prefix, message);
    }

    /// Print an info message
    pub fn info(&self, message: &str) {
        if self.quiet {
            return;
        }
        let prefix = if self.use_color {
            style("ℹ").blue().bold().to_string()
        } else {
            "INFO".to_string()
        };
        self.line(prefix, message);
    }

    /// Print a run summary
    pub fn summary(&self, passed: usize, failed: usize, duration: Duration) {
        if self.quiet && failed == 0 {
            return;
        }

        let total = passed + failed;
        let secs = duration.as_secs_f64();
        let _ = self.term.write_line("");

        if self.use_color {
            let status = if failed > 0 {
                Style::new().red().bold().apply_to("FAILED")
            } else {
                Style::new().green().bold().apply_to("PASSED")
            };
            let _ = self.term.write_line(&format!(
                "{status} {total} checks in {secs:.2}s ({passed} passed, {failed} failed)"
            ));
        } else {
            let status = if failed > 0 { "FAILED" } else { "PASSED" };
            let _ = self.term.write_line(&format!(
                "{status} {total} checks in {secs:.2}s ({passed} passed, {failed} failed)"
            ));
        }
    }
}

/// One line per listing entry: name, price, and the original price when on sale
#[must_use]
pub fn render_entries(entries: &[ListingEntry]) -> String {
    let width = entries.iter().map(|e| e.name.chars().count()).max().unwrap_or(0);
    let mut out = String::new();
    for entry in entries {
        out.push_str(&format!("{:<width$}  {}", entry.name, entry.price));
        if let Some(ref original) = entry.original_price {
            out.push_str(&format!("  (was {original})"));
        }
        out.push('\n');
    }
    out
}

/// Summary line for one fixture file: record count and missing prices
#[must_use]
pub fn render_fixture_summary(label: &str, records: &[FixtureRecord]) -> String {
    let missing: Vec<String> = [PriceField::Dollar, PriceField::Euro, PriceField::Pound]
        .into_iter()
        .filter_map(|field| {
            let count = records
                .iter()
                .filter(|r| r.price.get(field).trim().is_empty())
                .count();
            (count > 0).then(|| format!("{count} without {field}"))
        })
        .collect();
    if missing.is_empty() {
        format!("{label}: {} records, all prices present", records.len())
    } else {
        format!("{label}: {} records, {}", records.len(), missing.join(", "))
    }
}
