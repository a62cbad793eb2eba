//! Structured run report.
//!
//! Collects one [`ScenarioResult`] per scenario and renders it as JSON for an
//! external report renderer and as JUnit XML for CI.

use crate::result::{StoreError, StoreResult};
use base64::Engine as _;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Scenario outcome
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ScenarioStatus {
    /// Every step passed
    Passed,
    /// A step failed
    Failed,
    /// Skipped or undefined steps
    Skipped,
}

impl ScenarioStatus {
    /// Check if status is passing
    #[must_use]
    pub const fn is_passed(&self) -> bool {
        matches!(self, Self::Passed)
    }

    /// Check if status is failing
    #[must_use]
    pub const fn is_failed(&self) -> bool {
        matches!(self, Self::Failed)
    }
}

/// Binary payload attached to a scenario
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Attachment {
    /// MIME type
    pub mime_type: String,
    /// Base64 payload
    pub data: String,
    /// Where the payload was also written, if anywhere
    #[serde(skip_serializing_if = "Option::is_none")]
    pub path: Option<PathBuf>,
}

impl Attachment {
    /// PNG attachment
    #[must_use]
    pub fn png(bytes: &[u8]) -> Self {
        Self {
            mime_type: "image/png".to_string(),
            data: base64::engine::general_purpose::STANDARD.encode(bytes),
            path: None,
        }
    }

    /// Record the file the payload was saved to
    #[must_use]
    pub fn with_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.path = Some(path.into());
        self
    }

    /// Decoded payload
    ///
    /// # Errors
    ///
    /// Returns error if the payload is not valid base64
    pub fn bytes(&self) -> StoreResult<Vec<u8>> {
        base64::engine::general_purpose::STANDARD
            .decode(&self.data)
            .map_err(|e| StoreError::page(format!("invalid attachment: {e}")))
    }
}

/// Result of one scenario
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ScenarioResult {
    /// Feature name
    pub feature: String,
    /// Scenario name
    pub name: String,
    /// Outcome
    pub status: ScenarioStatus,
    /// Wall time
    pub duration: Duration,
    /// First failure message
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    /// Screenshots and other payloads
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub attachments: Vec<Attachment>,
    /// When the scenario finished
    pub finished_at: DateTime<Utc>,
}

impl ScenarioResult {
    /// Create a passing result
    #[must_use]
    pub fn passed(feature: impl Into<String>, name: impl Into<String>, duration: Duration) -> Self {
        Self {
            feature: feature.into(),
            name: name.into(),
            status: ScenarioStatus::Passed,
            duration,
            error: None,
            attachments: Vec::new(),
            finished_at: Utc::now(),
        }
    }

    /// Create a failing result
    #[must_use]
    pub fn failed(
        feature: impl Into<String>,
        name: impl Into<String>,
        duration: Duration,
        error: impl Into<String>,
    ) -> Self {
        Self {
            status: ScenarioStatus::Failed,
            error: Some(error.into()),
            ..Self::passed(feature, name, duration)
        }
    }

    /// Create a skipped result
    #[must_use]
    pub fn skipped(feature: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            status: ScenarioStatus::Skipped,
            ..Self::passed(feature, name, Duration::ZERO)
        }
    }

    /// Attach a payload
    #[must_use]
    pub fn with_attachment(mut self, attachment: Attachment) -> Self {
        self.attachments.push(attachment);
        self
    }
}

/// Results of a whole run
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RunReport {
    /// Suite name
    pub suite_name: String,
    /// When the run started
    pub started_at: DateTime<Utc>,
    /// Scenario results in completion order
    pub results: Vec<ScenarioResult>,
}

impl RunReport {
    /// Create an empty report
    #[must_use]
    pub fn new(suite_name: impl Into<String>) -> Self {
        Self {
            suite_name: suite_name.into(),
            started_at: Utc::now(),
            results: Vec::new(),
        }
    }

    /// Add a scenario result
    pub fn record(&mut self, result: ScenarioResult) {
        self.results.push(result);
    }

    /// Get number of passed scenarios
    #[must_use]
    pub fn passed_count(&self) -> usize {
        self.results.iter().filter(|r| r.status.is_passed()).count()
    }

    /// Get number of failed scenarios
    #[must_use]
    pub fn failed_count(&self) -> usize {
        self.results.iter().filter(|r| r.status.is_failed()).count()
    }

    /// Get total scenario count
    #[must_use]
    pub fn total_count(&self) -> usize {
        self.results.len()
    }

    /// Get pass rate (0.0 to 1.0)
    #[must_use]
    pub fn pass_rate(&self) -> f64 {
        if self.results.is_empty() {
            return 1.0;
        }
        self.passed_count() as f64 / self.results.len() as f64
    }

    /// Check if no scenario failed
    #[must_use]
    pub fn all_passed(&self) -> bool {
        self.failed_count() == 0
    }

    /// Get total duration
    #[must_use]
    pub fn total_duration(&self) -> Duration {
        self.results.iter().map(|r| r.duration).sum()
    }

    /// Failing scenarios
    #[must_use]
    pub fn failures(&self) -> Vec<&ScenarioResult> {
        self.results.iter().filter(|r| r.status.is_failed()).collect()
    }

    /// Generate summary string
    #[must_use]
    pub fn summary(&self) -> String {
        format!(
            "{}: {}/{} passed ({:.1}%)",
            self.suite_name,
            self.passed_count(),
            self.total_count(),
            self.pass_rate() * 100.0
        )
    }

    /// Render the report as pretty JSON
    ///
    /// # Errors
    ///
    /// Returns error if serialization fails
    pub fn to_json(&self) -> StoreResult<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// Write the JSON report, creating parent directories
    ///
    /// # Errors
    ///
    /// Returns error if file writing fails
    pub fn write_json(&self, output_path: &Path) -> StoreResult<()> {
        write_creating_parent(output_path, &self.to_json()?)
    }

    /// Write JUnit XML for CI integration
    ///
    /// # Errors
    ///
    /// Returns error if file writing fails
    pub fn write_junit(&self, output_path: &Path) -> StoreResult<()> {
        write_creating_parent(output_path, &self.render_junit())
    }

    /// Render JUnit XML content
    #[must_use]
    pub fn render_junit(&self) -> String {
        let mut xml = String::new();

        xml.push_str(r#"<?xml version="1.0" encoding="UTF-8"?>"#);
        xml.push('\n');
        xml.push_str(&format!(
            r#"<testsuite name="{}" tests="{}" failures="{}" skipped="{}" time="{:.3}">"#,
            escape_xml(&self.suite_name),
            self.total_count(),
            self.failed_count(),
            self.results
                .iter()
                .filter(|r| r.status == ScenarioStatus::Skipped)
                .count(),
            self.total_duration().as_secs_f64()
        ));
        xml.push('\n');

        for result in &self.results {
            xml.push_str(&format!(
                r#"  <testcase classname="{}" name="{}" time="{:.3}">"#,
                escape_xml(&result.feature),
                escape_xml(&result.name),
                result.duration.as_secs_f64()
            ));
            xml.push('\n');

            match result.status {
                ScenarioStatus::Failed => {
                    let error = result.error.as_deref().unwrap_or("scenario failed");
                    xml.push_str(&format!(
                        r#"    <failure message="{}">{}</failure>"#,
                        escape_xml(error),
                        escape_xml(error)
                    ));
                    xml.push('\n');
                }
                ScenarioStatus::Skipped => xml.push_str("    <skipped/>\n"),
                ScenarioStatus::Passed => {}
            }

            for attachment in &result.attachments {
                if let Some(path) = &attachment.path {
                    xml.push_str(&format!(
                        "    <system-out>[[ATTACHMENT|{}]]</system-out>\n",
                        escape_xml(&path.display().to_string())
                    ));
                }
            }

            xml.push_str("  </testcase>\n");
        }

        xml.push_str("</testsuite>\n");
        xml
    }
}

fn write_creating_parent(path: &Path, contents: &str) -> StoreResult<()> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            std::fs::create_dir_all(parent)?;
        }
    }
    std::fs::write(path, contents)?;
    Ok(())
}

/// Escape XML special characters
fn escape_xml(s: &str) -> String {
    s.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
        .replace('\'', "&apos;")
}
