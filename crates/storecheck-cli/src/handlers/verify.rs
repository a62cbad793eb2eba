//! Verify command handler
//!
//! Each check (listing, names, prices per currency) becomes one entry of a
//! [`RunReport`], written as JSON and JUnit under the artifact directory.

use crate::commands::VerifyArgs;
use crate::error::CliResult;
use crate::output::ProgressReporter;
use std::time::Instant;
use storecheck::{PriceOutcome, RunReport, ScenarioResult, SessionManager, StoreResult};

struct Checks<'a> {
    session: &'a SessionManager,
    reporter: &'a ProgressReporter,
    report: RunReport,
}

impl Checks<'_> {
    async fn record(&mut self, name: &str, started: Instant, outcome: StoreResult<String>) -> bool {
        let feature = self.report.suite_name.clone();
        match outcome {
            Ok(message) => {
                self.reporter.success(&format!("{name}: {message}"));
                self.report
                    .record(ScenarioResult::passed(feature, name, started.elapsed()));
                true
            }
            Err(e) => {
                self.reporter.failure(&format!("{name}: {e}"));
                let mut result = ScenarioResult::failed(feature, name, started.elapsed(), e.to_string());
                if let Some(shot) = self.session.finish_scenario(true).await {
                    result = result.with_attachment(shot);
                }
                self.report.record(result);
                false
            }
        }
    }
}

/// Run the listing, name and price checks of one category
pub async fn execute_verify(
    session: &SessionManager,
    args: &VerifyArgs,
    reporter: &ProgressReporter,
) -> CliResult<RunReport> {
    let category = args.category;
    let ctx = session.context().await?;
    let mut checks = Checks {
        session,
        reporter,
        report: RunReport::new(format!("verify {category}")),
    };

    let started = Instant::now();
    let listing = async {
        ctx.open_category(category).await?;
        let count = ctx.verify_category_page(category).await?;
        Ok(format!("{count} products on the first page"))
    }
    .await;
    if !checks.record("listing", started, listing).await {
        write_reports(session, &checks.report)?;
        return Ok(checks.report);
    }

    if !args.skip_names {
        let started = Instant::now();
        let names = ctx.validate_names(category).await.map(|report| {
            if !report.missing.is_empty() {
                reporter.warning(&format!("missing names: {}", report.missing.join(", ")));
            }
            format!("{}/{} fixture names found", report.match_count(), report.expected_total)
        });
        checks.record("names", started, names).await;
    }

    for code in &args.currencies {
        let started = Instant::now();
        let prices = async {
            ctx.change_currency(code).await?;
            ctx.validate_prices(category, code).await
        }
        .await
        .map(|outcome| match outcome {
            PriceOutcome::Verified(report) => {
                for mismatch in &report.mismatches {
                    reporter.warning(&format!(
                        "{}: expected {} got {}",
                        mismatch.name, mismatch.expected, mismatch.actual
                    ));
                }
                let total = report.total();
                format!("{}/{total} prices match", report.match_count())
            }
            PriceOutcome::Recorded { path, records } => format!(
                "no fixture, recorded {} products to {}",
                records.len(),
                path.display()
            ),
        });
        checks.record(&format!("prices {code}"), started, prices).await;
    }

    write_reports(session, &checks.report)?;
    Ok(checks.report)
}

fn write_reports(session: &SessionManager, report: &RunReport) -> CliResult<()> {
    let dir = &session.config().artifact_dir;
    report.write_json(&dir.join("storecheck-report.json"))?;
    report.write_junit(&dir.join("junit.xml"))?;
    Ok(())
}
