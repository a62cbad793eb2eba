//! Reconciliation of scraped listings against fixtures.
//!
//! Names match loosely (either contains the other, case and surrounding
//! whitespace ignored). Prices match exactly as rendered. A check passes when
//! at least one fixture product matches.

use crate::catalog::{Category, ListingEntry};
use crate::currency::PriceField;
use crate::fixture::FixtureRecord;
use crate::result::{StoreError, StoreResult};
use serde::Serialize;
use tracing::{info, warn};

/// Whether two product names refer to the same product.
///
/// Symmetric. An empty name only matches another empty name.
#[must_use]
pub fn names_match(a: &str, b: &str) -> bool {
    let a = a.trim().to_lowercase();
    let b = b.trim().to_lowercase();
    if a.is_empty() || b.is_empty() {
        return a == b;
    }
    a == b || a.contains(&b) || b.contains(&a)
}

/// Fail with `NoProductsExtracted` when a scrape came back empty
///
/// # Errors
///
/// Returns `NoProductsExtracted` if `extracted` is zero
pub fn ensure_extracted(category: Category, extracted: usize) -> StoreResult<()> {
    if extracted == 0 {
        return Err(StoreError::NoProductsExtracted {
            category: category.to_string(),
        });
    }
    Ok(())
}

/// Outcome of comparing scraped names with fixture names
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct NameReport {
    /// Number of fixture records
    pub expected_total: usize,
    /// Fixture names found on the site
    pub found: Vec<String>,
    /// Fixture names not found
    pub missing: Vec<String>,
}

impl NameReport {
    /// Number of fixture names found
    #[must_use]
    pub fn match_count(&self) -> usize {
        self.found.len()
    }

    /// Fail unless at least one name was found
    ///
    /// # Errors
    ///
    /// Returns `AssertionFailed` when nothing matched
    pub fn ensure_any_match(&self) -> StoreResult<()> {
        if self.found.is_empty() {
            return Err(StoreError::assertion(format!(
                "none of the {} expected product names were found",
                self.expected_total
            )));
        }
        Ok(())
    }
}

/// Check every fixture name against the scraped names
#[must_use]
pub fn reconcile_names(actual: &[String], fixtures: &[FixtureRecord]) -> NameReport {
    let mut report = NameReport {
        expected_total: fixtures.len(),
        ..NameReport::default()
    };
    for record in fixtures {
        if actual.iter().any(|name| names_match(name, &record.name)) {
            info!(product = %record.name, "Found product");
            report.found.push(record.name.clone());
        } else {
            warn!(product = %record.name, "Product not found");
            report.missing.push(record.name.clone());
        }
    }
    info!(
        found = report.found.len(),
        expected = report.expected_total,
        "Name check done"
    );
    report
}

/// A fixture product whose scraped price differs from the recorded one
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PriceMismatch {
    /// Fixture name
    pub name: String,
    /// Recorded price
    pub expected: String,
    /// Scraped price
    pub actual: String,
}

/// Outcome of comparing scraped prices with fixture prices in one currency
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PriceReport {
    /// Currency code
    pub currency: String,
    /// Fixture field compared
    pub field: PriceField,
    /// Fixture names whose price matched exactly
    pub matches: Vec<String>,
    /// Price differences
    pub mismatches: Vec<PriceMismatch>,
    /// Fixture names with no scraped counterpart
    pub not_found: Vec<String>,
    /// Fixture names with no recorded price in this currency
    pub no_expected: Vec<String>,
}

impl PriceReport {
    /// Number of exact price matches
    #[must_use]
    pub fn match_count(&self) -> usize {
        self.matches.len()
    }

    /// Whether every fixture product matched
    #[must_use]
    pub fn is_complete(&self) -> bool {
        self.mismatches.is_empty() && self.not_found.is_empty() && self.no_expected.is_empty()
    }

    /// Number of fixture products compared or looked up
    #[must_use]
    pub fn total(&self) -> usize {
        self.matches.len() + self.mismatches.len() + self.not_found.len() + self.no_expected.len()
    }

    /// Fail unless at least one price matched
    ///
    /// # Errors
    ///
    /// Returns `AssertionFailed` when nothing matched
    pub fn ensure_any_match(&self) -> StoreResult<()> {
        if self.matches.is_empty() {
            return Err(StoreError::assertion(format!(
                "no {} prices matched ({} mismatched, {} not found)",
                self.currency,
                self.mismatches.len(),
                self.not_found.len()
            )));
        }
        Ok(())
    }
}

/// Compare scraped prices with the `field` prices of the fixtures.
///
/// Each fixture is compared with the first scraped entry whose name matches.
#[must_use]
pub fn reconcile_prices(
    actual: &[ListingEntry],
    fixtures: &[FixtureRecord],
    currency: &str,
    field: PriceField,
) -> PriceReport {
    let mut report = PriceReport {
        currency: currency.to_string(),
        field,
        matches: Vec::new(),
        mismatches: Vec::new(),
        not_found: Vec::new(),
        no_expected: Vec::new(),
    };
    for record in fixtures {
        let expected = record.price.get(field);
        if expected.trim().is_empty() {
            warn!(product = %record.name, %currency, "No expected price recorded");
            report.no_expected.push(record.name.clone());
            continue;
        }
        match actual.iter().find(|entry| names_match(&entry.name, &record.name)) {
            None => {
                warn!(product = %record.name, %currency, "Product not on the listing");
                report.not_found.push(record.name.clone());
            }
            Some(entry) if entry.price == expected => {
                info!(product = %record.name, price = %entry.price, "Price matches");
                report.matches.push(record.name.clone());
            }
            Some(entry) => {
                warn!(
                    product = %record.name,
                    expected = %expected,
                    actual = %entry.price,
                    "Price mismatch"
                );
                report.mismatches.push(PriceMismatch {
                    name: record.name.clone(),
                    expected: expected.to_string(),
                    actual: entry.price.clone(),
                });
            }
        }
    }
    info!(
        %currency,
        matched = report.matches.len(),
        mismatched = report.mismatches.len(),
        not_found = report.not_found.len(),
        no_expected = report.no_expected.len(),
        "Price check done"
    );
    report
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn fixture(name: &str, dollar: &str) -> FixtureRecord {
        FixtureRecord::new(name).with_price(PriceField::Dollar, dollar)
    }

    mod names_match_tests {
        use super::*;

        #[test]
        fn test_case_and_whitespace_ignored() {
            assert!(names_match("  MacBook Air ", "macbook air"));
        }

        #[test]
        fn test_substring_either_way() {
            assert!(names_match("Apple Cinema 30\"", "Apple Cinema"));
            assert!(names_match("Apple Cinema", "Apple Cinema 30\""));
            assert!(!names_match("iPhone", "iPod Classic"));
        }

        #[test]
        fn test_empty_only_matches_empty() {
            assert!(names_match("", "  "));
            assert!(!names_match("", "iMac"));
            assert!(!names_match("iMac", " "));
        }

        proptest! {
            #[test]
            fn prop_symmetric(a in "[ a-zA-Z0-9]{0,12}", b in "[ a-zA-Z0-9]{0,12}") {
                prop_assert_eq!(names_match(&a, &b), names_match(&b, &a));
            }

            #[test]
            fn prop_reflexive(a in "[a-zA-Z0-9 ]{0,12}") {
                prop_assert!(names_match(&a, &a));
            }
        }
    }

    mod name_report_tests {
        use super::*;

        #[test]
        fn test_found_and_missing() {
            let actual = vec!["MacBook".to_string(), "Sony VAIO".to_string()];
            let fixtures = vec![
                fixture("MacBook", "$602.00"),
                fixture("HP LP3065", "$122.00"),
                fixture("sony vaio", "$1,202.00"),
            ];
            let report = reconcile_names(&actual, &fixtures);
            assert_eq!(report.expected_total, 3);
            assert_eq!(report.found, vec!["MacBook", "sony vaio"]);
            assert_eq!(report.missing, vec!["HP LP3065"]);
            assert!(report.ensure_any_match().is_ok());
        }

        #[test]
        fn test_no_match_fails() {
            let report = reconcile_names(&["Nokia".to_string()], &[fixture("iMac", "$122.00")]);
            assert_eq!(report.match_count(), 0);
            assert!(matches!(
                report.ensure_any_match(),
                Err(StoreError::AssertionFailed { .. })
            ));
        }
    }

    mod price_report_tests {
        use super::*;

        #[test]
        fn test_hp_lp3065_match() {
            let fixtures = vec![fixture("HP LP3065", "$122.00")];
            let actual = vec![ListingEntry::new("HP LP3065", "$122.00")];
            let report = reconcile_prices(&actual, &fixtures, "USD", PriceField::Dollar);
            assert_eq!(report.matches, vec!["HP LP3065"]);
            assert!(report.is_complete());
        }

        #[test]
        fn test_hp_lp3065_mismatch_passes_with_other_match() {
            let fixtures = vec![fixture("HP LP3065", "$122.00"), fixture("iPhone", "$123.20")];
            let actual = vec![
                ListingEntry::new("HP LP3065", "$100.00"),
                ListingEntry::new("iPhone", "$123.20"),
            ];
            let report = reconcile_prices(&actual, &fixtures, "USD", PriceField::Dollar);
            assert_eq!(
                report.mismatches,
                vec![PriceMismatch {
                    name: "HP LP3065".to_string(),
                    expected: "$122.00".to_string(),
                    actual: "$100.00".to_string(),
                }]
            );
            assert_eq!(report.match_count(), 1);
            assert!(report.ensure_any_match().is_ok());
            assert!(!report.is_complete());
        }

        #[test]
        fn test_exact_string_comparison() {
            let fixtures = vec![
                fixture("iMac", "$122.00"),
                FixtureRecord::new("Canon EOS 5D").with_price(PriceField::Euro, "80,00€"),
            ];
            let actual = vec![
                ListingEntry::new("iMac", "$122.00 "),
                ListingEntry::new("Canon EOS 5D", "80.00€"),
            ];
            let usd = reconcile_prices(&actual, &fixtures, "USD", PriceField::Dollar);
            assert_eq!(usd.mismatches.len(), 1);
            let eur = reconcile_prices(&actual, &fixtures, "EUR", PriceField::Euro);
            assert_eq!(eur.match_count(), 0);
            assert_eq!(eur.mismatches.len(), 1);
            assert!(eur.ensure_any_match().unwrap_err().to_string().contains("EUR"));
        }

        #[test]
        fn test_empty_fixture_price_is_skipped() {
            let fixtures = vec![
                fixture("iPhone", "$123.20"),
                FixtureRecord::new("Canon EOS 5D").with_price(PriceField::Euro, "76.89€"),
                fixture("MacBook", "  "),
            ];
            let actual = vec![
                ListingEntry::new("iPhone", "$123.20"),
                ListingEntry::new("Canon EOS 5D", "$98.00"),
                ListingEntry::new("MacBook", "$602.00"),
            ];
            let report = reconcile_prices(&actual, &fixtures, "USD", PriceField::Dollar);
            assert_eq!(report.matches, vec!["iPhone"]);
            assert!(report.mismatches.is_empty());
            assert!(report.not_found.is_empty());
            assert_eq!(report.no_expected, vec!["Canon EOS 5D", "MacBook"]);
            assert_eq!(report.total(), 3);
            assert!(report.ensure_any_match().is_ok());
            assert!(!report.is_complete());
        }

        #[test]
        fn test_first_matching_entry_is_used() {
            let fixtures = vec![fixture("iPod", "$100.00")];
            let actual = vec![
                ListingEntry::new("iPod Classic", "$100.00"),
                ListingEntry::new("iPod", "$200.00"),
            ];
            let report = reconcile_prices(&actual, &fixtures, "USD", PriceField::Dollar);
            assert_eq!(report.matches, vec!["iPod"]);
        }

        #[test]
        fn test_not_found() {
            let report = reconcile_prices(&[], &[fixture("iMac", "$1")], "USD", PriceField::Dollar);
            assert_eq!(report.not_found, vec!["iMac"]);
            assert!(report.ensure_any_match().is_err());
        }
    }

    #[test]
    fn test_ensure_extracted() {
        assert!(ensure_extracted(Category::Laptop, 3).is_ok());
        let err = ensure_extracted(Category::Laptop, 0).unwrap_err();
        assert!(matches!(err, StoreError::NoProductsExtracted { .. }));
    }
}
