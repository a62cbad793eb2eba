//! Currency lookup table.
//!
//! Each row ties a currency code to the picker option that selects it and to
//! the fixture field holding its expected prices. Supporting another currency
//! means adding a row.

use crate::locator::Selector;
use crate::result::{StoreError, StoreResult};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Option selector used for codes without a row; `{code}` is substituted
pub const FALLBACK_OPTION_PATTERN: &str = r#"button.currency-select[name="{code}"]"#;

/// Price field of a fixture record
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum PriceField {
    /// GBP prices
    Pound,
    /// USD prices
    Dollar,
    /// EUR prices
    Euro,
}

impl PriceField {
    /// Field name as written in fixture files
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Pound => "Pound",
            Self::Dollar => "Dollar",
            Self::Euro => "Euro",
        }
    }
}

impl fmt::Display for PriceField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One supported currency
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CurrencyRow {
    /// ISO code, uppercase
    pub code: String,
    /// CSS selector of the picker option
    pub option_css: String,
    /// Fixture field with this currency's prices
    pub field: PriceField,
}

impl CurrencyRow {
    /// Row using the standard picker markup for `code`
    #[must_use]
    pub fn standard(code: &str, field: PriceField) -> Self {
        let code = code.to_ascii_uppercase();
        Self {
            option_css: FALLBACK_OPTION_PATTERN.replace("{code}", &code),
            code,
            field,
        }
    }
}

/// Currency code → {option selector, fixture field}
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CurrencyTable {
    rows: Vec<CurrencyRow>,
}

impl Default for CurrencyTable {
    fn default() -> Self {
        Self::opencart()
    }
}

impl CurrencyTable {
    /// Table with no rows
    #[must_use]
    pub const fn empty() -> Self {
        Self { rows: Vec::new() }
    }

    /// USD, EUR and GBP as offered by a stock OpenCart install
    #[must_use]
    pub fn opencart() -> Self {
        Self::empty()
            .with_row(CurrencyRow::standard("USD", PriceField::Dollar))
            .with_row(CurrencyRow::standard("EUR", PriceField::Euro))
            .with_row(CurrencyRow::standard("GBP", PriceField::Pound))
    }

    /// Add a row, replacing any row with the same code
    #[must_use]
    pub fn with_row(mut self, row: CurrencyRow) -> Self {
        self.rows.retain(|r| !r.code.eq_ignore_ascii_case(&row.code));
        self.rows.push(row);
        self
    }

    /// Row for `code`, case-insensitive
    #[must_use]
    pub fn find(&self, code: &str) -> Option<&CurrencyRow> {
        let code = code.trim();
        self.rows.iter().find(|r| r.code.eq_ignore_ascii_case(code))
    }

    /// Rows in table order
    #[must_use]
    pub fn rows(&self) -> &[CurrencyRow] {
        &self.rows
    }

    /// Codes in table order
    pub fn codes(&self) -> impl Iterator<Item = &str> {
        self.rows.iter().map(|r| r.code.as_str())
    }

    /// Number of rows
    #[must_use]
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    /// Whether the table has no rows
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Picker option for `code`; unknown codes use [`FALLBACK_OPTION_PATTERN`]
    ///
    /// # Errors
    ///
    /// Returns `UnsupportedCurrency` if the code is not three ASCII letters
    pub fn option_selector(&self, code: &str) -> StoreResult<Selector> {
        if let Some(row) = self.find(code) {
            return Ok(Selector::css(row.option_css.clone()));
        }
        let code = validate_code(code)?;
        Ok(Selector::css(FALLBACK_OPTION_PATTERN.replace("{code}", &code)))
    }

    /// Fixture field holding prices for `code`
    ///
    /// # Errors
    ///
    /// Returns `UnsupportedCurrency` if the table has no row for the code
    pub fn field_for(&self, code: &str) -> StoreResult<PriceField> {
        self.find(code)
            .map(|row| row.field)
            .ok_or_else(|| StoreError::UnsupportedCurrency {
                code: code.to_string(),
            })
    }
}

fn validate_code(code: &str) -> StoreResult<String> {
    let code = code.trim();
    if code.len() == 3 && code.chars().all(|c| c.is_ascii_alphabetic()) {
        Ok(code.to_ascii_uppercase())
    } else {
        Err(StoreError::UnsupportedCurrency {
            code: code.to_string(),
        })
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;

    #[test]
    fn test_opencart_rows() {
        let table = CurrencyTable::opencart();
        assert_eq!(table.codes().collect::<Vec<_>>(), vec!["USD", "EUR", "GBP"]);
        assert_eq!(table.field_for("USD").unwrap(), PriceField::Dollar);
        assert_eq!(table.field_for("eur").unwrap(), PriceField::Euro);
        assert_eq!(table.field_for("GBP").unwrap(), PriceField::Pound);
    }

    #[test]
    fn test_unknown_code_has_no_field() {
        let err = CurrencyTable::opencart().field_for("JPY").unwrap_err();
        assert!(matches!(err, StoreError::UnsupportedCurrency { code } if code == "JPY"));
    }

    #[test]
    fn test_unknown_code_uses_fallback_option() {
        let sel = CurrencyTable::opencart().option_selector("jpy").unwrap();
        assert_eq!(sel, Selector::css(r#"button.currency-select[name="JPY"]"#));
    }

    #[test]
    fn test_malformed_code_rejected() {
        let table = CurrencyTable::opencart();
        assert!(table.option_selector("US\"D").is_err());
        assert!(table.option_selector("EURO").is_err());
    }

    #[test]
    fn test_with_row_replaces_existing() {
        let table = CurrencyTable::opencart().with_row(CurrencyRow {
            code: "usd".to_string(),
            option_css: "#usd".to_string(),
            field: PriceField::Dollar,
        });
        assert_eq!(table.len(), 3);
        assert_eq!(table.option_selector("USD").unwrap(), Selector::css("#usd"));
    }

    #[test]
    fn test_price_field_names() {
        assert_eq!(PriceField::Pound.to_string(), "Pound");
        assert_eq!(serde_json::to_string(&PriceField::Euro).unwrap(), "\"Euro\"");
    }
}
