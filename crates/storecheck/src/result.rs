//! Result and error types for storecheck.

use thiserror::Error;

/// Result type for storecheck operations
pub type StoreResult<T> = Result<T, StoreError>;

/// Errors that can occur while driving the storefront
#[derive(Debug, Error)]
pub enum StoreError {
    /// Browser launch error
    #[error("Failed to launch browser: {message}")]
    BrowserLaunchError {
        /// Error message
        message: String,
    },

    /// Requested engine cannot be driven over CDP
    #[error("Browser engine '{engine}' is not supported by the CDP driver")]
    UnsupportedEngine {
        /// Engine name as configured
        engine: String,
    },

    /// Run configuration could not be resolved
    #[error("Configuration error: {message}")]
    Config {
        /// Error message
        message: String,
    },

    /// Page error
    #[error("Page error: {message}")]
    PageError {
        /// Error message
        message: String,
    },

    /// Navigation error
    #[error("Navigation to {url} failed: {message}")]
    NavigationError {
        /// URL that failed
        url: String,
        /// Error message
        message: String,
    },

    /// Operation timed out
    #[error("Operation timed out after {ms}ms")]
    Timeout {
        /// Timeout in milliseconds
        ms: u64,
    },

    /// No element matched a selector that had to match
    #[error("Element not found: {selector}")]
    ElementNotFound {
        /// Human-readable selector
        selector: String,
    },

    /// In-page script failed
    #[error("Script evaluation failed: {message}")]
    ScriptError {
        /// Error message
        message: String,
    },

    /// Screenshot error
    #[error("Screenshot failed: {message}")]
    ScreenshotError {
        /// Error message
        message: String,
    },

    /// The currency picker has no option for the code
    #[error("Currency option {code} not found. Available: {}", available.join(", "))]
    CurrencyNotFound {
        /// Requested currency code
        code: String,
        /// Text of every option the picker offered
        available: Vec<String>,
    },

    /// Currency code has no fixture mapping
    #[error("Unsupported currency: {code}")]
    UnsupportedCurrency {
        /// Requested currency code
        code: String,
    },

    /// Category name could not be parsed
    #[error("Unknown category: {name}")]
    UnknownCategory {
        /// Name as given
        name: String,
    },

    /// Assertion failed
    #[error("Assertion failed: {message}")]
    AssertionFailed {
        /// Error message
        message: String,
    },

    /// Extraction returned nothing where products were expected
    #[error("No products extracted from the {category} listing")]
    NoProductsExtracted {
        /// Category slug
        category: String,
    },

    /// Fixture error (missing, unreadable or malformed)
    #[error("Fixture error: {message}")]
    FixtureError {
        /// Error message
        message: String,
    },

    /// Invalid state error (operation called in wrong state)
    #[error("Invalid state: {message}")]
    InvalidState {
        /// Error message
        message: String,
    },

    /// I/O error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl StoreError {
    /// Create a page error
    #[must_use]
    pub fn page(message: impl Into<String>) -> Self {
        Self::PageError {
            message: message.into(),
        }
    }

    /// Create a script error
    #[must_use]
    pub fn script(message: impl Into<String>) -> Self {
        Self::ScriptError {
            message: message.into(),
        }
    }

    /// Create an assertion failure
    #[must_use]
    pub fn assertion(message: impl Into<String>) -> Self {
        Self::AssertionFailed {
            message: message.into(),
        }
    }

    /// Create a timeout error from a duration
    #[must_use]
    pub fn timeout(after: std::time::Duration) -> Self {
        Self::Timeout {
            ms: after.as_millis() as u64,
        }
    }

    /// Whether this error is a wait that ran out of time
    #[must_use]
    pub const fn is_timeout(&self) -> bool {
        matches!(self, Self::Timeout { .. })
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[test]
    fn test_currency_not_found_lists_options() {
        let err = StoreError::CurrencyNotFound {
            code: "JPY".to_string(),
            available: vec!["€ Euro".to_string(), "$ US Dollar".to_string()],
        };
        assert_eq!(
            err.to_string(),
            "Currency option JPY not found. Available: € Euro, $ US Dollar"
        );
    }

    #[test]
    fn test_timeout_from_duration() {
        let err = StoreError::timeout(Duration::from_secs(10));
        assert!(err.is_timeout());
        assert_eq!(err.to_string(), "Operation timed out after 10000ms");
    }

    #[test]
    fn test_helper_constructors() {
        assert!(StoreError::page("detached")
            .to_string()
            .contains("Page error: detached"));
        assert!(StoreError::assertion("no match")
            .to_string()
            .starts_with("Assertion failed"));
        assert!(!StoreError::script("boom").is_timeout());
    }

    #[test]
    fn test_io_conversion() {
        let io = std::io::Error::new(std::io::ErrorKind::NotFound, "gone");
        let err: StoreError = io.into();
        assert!(err.to_string().contains("I/O error"));
    }

    #[test]
    fn test_no_products_message() {
        let err = StoreError::NoProductsExtracted {
            category: "phone".to_string(),
        };
        assert_eq!(
            err.to_string(),
            "No products extracted from the phone listing"
        );
    }
}
