//! Storefront catalog vocabulary: categories and scraped listing entries.

use crate::result::StoreError;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::fmt;
use std::str::FromStr;

/// Product category with its own listing page
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Category {
    /// Desktops
    Desktop,
    /// Laptops & Notebooks
    Laptop,
    /// Phones & PDAs
    Phone,
}

impl Category {
    /// Every category, in menu order
    pub const ALL: [Self; 3] = [Self::Desktop, Self::Laptop, Self::Phone];

    /// Lowercase identifier used in file names and step text
    #[must_use]
    pub const fn slug(self) -> &'static str {
        match self {
            Self::Desktop => "desktop",
            Self::Laptop => "laptop",
            Self::Phone => "phone",
        }
    }

    /// Heading shown on the listing page, also the top-menu label
    #[must_use]
    pub const fn heading(self) -> &'static str {
        match self {
            Self::Desktop => "Desktops",
            Self::Laptop => "Laptops & Notebooks",
            Self::Phone => "Phones & PDAs",
        }
    }

    /// Label of the "Show All" link in the dropdown, if the menu has one
    #[must_use]
    pub const fn show_all_label(self) -> Option<&'static str> {
        match self {
            Self::Desktop => Some("Show All Desktops"),
            Self::Laptop => Some("Show All Laptops & Notebooks"),
            Self::Phone => None,
        }
    }

    /// Fixture file name, e.g. `desktopList.json`
    #[must_use]
    pub fn fixture_file_name(self) -> String {
        format!("{}List.json", self.slug())
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.slug())
    }
}

impl FromStr for Category {
    type Err = StoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "desktop" | "desktops" => Ok(Self::Desktop),
            "laptop" | "laptops" | "notebook" | "notebooks" => Ok(Self::Laptop),
            "phone" | "phones" | "pda" | "pdas" => Ok(Self::Phone),
            _ => Err(StoreError::UnknownCategory {
                name: s.to_string(),
            }),
        }
    }
}

/// One product card as scraped from a listing page
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ListingEntry {
    /// Product name, trimmed
    pub name: String,
    /// Displayed (current) price, exactly as rendered after trimming
    pub price: String,
    /// Struck-through price when the product is on sale
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub original_price: Option<String>,
}

impl ListingEntry {
    /// Create an entry with a regular price
    #[must_use]
    pub fn new(name: impl Into<String>, price: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            price: price.into(),
            original_price: None,
        }
    }

    /// Attach the pre-sale price
    #[must_use]
    pub fn with_original_price(mut self, original: impl Into<String>) -> Self {
        self.original_price = Some(original.into());
        self
    }

    /// Whether the card showed a sale price
    #[must_use]
    pub const fn is_on_sale(&self) -> bool {
        self.original_price.is_some()
    }
}

/// Drop repeated names, keeping first occurrences in order.
///
/// Names compare by exact string after trimming; empty names are dropped.
#[must_use]
pub fn dedup_names<I, S>(names: I) -> Vec<String>
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    let mut seen = HashSet::new();
    names
        .into_iter()
        .filter_map(|name| {
            let trimmed = name.as_ref().trim();
            if trimmed.is_empty() || !seen.insert(trimmed.to_string()) {
                None
            } else {
                Some(trimmed.to_string())
            }
        })
        .collect()
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;

    mod category_tests {
        use super::*;

        #[test]
        fn test_parse_step_words() {
            assert_eq!("desktop".parse::<Category>().unwrap(), Category::Desktop);
            assert_eq!("Laptops".parse::<Category>().unwrap(), Category::Laptop);
            assert_eq!(" phones ".parse::<Category>().unwrap(), Category::Phone);
        }

        #[test]
        fn test_parse_unknown() {
            let err = "tablets".parse::<Category>().unwrap_err();
            assert!(matches!(err, StoreError::UnknownCategory { .. }));
        }

        #[test]
        fn test_fixture_file_name() {
            assert_eq!(Category::Desktop.fixture_file_name(), "desktopList.json");
            assert_eq!(Category::Phone.fixture_file_name(), "phoneList.json");
        }

        #[test]
        fn test_phone_menu_has_no_show_all() {
            assert!(Category::Phone.show_all_label().is_none());
            assert_eq!(
                Category::Laptop.show_all_label(),
                Some("Show All Laptops & Notebooks")
            );
        }

        #[test]
        fn test_serde_lowercase() {
            let json = serde_json::to_string(&Category::Laptop).unwrap();
            assert_eq!(json, "\"laptop\"");
        }
    }

    mod listing_entry_tests {
        use super::*;

        #[test]
        fn test_regular_entry_omits_original_price() {
            let entry = ListingEntry::new("iMac", "$122.00");
            let json = serde_json::to_string(&entry).unwrap();
            assert_eq!(json, r#"{"name":"iMac","price":"$122.00"}"#);
            assert!(!entry.is_on_sale());
        }

        #[test]
        fn test_sale_entry_uses_camel_case() {
            let entry = ListingEntry::new("Apple Cinema 30\"", "$110.00")
                .with_original_price("$122.00");
            let json = serde_json::to_value(&entry).unwrap();
            assert_eq!(json["originalPrice"], "$122.00");
            assert!(entry.is_on_sale());
        }
    }

    mod dedup_tests {
        use super::*;

        #[test]
        fn test_keeps_first_occurrence_order() {
            let names = dedup_names(["iMac", "MacBook", " iMac ", "iPhone", "MacBook"]);
            assert_eq!(names, vec!["iMac", "MacBook", "iPhone"]);
        }

        #[test]
        fn test_drops_blank_names() {
            let names = dedup_names(["", "  ", "HTC Touch HD"]);
            assert_eq!(names, vec!["HTC Touch HD"]);
        }

        #[test]
        fn test_case_sensitive() {
            let names = dedup_names(["iPod", "IPOD"]);
            assert_eq!(names.len(), 2);
        }
    }
}
