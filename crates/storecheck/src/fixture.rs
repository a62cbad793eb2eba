//! Expected-product fixtures.
//!
//! One JSON file per category, `<dir>/<slug>List.json`, holding an array of
//! `{ "name": ..., "price": { "Pound": ..., "Dollar": ..., "Euro": ... } }`.
//! Prices are compared as exact strings, so fixtures store them exactly as
//! the storefront renders them.

use crate::catalog::{Category, ListingEntry};
use crate::currency::PriceField;
use crate::result::{StoreError, StoreResult};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::{Path, PathBuf};

/// Expected price per currency
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct FixturePrices {
    /// GBP price
    #[serde(default)]
    pub pound: String,
    /// USD price
    #[serde(default)]
    pub dollar: String,
    /// EUR price
    #[serde(default)]
    pub euro: String,
}

impl FixturePrices {
    /// Price for `field`
    #[must_use]
    pub fn get(&self, field: PriceField) -> &str {
        match field {
            PriceField::Pound => &self.pound,
            PriceField::Dollar => &self.dollar,
            PriceField::Euro => &self.euro,
        }
    }

    /// Set the price for `field`
    pub fn set(&mut self, field: PriceField, value: impl Into<String>) {
        let value = value.into();
        match field {
            PriceField::Pound => self.pound = value,
            PriceField::Dollar => self.dollar = value,
            PriceField::Euro => self.euro = value,
        }
    }
}

/// Expected product
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FixtureRecord {
    /// Product name
    pub name: String,
    /// Prices per currency
    #[serde(default)]
    pub price: FixturePrices,
}

impl FixtureRecord {
    /// Record with no prices yet
    #[must_use]
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            price: FixturePrices::default(),
        }
    }

    /// Set one price, builder style
    #[must_use]
    pub fn with_price(mut self, field: PriceField, value: impl Into<String>) -> Self {
        self.price.set(field, value);
        self
    }
}

/// Fixture files of every category under one directory
#[derive(Debug, Clone)]
pub struct FixtureStore {
    dir: PathBuf,
}

impl FixtureStore {
    /// Store rooted at `dir`
    #[must_use]
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    /// Root directory
    #[must_use]
    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Path of the fixture for `category`
    #[must_use]
    pub fn path_for(&self, category: Category) -> PathBuf {
        self.dir.join(category.fixture_file_name())
    }

    /// Whether the fixture file exists
    #[must_use]
    pub fn exists(&self, category: Category) -> bool {
        self.path_for(category).is_file()
    }

    /// Load the fixture for `category`; `None` when the file is absent
    ///
    /// # Errors
    ///
    /// Returns `FixtureError` if the file exists but is unreadable or malformed
    pub fn load(&self, category: Category) -> StoreResult<Option<Vec<FixtureRecord>>> {
        let path = self.path_for(category);
        if !path.exists() {
            return Ok(None);
        }
        let raw = std::fs::read_to_string(&path).map_err(|e| StoreError::FixtureError {
            message: format!("cannot read {}: {e}", path.display()),
        })?;
        let records = serde_json::from_str(&raw).map_err(|e| StoreError::FixtureError {
            message: format!("malformed {}: {e}", path.display()),
        })?;
        Ok(Some(records))
    }

    /// Load the fixture, failing when it is absent or empty
    ///
    /// # Errors
    ///
    /// Returns `FixtureError` if there is nothing to compare against
    pub fn require(&self, category: Category) -> StoreResult<Vec<FixtureRecord>> {
        match self.load(category)? {
            Some(records) if !records.is_empty() => Ok(records),
            _ => Err(StoreError::FixtureError {
                message: format!(
                    "no {category} fixture at {}; record one first",
                    self.path_for(category).display()
                ),
            }),
        }
    }

    /// Write the fixture for `category` as pretty JSON
    ///
    /// # Errors
    ///
    /// Returns error if the directory or file cannot be written
    pub fn save(&self, category: Category, records: &[FixtureRecord]) -> StoreResult<PathBuf> {
        std::fs::create_dir_all(&self.dir)?;
        let path = self.path_for(category);
        let mut json = serde_json::to_string_pretty(records)?;
        json.push('\n');
        std::fs::write(&path, json)?;
        tracing::info!(path = %path.display(), records = records.len(), "Saved fixture");
        Ok(path)
    }
}

/// Builds fixture records from successive scrapes, one currency at a time.
///
/// Products are fixed by the seed scrape; later scrapes only fill in prices
/// of products already seen.
#[derive(Debug, Clone, Default)]
pub struct FixtureRecorder {
    records: Vec<FixtureRecord>,
    index: HashMap<String, usize>,
}

impl FixtureRecorder {
    /// Seed products from a scrape, keeping first occurrences
    #[must_use]
    pub fn seeded(entries: &[ListingEntry]) -> Self {
        let mut recorder = Self::default();
        for entry in entries {
            if !recorder.index.contains_key(&entry.name) {
                recorder
                    .index
                    .insert(entry.name.clone(), recorder.records.len());
                recorder.records.push(FixtureRecord::new(entry.name.clone()));
            }
        }
        recorder
    }

    /// Fill `field` from a scrape in that currency; returns how many
    /// products were updated
    pub fn record(&mut self, field: PriceField, entries: &[ListingEntry]) -> usize {
        let mut updated = 0;
        for entry in entries {
            if let Some(&slot) = self.index.get(&entry.name) {
                let record = &mut self.records[slot];
                if record.price.get(field).is_empty() {
                    record.price.set(field, entry.price.clone());
                    updated += 1;
                }
            }
        }
        updated
    }

    /// Number of products
    #[must_use]
    pub fn len(&self) -> usize {
        self.records.len()
    }

    /// Whether no products were seeded
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Records in seed order
    #[must_use]
    pub fn finish(self) -> Vec<FixtureRecord> {
        self.records
    }
}
