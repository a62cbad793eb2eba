//! Fixtures command handler

use crate::error::CliResult;
use crate::output::render_fixture_summary;
use storecheck::{Category, FixtureStore};

/// One summary line per fixture file; needs no browser
pub fn execute_fixtures(store: &FixtureStore, category: Option<Category>) -> CliResult<Vec<String>> {
    let categories = category.map_or_else(|| Category::ALL.to_vec(), |c| vec![c]);
    let mut lines = Vec::with_capacity(categories.len());
    for category in categories {
        let label = category.fixture_file_name();
        match store.load(category)? {
            Some(records) => lines.push(render_fixture_summary(&label, &records)),
            None => lines.push(format!("{label}: missing, recorded on the first price check")),
        }
    }
    Ok(lines)
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;
    use storecheck::{FixtureRecord, PriceField};
    use tempfile::TempDir;

    #[test]
    fn test_summarizes_every_category() {
        let dir = TempDir::new().unwrap();
        let store = FixtureStore::new(dir.path());
        store
            .save(
                Category::Desktop,
                &[FixtureRecord::new("iPhone").with_price(PriceField::Dollar, "$123.20")],
            )
            .unwrap();

        let lines = execute_fixtures(&store, None).unwrap();
        assert_eq!(lines.len(), 3);
        assert_eq!(
            lines[0],
            "desktopList.json: 1 records, 1 without Euro, 1 without Pound"
        );
        assert!(lines[1].starts_with("laptopList.json: missing"));
        assert!(lines[2].starts_with("phoneList.json: missing"));
    }

    #[test]
    fn test_single_category() {
        let dir = TempDir::new().unwrap();
        let lines = execute_fixtures(&FixtureStore::new(dir.path()), Some(Category::Phone)).unwrap();
        assert_eq!(lines.len(), 1);
    }

    #[test]
    fn test_malformed_fixture_is_an_error() {
        let dir = TempDir::new().unwrap();
        std::fs::write(dir.path().join("laptopList.json"), "{ not json").unwrap();
        let err = execute_fixtures(&FixtureStore::new(dir.path()), Some(Category::Laptop)).unwrap_err();
        assert!(err.to_string().contains("malformed"));
    }
}
