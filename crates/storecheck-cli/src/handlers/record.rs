//! Record command handler

use crate::error::CliResult;
use std::path::PathBuf;
use storecheck::{Category, FixtureRecord, SessionManager};

/// Open the listing and record its fixture in every currency, replacing any
/// existing file
pub async fn execute_record(
    session: &SessionManager,
    category: Category,
) -> CliResult<(PathBuf, Vec<FixtureRecord>)> {
    let ctx = session.context().await?;
    ctx.open_category(category).await?;
    Ok(ctx.record_fixture(category).await?)
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;
    use crate::handlers::test_support::{session, shop};
    use storecheck::{FixtureStore, PriceField};
    use tempfile::TempDir;

    #[tokio::test]
    async fn test_record_overwrites_fixture() {
        let dir = TempDir::new().unwrap();
        let store = FixtureStore::new(dir.path().join("test-data"));
        store
            .save(Category::Laptop, &[FixtureRecord::new("Stale")])
            .unwrap();

        let (_, session) = session(shop(), dir.path());
        let (path, records) = execute_record(&session, Category::Laptop).await.unwrap();

        assert_eq!(path, store.path_for(Category::Laptop));
        let names: Vec<&str> = records.iter().map(|r| r.name.as_str()).collect();
        assert_eq!(names, vec!["HP LP3065", "MacBook", "Sony VAIO"]);
        assert_eq!(records[2].price.get(PriceField::Euro), "943.09€");
        assert_eq!(store.require(Category::Laptop).unwrap(), records);
    }
}
