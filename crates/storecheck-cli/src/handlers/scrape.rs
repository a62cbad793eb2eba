//! Scrape command handler

use crate::commands::{ScrapeArgs, ScrapeFormat};
use crate::error::CliResult;
use crate::output::render_entries;
use storecheck::{ListingEntry, SessionManager};
use tracing::info;

/// Open the listing, optionally switch currency, and render what it shows
pub async fn execute_scrape(session: &SessionManager, args: &ScrapeArgs) -> CliResult<String> {
    let category = args.category;
    let ctx = session.context().await?;
    ctx.open_category(category).await?;
    let listing = ctx.pages().category(category);

    if let Some(ref code) = args.currency {
        ctx.change_currency(code).await?;
        listing.go_to_first_page().await;
    }

    if args.names {
        let names = if args.single_page {
            listing.product_names().await
        } else {
            ctx.extract_names(category).await
        };
        info!(%category, count = names.len(), "Scraped names");
        return match args.format {
            ScrapeFormat::Text => Ok(names.iter().map(|n| format!("{n}\n")).collect()),
            ScrapeFormat::Json => Ok(serde_json::to_string_pretty(&names)?),
        };
    }

    let entries: Vec<ListingEntry> = if args.single_page {
        listing.product_prices().await
    } else {
        ctx.extract_prices(category).await
    };
    info!(%category, count = entries.len(), "Scraped prices");
    match args.format {
        ScrapeFormat::Text => Ok(render_entries(&entries)),
        ScrapeFormat::Json => Ok(serde_json::to_string_pretty(&entries)?),
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;
    use crate::handlers::test_support::{session, shop};
    use storecheck::Category;
    use tempfile::TempDir;

    fn args(names: bool, single_page: bool, format: ScrapeFormat) -> ScrapeArgs {
        ScrapeArgs {
            category: Category::Laptop,
            currency: None,
            single_page,
            names,
            format,
        }
    }

    #[tokio::test]
    async fn test_scrape_all_pages_text() {
        let dir = TempDir::new().unwrap();
        let (_, session) = session(shop(), dir.path());
        let out = execute_scrape(&session, &args(false, false, ScrapeFormat::Text))
            .await
            .unwrap();
        assert_eq!(out.lines().count(), 3);
        assert!(out.contains("Sony VAIO"));
        assert!(out.contains("$1,202.00"));
    }

    #[tokio::test]
    async fn test_scrape_single_page_names() {
        let dir = TempDir::new().unwrap();
        let (_, session) = session(shop(), dir.path());
        let out = execute_scrape(&session, &args(true, true, ScrapeFormat::Text))
            .await
            .unwrap();
        assert_eq!(out, "HP LP3065\nMacBook\n");
    }

    #[tokio::test]
    async fn test_scrape_json_in_currency() {
        let dir = TempDir::new().unwrap();
        let (_, session) = session(shop(), dir.path());
        let mut scrape = args(false, false, ScrapeFormat::Json);
        scrape.currency = Some("GBP".to_string());
        let out = execute_scrape(&session, &scrape).await.unwrap();
        let entries: Vec<ListingEntry> = serde_json::from_str(&out).unwrap();
        assert_eq!(entries.len(), 3);
        assert_eq!(entries[0].price, "£74.73");
    }

    #[tokio::test]
    async fn test_scrape_unknown_currency_fails() {
        let dir = TempDir::new().unwrap();
        let (_, session) = session(shop(), dir.path());
        let mut scrape = args(false, false, ScrapeFormat::Text);
        scrape.currency = Some("JPY".to_string());
        let err = execute_scrape(&session, &scrape).await.unwrap_err();
        assert!(err.to_string().contains("JPY"));
    }
}
