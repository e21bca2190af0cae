pub mod cleaner;
pub mod http_client;
pub mod parsers;

use crate::config::ScraperConfig;
use crate::models::CollegeRecord;
use anyhow::{Context, Result};
use async_trait::async_trait;
use chrono::Utc;
use tracing::{debug, info};

use self::http_client::HttpClient;
use self::parsers::parse_search_page;

// ── Source trait ──────────────────────────────────────────────────────────────

/// Swappable search-results source abstraction.
#[async_trait]
pub trait SearchSource: Send + Sync {
    /// Check the site's published crawl policy for the search URL.
    async fn crawl_permitted(&self) -> Result<bool>;

    /// Fetch and assemble records for pages 1..=pages.
    async fn fetch_records(&self, pages: u32) -> Result<Vec<CollegeRecord>>;
}

// ── Ranking-site scraper ──────────────────────────────────────────────────────

pub struct RankingSiteScraper {
    client: HttpClient,
    config: ScraperConfig,
    base_url: String,
}

impl RankingSiteScraper {
    pub fn new(config: &ScraperConfig) -> Result<Self> {
        // Validate the base URL up front so a config typo fails loudly.
        url::Url::parse(&config.base_url)
            .with_context(|| format!("Invalid base URL {}", config.base_url))?;

        Ok(Self {
            client: HttpClient::new(config)?,
            config: config.clone(),
            base_url: config.base_url.trim_end_matches('/').to_string(),
        })
    }

    /// URL for a search-results page (paginated via query parameter).
    fn search_url(&self, page: u32) -> String {
        if page <= 1 {
            format!("{}/", self.base_url)
        } else {
            format!("{}/?page={}", self.base_url, page)
        }
    }
}

#[async_trait]
impl SearchSource for RankingSiteScraper {
    async fn crawl_permitted(&self) -> Result<bool> {
        self.client.crawl_permitted(&self.search_url(1)).await
    }

    async fn fetch_records(&self, pages: u32) -> Result<Vec<CollegeRecord>> {
        let mut all_records = Vec::new();

        for page in 1..=pages {
            let url = self.search_url(page);
            info!("Fetching search page {} ({})", page, url);

            let html = self
                .client
                .get_text(&url)
                .await
                .with_context(|| format!("Failed to fetch search page {}", page))?;

            let raw = parse_search_page(
                &html,
                &self.config.title_selector,
                &self.config.fact_selector,
            )?;

            if raw.titles.is_empty() {
                debug!("Empty page {} — stopping pagination", page);
                break;
            }

            let records =
                cleaner::assemble_records(&raw, self.config.facts_per_result, Utc::now().naive_utc())
                    .with_context(|| format!("Record assembly failed on page {}", page))?;

            info!("  Page {}: {} records", page, records.len());
            all_records.extend(records);
        }

        info!("Total institutions scraped: {}", all_records.len());
        Ok(all_records)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::AppConfig;

    #[test]
    fn search_url_paginates_via_query_parameter() {
        let config = AppConfig::default().scraper;
        let scraper = RankingSiteScraper::new(&config).unwrap();

        assert!(scraper.search_url(1).ends_with("/best-colleges/"));
        assert!(scraper.search_url(3).ends_with("/best-colleges/?page=3"));
    }

    #[test]
    fn rejects_invalid_base_url() {
        let mut config = AppConfig::default().scraper;
        config.base_url = "not a url".to_string();
        assert!(RankingSiteScraper::new(&config).is_err());
    }
}
