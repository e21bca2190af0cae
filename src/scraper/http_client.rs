use crate::config::ScraperConfig;
use anyhow::{Context, Result, bail};
use robotstxt::DefaultMatcher;
use std::time::Duration;
use tracing::{debug, warn};
use url::Url;

pub struct HttpClient {
    inner: reqwest::Client,
    user_agent: String,
}

impl HttpClient {
    pub fn new(config: &ScraperConfig) -> Result<Self> {
        let inner = reqwest::Client::builder()
            .user_agent(&config.user_agent)
            .timeout(Duration::from_secs(config.timeout_secs))
            .gzip(true)
            // Accept cookies so session-based pages work
            .cookie_store(true)
            .build()
            .context("Failed to build HTTP client")?;

        Ok(Self {
            inner,
            user_agent: config.user_agent.clone(),
        })
    }

    /// Fetch a URL as text. One attempt; any failure propagates.
    pub async fn get_text(&self, url: &str) -> Result<String> {
        debug!("GET {}", url);

        let resp = self
            .inner
            .get(url)
            .send()
            .await
            .with_context(|| format!("Request failed for {}", url))?;

        let status = resp.status();
        if !status.is_success() {
            bail!("HTTP {} for {}", status, url);
        }

        resp.text().await.context("Failed to read response body")
    }

    /// Evaluate `url` against the host's published crawl policy.
    ///
    /// A missing or unfetchable robots.txt counts as permitted; an explicit
    /// disallow for our user agent does not.
    pub async fn crawl_permitted(&self, url: &str) -> Result<bool> {
        let parsed = Url::parse(url).with_context(|| format!("Invalid URL {}", url))?;
        let host = parsed
            .host_str()
            .with_context(|| format!("URL has no host: {}", url))?;

        let robots_url = format!("{}://{}/robots.txt", parsed.scheme(), host);
        debug!("Checking crawl policy at {}", robots_url);

        let robots_txt = match self.inner.get(&robots_url).send().await {
            Ok(resp) if resp.status().is_success() => resp.text().await.unwrap_or_default(),
            Ok(resp) => {
                debug!("robots.txt returned HTTP {} — treating as permitted", resp.status());
                String::new()
            }
            Err(e) => {
                warn!("robots.txt fetch failed ({}) — treating as permitted", e);
                String::new()
            }
        };

        let mut matcher = DefaultMatcher::default();
        Ok(matcher.one_agent_allowed_by_robots(&robots_txt, &self.user_agent, url))
    }
}
