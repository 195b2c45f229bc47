use std::collections::HashMap;

use reqwest::{Client, header};

use crate::error::{Result, ScrapeError};

const USER_AGENT: &str = "Mozilla/5.0 (Windows NT 10.0; Win64; x64) \
     AppleWebKit/537.36 (KHTML, like Gecko) Chrome/143.0.0.0 Safari/537.36";

/// Source of raw HTML pages.
#[async_trait::async_trait]
pub trait PageFetcher: Send + Sync {
    async fn fetch_page(&self, url: &str) -> Result<String>;
}

#[async_trait::async_trait]
impl PageFetcher for Client {
    async fn fetch_page(&self, url: &str) -> Result<String> {
        let upstream = |e: reqwest::Error| ScrapeError::UpstreamFetch {
            url: url.to_string(),
            reason: e.to_string(),
        };
        let resp = self
            .get(url)
            .header(header::USER_AGENT, USER_AGENT)
            .send()
            .await
            .map_err(upstream)?
            .error_for_status()
            .map_err(upstream)?;
        resp.text().await.map_err(upstream)
    }
}

/// Movie descriptions keyed by detail-page URL, kept for the lifetime of a run.
pub trait DescriptionCache: Send {
    fn get(&self, url: &str) -> Option<String>;
    fn insert(&mut self, url: String, description: String);
}

impl DescriptionCache for HashMap<String, String> {
    fn get(&self, url: &str) -> Option<String> {
        HashMap::get(self, url).cloned()
    }

    fn insert(&mut self, url: String, description: String) {
        HashMap::insert(self, url, description);
    }
}
