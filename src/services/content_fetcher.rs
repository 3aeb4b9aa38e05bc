use std::time::Duration;

use reqwest::header::{HeaderMap, HeaderValue, ACCEPT, USER_AGENT};
use reqwest::Client;
use url::Url;

use crate::error::{AppError, Result};
use crate::models::ArticleData;

use super::extractor::extract_article;

const USER_AGENT_STRING: &str = concat!(
    "Mozilla/5.0 (compatible; article-digest/",
    env!("CARGO_PKG_VERSION"),
    ")"
);

pub struct ContentFetcher {
    client: Client,
}

impl ContentFetcher {
    pub fn new(timeout: Duration) -> Result<Self> {
        let client = Client::builder()
            .timeout(timeout)
            .connect_timeout(Duration::from_secs(10))
            .redirect(reqwest::redirect::Policy::limited(10))
            .build()?;
        Ok(Self { client })
    }

    /// Download a page and extract its article.
    ///
    /// The scheme is checked before any request is made.
    pub async fn fetch_article(&self, article_url: &str) -> Result<ArticleData> {
        let url = validate_url(article_url)?;

        let mut headers = HeaderMap::new();
        headers.insert(USER_AGENT, HeaderValue::from_static(USER_AGENT_STRING));
        headers.insert(
            ACCEPT,
            HeaderValue::from_static("text/html,application/xhtml+xml;q=0.9,*/*;q=0.8"),
        );

        tracing::debug!("Fetching article {}", url);
        let response = self
            .client
            .get(url.as_str())
            .headers(headers)
            .send()
            .await
            .map_err(|e| AppError::Fetch(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            tracing::debug!("Failed to fetch {}: {}", url, status);
            return Err(AppError::Fetch(format!("HTTP {} for {}", status, url)));
        }

        let html = response
            .text()
            .await
            .map_err(|e| AppError::Fetch(e.to_string()))?;

        // The parsed DOM is not Send, so extraction stays synchronous.
        let article = extract_article(&html, article_url)?;
        tracing::debug!(
            "Extracted '{}' ({} chars) from {}",
            article.title,
            article.content.chars().count(),
            url
        );
        Ok(article)
    }
}

/// Parse `input` and require an http or https scheme.
pub fn validate_url(input: &str) -> Result<Url> {
    let trimmed = input.trim();
    if trimmed.is_empty() {
        return Err(AppError::InvalidUrl("URL is empty".to_string()));
    }
    let url = Url::parse(trimmed).map_err(|e| AppError::InvalidUrl(format!("{}: {}", trimmed, e)))?;
    match url.scheme() {
        "http" | "https" => Ok(url),
        other => Err(AppError::InvalidUrl(format!(
            "unsupported scheme '{}', only http and https are allowed",
            other
        ))),
    }
}
