use std::sync::Arc;
use std::time::{Duration, Instant};

use chrono::Utc;

use crate::ai::{estimate_tokens, ClaudeClient, Summarizer};
use crate::config::Config;
use crate::db::Repository;
use crate::error::Result;
use crate::models::{
    DailyAggregate, NewSummary, PersistedSummary, ResponseMetadata, SummarizeRequest,
    SummarizeResponse, SummaryPage,
};
use crate::services::{validate_url, ContentFetcher};

/// Request orchestrator: fetch, summarize, comment, persist.
pub struct App {
    fetcher: ContentFetcher,
    summarizer: Summarizer,
    repository: Repository,
}

impl App {
    pub async fn new(config: &Config) -> Result<Self> {
        let repository = Repository::new(&config.db_path).await?;
        let fetcher = ContentFetcher::new(Duration::from_secs(config.fetch_timeout_secs))?;
        let model = ClaudeClient::new(
            config.claude_api_key.clone(),
            config.model.clone(),
            Duration::from_secs(config.llm_timeout_secs),
        )?;
        let summarizer = Summarizer::new(Arc::new(model), config.content_excerpt_chars);

        if config.claude_api_key.is_none() {
            tracing::warn!("No Claude API key configured; requests must supply x-api-key");
        }

        Ok(Self::from_parts(fetcher, summarizer, repository))
    }

    pub fn from_parts(fetcher: ContentFetcher, summarizer: Summarizer, repository: Repository) -> Self {
        Self {
            fetcher,
            summarizer,
            repository,
        }
    }

    #[cfg(test)]
    pub fn repository(&self) -> &Repository {
        &self.repository
    }

    pub fn model_version(&self) -> &str {
        self.summarizer.model_version()
    }

    /// Run the full pipeline for one URL.
    ///
    /// Every stage depends on the previous one; the first failure ends the
    /// request. Only the analytics side-write inside the save is allowed to
    /// fail silently.
    pub async fn summarize(
        &self,
        request: SummarizeRequest,
        api_key: Option<&str>,
    ) -> Result<SummarizeResponse> {
        let started = Instant::now();

        // Checked before any network work; the article keeps the URL as submitted.
        validate_url(&request.url)?;
        let url = request.url.trim();
        let tone = request.options.and_then(|o| o.tone).unwrap_or_default();

        let article = self.fetcher.fetch_article(url).await?;
        tracing::info!("Fetched '{}' from {}", article.title, article.url);

        let summary = self
            .summarizer
            .generate_summary(&article.title, &article.content, api_key)
            .await?;

        let comments = self
            .summarizer
            .generate_comments(&article.title, &summary.full_text, tone, api_key)
            .await?;

        let tokens_used = estimate_tokens(&format!("{}{}", article.content, summary.full_text));
        let processing_time = started.elapsed().as_millis() as u64;

        let saved = self
            .repository
            .save_summary(NewSummary::new(
                &article,
                &summary,
                &comments,
                tokens_used,
                processing_time,
            ))
            .await?;
        tracing::info!(
            "Saved summary {} ({} tokens, {} ms, model {})",
            saved.id,
            tokens_used,
            processing_time,
            self.model_version()
        );

        Ok(SummarizeResponse {
            article: article.into(),
            summary,
            comments,
            metadata: ResponseMetadata {
                generated_at: Utc::now(),
                tokens_used,
                processing_time,
            },
        })
    }

    pub async fn history(&self, limit: u32, offset: u32) -> Result<SummaryPage> {
        self.repository.get_summaries(limit, offset).await
    }

    pub async fn history_item(&self, id: &str) -> Result<PersistedSummary> {
        self.repository.get_summary_by_id(id).await
    }

    pub async fn delete_history_item(&self, id: &str) -> Result<()> {
        self.repository.delete_summary(id).await?;
        tracing::info!("Deleted summary {}", id);
        Ok(())
    }

    pub async fn analytics(&self, days: u32) -> Result<Vec<DailyAggregate>> {
        self.repository.recent_analytics(days).await
    }
}
