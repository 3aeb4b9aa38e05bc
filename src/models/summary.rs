use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::{ArticleData, CommentResult, StoredComment, Tone};

/// Three-line summary produced by the model.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct SummaryResult {
    pub lines: Vec<String>,
    pub full_text: String,
}

impl SummaryResult {
    pub fn from_lines(lines: Vec<String>) -> Self {
        let full_text = lines.join(" ");
        Self { lines, full_text }
    }
}

/// Everything needed to persist one successful generation.
#[derive(Debug, Clone)]
pub struct NewSummary {
    pub url: String,
    pub title: String,
    pub description: Option<String>,
    pub content: String,
    pub author: Option<String>,
    pub published_at: Option<String>,
    pub summary_lines: Vec<String>,
    pub summary_text: String,
    pub comments: Vec<CommentResult>,
    pub tokens_used: u64,
    pub processing_time: u64,
}

impl NewSummary {
    pub fn new(
        article: &ArticleData,
        summary: &SummaryResult,
        comments: &[CommentResult],
        tokens_used: u64,
        processing_time: u64,
    ) -> Self {
        Self {
            url: article.url.clone(),
            title: article.title.clone(),
            description: article.description.clone(),
            content: article.content.clone(),
            author: article.author.clone(),
            published_at: article.published_at.clone(),
            summary_lines: summary.lines.clone(),
            summary_text: summary.full_text.clone(),
            comments: comments.to_vec(),
            tokens_used,
            processing_time,
        }
    }
}

#[derive(Debug, Clone, Serialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct PersistedSummary {
    pub id: String,
    pub url: String,
    pub title: String,
    pub description: Option<String>,
    pub content: String,
    pub author: Option<String>,
    pub published_at: Option<String>,
    pub summary_lines: Vec<String>,
    pub summary_text: String,
    pub tokens_used: u64,
    pub processing_time: u64,
    pub created_at: DateTime<Utc>,
    pub comments: Vec<StoredComment>,
}

#[derive(Debug, Clone, Copy, Serialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct Pagination {
    pub total: u64,
    pub limit: u32,
    pub offset: u32,
    pub has_more: bool,
}

impl Pagination {
    pub fn new(total: u64, limit: u32, offset: u32) -> Self {
        Self {
            total,
            limit,
            offset,
            has_more: u64::from(offset) + u64::from(limit) < total,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct SummaryPage {
    pub items: Vec<PersistedSummary>,
    pub pagination: Pagination,
}

// Request / response payloads for the summarize endpoint

#[derive(Debug, Clone, Default, Deserialize)]
pub struct SummarizeRequest {
    #[serde(default)]
    pub url: String,
    #[serde(default)]
    pub options: Option<SummarizeOptions>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct SummarizeOptions {
    pub tone: Option<Tone>,
}

/// Article fields echoed back to the caller.
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct ArticleInfo {
    pub url: String,
    pub title: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub published_at: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub author: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub og_image: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub favicon: Option<String>,
}

impl From<ArticleData> for ArticleInfo {
    fn from(article: ArticleData) -> Self {
        Self {
            url: article.url,
            title: article.title,
            description: article.description,
            published_at: article.published_at,
            author: article.author,
            og_image: article.og_image,
            favicon: article.favicon,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ResponseMetadata {
    pub generated_at: DateTime<Utc>,
    pub tokens_used: u64,
    pub processing_time: u64,
}

#[derive(Debug, Clone, Serialize)]
pub struct SummarizeResponse {
    pub article: ArticleInfo,
    pub summary: SummaryResult,
    pub comments: Vec<CommentResult>,
    pub metadata: ResponseMetadata,
}
