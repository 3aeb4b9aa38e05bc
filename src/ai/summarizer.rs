use std::sync::Arc;

use serde::de::DeserializeOwned;
use serde::Deserialize;

use crate::error::{AppError, Result};
use crate::models::{CommentResult, SummaryResult, Tone};

use super::client::{CompletionRequest, LanguageModel};

/// Article text beyond this many characters is not sent to the model.
pub const DEFAULT_EXCERPT_CHARS: usize = 4000;

const SUMMARY_LINES: usize = 3;
const COMMENT_COUNT: usize = 3;

pub(crate) const SUMMARY_SYSTEM_PROMPT: &str = r#"You are a helpful assistant that summarizes news articles.
Summarize the article in exactly three lines.
Each line is one complete sentence of at most 120 characters and covers a different key point.
Write in the same language as the article.
Respond with JSON only, no commentary, in exactly this shape:
{"lines": ["first line", "second line", "third line"]}"#;

pub(crate) const COMMENT_SYSTEM_PROMPT: &str = r#"You write short social media posts reacting to an article.
Write exactly three distinct comments about the article in the requested tone:
- casual: friendly and conversational, may use an exclamation mark
- formal: polished and professional
- neutral: balanced and matter-of-fact
Each comment is at most 140 characters, shares a personal takeaway, and contains no hashtags.
Write in the same language as the summary.
Respond with JSON only, no commentary, in exactly this shape:
{"comments": [{"text": "first"}, {"text": "second"}, {"text": "third"}]}"#;

#[derive(Debug, Deserialize)]
struct SummaryReply {
    lines: Vec<String>,
}

#[derive(Debug, Deserialize)]
struct CommentsReply {
    comments: Vec<CommentReply>,
}

#[derive(Debug, Deserialize)]
struct CommentReply {
    text: String,
}

pub struct Summarizer {
    model: Arc<dyn LanguageModel>,
    excerpt_chars: usize,
}

impl Summarizer {
    pub fn new(model: Arc<dyn LanguageModel>, excerpt_chars: usize) -> Self {
        Self {
            model,
            excerpt_chars,
        }
    }

    pub async fn generate_summary(
        &self,
        article_title: &str,
        article_content: &str,
        api_key: Option<&str>,
    ) -> Result<SummaryResult> {
        // Truncate on a character boundary
        let content: String = article_content.chars().take(self.excerpt_chars).collect();

        let request = CompletionRequest {
            system: SUMMARY_SYSTEM_PROMPT.to_string(),
            prompt: format!(
                "Please summarize the following article:\n\nTitle: {}\n\nContent:\n{}",
                article_title, content
            ),
            temperature: 0.7,
            max_tokens: 500,
            api_key: api_key.map(str::to_string),
        };

        let reply = self.model.complete(request).await?;
        let parsed: SummaryReply = parse_reply(&reply)?;

        let lines: Vec<String> = parsed
            .lines
            .into_iter()
            .map(|line| line.trim().to_string())
            .collect();
        if lines.len() != SUMMARY_LINES {
            return Err(AppError::ClaudeApi(format!(
                "expected {} summary lines, got {}",
                SUMMARY_LINES,
                lines.len()
            )));
        }

        Ok(SummaryResult::from_lines(lines))
    }

    pub async fn generate_comments(
        &self,
        article_title: &str,
        summary_text: &str,
        tone: Tone,
        api_key: Option<&str>,
    ) -> Result<Vec<CommentResult>> {
        let request = CompletionRequest {
            system: COMMENT_SYSTEM_PROMPT.to_string(),
            prompt: format!(
                "Title: {}\n\nSummary:\n{}\n\nTone: {}",
                article_title, summary_text, tone
            ),
            temperature: 0.8,
            max_tokens: 500,
            api_key: api_key.map(str::to_string),
        };

        let reply = self.model.complete(request).await?;
        let parsed: CommentsReply = parse_reply(&reply)?;

        if parsed.comments.len() != COMMENT_COUNT {
            return Err(AppError::ClaudeApi(format!(
                "expected {} comments, got {}",
                COMMENT_COUNT,
                parsed.comments.len()
            )));
        }

        Ok(parsed
            .comments
            .into_iter()
            .zip(1..)
            .map(|(comment, position)| CommentResult::new(position, tone, comment.text.trim().to_string()))
            .collect())
    }

    pub fn model_version(&self) -> &str {
        self.model.model_version()
    }
}

fn parse_reply<T: DeserializeOwned>(reply: &str) -> Result<T> {
    serde_json::from_str(strip_code_fence(reply))
        .map_err(|e| AppError::ClaudeApi(format!("could not parse model reply as JSON: {}", e)))
}

/// Remove a surrounding markdown code fence (```json ... ```), if any.
fn strip_code_fence(text: &str) -> &str {
    let mut body = text.trim();
    if let Some(rest) = body.strip_prefix("```") {
        body = match rest.find('\n') {
            Some(newline) => &rest[newline + 1..],
            None => rest.trim_start_matches(|c: char| c.is_ascii_alphabetic()),
        };
    }
    let body = body.trim();
    body.strip_suffix("```").unwrap_or(body).trim()
}


#[cfg(test)]
mod tests {
    use super::testing::FakeModel;
    use super::*;

    fn build(model: FakeModel) -> (Summarizer, Arc<FakeModel>) {
        let model = Arc::new(model);
        (Summarizer::new(model.clone(), DEFAULT_EXCERPT_CHARS), model)
    }

    #[tokio::test]
    async fn test_summary_has_three_lines() {
        let (summarizer, _) = build(FakeModel::well_behaved());
        let summary = summarizer.generate_summary("Title", "Body", None).await.unwrap();
        assert_eq!(summary.lines.len(), 3);
        assert_eq!(summary.full_text, "Line one. Line two. Line three.");
    }

    #[tokio::test]
    async fn test_summary_with_two_or_four_lines_fails() {
        for reply in [
            r#"{"lines": ["a", "b"]}"#,
            r#"{"lines": ["a", "b", "c", "d"]}"#,
        ] {
            let (summarizer, _) = build(FakeModel::new(reply, "{}"));
            let err = summarizer.generate_summary("T", "C", None).await.unwrap_err();
            assert!(matches!(err, AppError::ClaudeApi(_)), "reply {} should fail", reply);
        }
    }

    #[tokio::test]
    async fn test_fenced_reply_is_accepted() {
        let fenced = "```json\n{\"lines\": [\"x\", \"y\", \"z\"]}\n```";
        let (summarizer, _) = build(FakeModel::new(fenced, "{}"));
        let summary = summarizer.generate_summary("T", "C", None).await.unwrap();
        assert_eq!(summary.lines, vec!["x", "y", "z"]);
    }

    #[tokio::test]
    async fn test_non_json_reply_fails() {
        let (summarizer, _) = build(FakeModel::new("Here is your summary: ...", "{}"));
        let err = summarizer.generate_summary("T", "C", None).await.unwrap_err();
        assert!(matches!(err, AppError::ClaudeApi(_)));

        let (summarizer, _) = build(FakeModel::new(r#"{"summary": "no lines field"}"#, "{}"));
        assert!(summarizer.generate_summary("T", "C", None).await.is_err());
    }

    #[tokio::test]
    async fn test_content_excerpt_is_capped() {
        let (summarizer, model) = build(FakeModel::well_behaved());
        let content = "語".repeat(DEFAULT_EXCERPT_CHARS + 500);
        summarizer.generate_summary("T", &content, Some("user-key")).await.unwrap();

        let requests = model.requests.lock().unwrap();
        let prompt = &requests[0].prompt;
        assert_eq!(prompt.matches('語').count(), DEFAULT_EXCERPT_CHARS);
        assert_eq!(requests[0].api_key.as_deref(), Some("user-key"));
    }

    #[tokio::test]
    async fn test_comments_positions_and_tone() {
        let (summarizer, model) = build(FakeModel::well_behaved());
        let comments = summarizer
            .generate_comments("T", "Summary text", Tone::Formal, None)
            .await
            .unwrap();

        assert_eq!(comments.len(), 3);
        let positions: Vec<u32> = comments.iter().map(|c| c.position).collect();
        assert_eq!(positions, vec![1, 2, 3]);
        assert!(comments.iter().all(|c| c.tone == Tone::Formal));
        assert_eq!(comments[0].text, "Great read!");
        assert_eq!(comments[0].length, 11);

        let requests = model.requests.lock().unwrap();
        assert!(requests[0].prompt.contains("Tone: formal"));
    }

    #[tokio::test]
    async fn test_wrong_comment_count_fails() {
        let (summarizer, _) = build(FakeModel::new(
            "{}",
            r#"{"comments": [{"text": "only one"}]}"#,
        ));
        let err = summarizer
            .generate_comments("T", "S", Tone::Casual, None)
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::ClaudeApi(_)));
    }

    #[test]
    fn test_strip_code_fence() {
        assert_eq!(strip_code_fence("```json\n{\"a\":1}\n```"), "{\"a\":1}");
        assert_eq!(strip_code_fence("```\n{\"a\":1}\n```\n"), "{\"a\":1}");
        assert_eq!(strip_code_fence("```json {\"a\":1}```"), "{\"a\":1}");
        assert_eq!(strip_code_fence("  {\"a\":1}  "), "{\"a\":1}");
    }
}
