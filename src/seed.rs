use chrono::Utc;

use crate::db::Repository;
use crate::error::Result;
use crate::models::{ArticleData, CommentResult, NewSummary, PersistedSummary, SummaryResult, Tone};

pub const SAMPLE_URL: &str = "https://example.com/sample-article";

const SAMPLE_TITLE: &str = "Sample article: the latest trends in AI";
const SAMPLE_DESCRIPTION: &str = "An overview of where AI technology is heading.";
const SAMPLE_AUTHOR: &str = "Sample Author";

const SAMPLE_PARAGRAPHS: [&str; 3] = [
    "The latest AI technology is dramatically improving how efficiently teams work.",
    "Natural language processing in particular is approaching a human level of understanding.",
    "The AI market is forecast to triple in size over the next five years.",
];

const SAMPLE_SUMMARY: [&str; 3] = [
    "New AI tools are sharply raising workplace efficiency.",
    "Natural language processing is nearing human-level understanding.",
    "The AI market is expected to triple within five years.",
];

const SAMPLE_COMMENTS: [&str; 3] = [
    "Amazed at how fast AI is moving! Language models are going to change my job too.",
    "From an efficiency point of view adopting AI feels unavoidable. Time to start preparing.",
    "A market tripling in five years is wild. Going to keep a close eye on this one.",
];

const SAMPLE_TOKENS: u64 = 1250;
const SAMPLE_PROCESSING_MS: u64 = 3500;

pub fn sample_article() -> ArticleData {
    ArticleData {
        url: SAMPLE_URL.to_string(),
        title: SAMPLE_TITLE.to_string(),
        description: Some(SAMPLE_DESCRIPTION.to_string()),
        content: SAMPLE_PARAGRAPHS.join("\n"),
        author: Some(SAMPLE_AUTHOR.to_string()),
        published_at: Some(Utc::now().to_rfc3339()),
        og_image: None,
        favicon: None,
    }
}

/// The sample article as a page a fetcher would download.
#[cfg(test)]
pub fn sample_article_html() -> String {
    let paragraphs: String = SAMPLE_PARAGRAPHS
        .iter()
        .map(|p| format!("<p>{}</p>\n", p))
        .collect();

    format!(
        r#"<!DOCTYPE html>
<html>
<head>
    <title>{title} | Example News</title>
    <meta property="og:title" content="{title}">
    <meta name="description" content="{description}">
    <meta name="author" content="{author}">
    <meta property="article:published_time" content="2024-01-15T09:00:00Z">
    <link rel="icon" href="/favicon.ico">
</head>
<body>
    <nav><a href="/">Home</a> <a href="/tech">Tech</a></nav>
    <article>
        <h1>{title}</h1>
        {paragraphs}
    </article>
    <footer>Copyright Example News</footer>
</body>
</html>"#,
        title = SAMPLE_TITLE,
        description = SAMPLE_DESCRIPTION,
        author = SAMPLE_AUTHOR,
        paragraphs = paragraphs,
    )
}

/// Store the sample summary with three casual comments.
pub async fn seed(repository: &Repository) -> Result<PersistedSummary> {
    let article = sample_article();
    let summary = SummaryResult::from_lines(SAMPLE_SUMMARY.iter().map(|l| l.to_string()).collect());
    let comments: Vec<CommentResult> = SAMPLE_COMMENTS
        .iter()
        .zip(1..)
        .map(|(text, position)| CommentResult::new(position, Tone::Casual, text.to_string()))
        .collect();

    let saved = repository
        .save_summary(NewSummary::new(
            &article,
            &summary,
            &comments,
            SAMPLE_TOKENS,
            SAMPLE_PROCESSING_MS,
        ))
        .await?;

    tracing::info!("Seeded sample summary {}", saved.id);
    Ok(saved)
}
