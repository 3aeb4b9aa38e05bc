mod content_fetcher;
mod extractor;

pub use content_fetcher::{validate_url, ContentFetcher};
#[cfg(test)]
pub use extractor::extract_article;
