mod client;
mod summarizer;
mod tokens;

pub use client::{ClaudeClient, DEFAULT_MODEL};
pub use summarizer::{Summarizer, DEFAULT_EXCERPT_CHARS};
pub use tokens::estimate_tokens;

#[cfg(test)]
pub(crate) use summarizer::testing;
