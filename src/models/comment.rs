use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// Writing style for generated comments.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Tone {
    #[default]
    Casual,
    Formal,
    Neutral,
}

impl Tone {
    pub fn as_str(&self) -> &'static str {
        match self {
            Tone::Casual => "casual",
            Tone::Formal => "formal",
            Tone::Neutral => "neutral",
        }
    }
}

impl fmt::Display for Tone {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Tone {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "casual" => Ok(Tone::Casual),
            "formal" => Ok(Tone::Formal),
            "neutral" => Ok(Tone::Neutral),
            other => Err(format!("unknown tone '{}'", other)),
        }
    }
}

/// One generated comment draft.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct CommentResult {
    /// 1-based position within the set of three drafts.
    pub position: u32,
    pub tone: Tone,
    pub text: String,
    /// Length of `text` in characters.
    pub length: usize,
}

impl CommentResult {
    pub fn new(position: u32, tone: Tone, text: String) -> Self {
        let length = text.chars().count();
        Self {
            position,
            tone,
            text,
            length,
        }
    }
}

/// A comment as stored alongside its parent summary.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct StoredComment {
    pub id: i64,
    pub position: u32,
    pub tone: Tone,
    pub text: String,
    pub length: usize,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_length_counts_characters_not_bytes() {
        let comment = CommentResult::new(1, Tone::Casual, "AIの進化".to_string());
        assert_eq!(comment.length, 5);
    }

    #[test]
    fn test_tone_parse_and_default() {
        assert_eq!(Tone::default(), Tone::Casual);
        assert_eq!("formal".parse::<Tone>().unwrap(), Tone::Formal);
        assert!("shouty".parse::<Tone>().is_err());
        assert_eq!(serde_json::to_string(&Tone::Neutral).unwrap(), "\"neutral\"");
    }
}
