use serde::Serialize;
use thiserror::Error;

pub type Result<T> = std::result::Result<T, AppError>;

/// Machine-readable error codes returned to API callers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ErrorCode {
    InvalidUrl,
    InvalidRequest,
    FetchFailed,
    ParsingFailed,
    AiApiError,
    RateLimitExceeded,
    InternalError,
    NetworkError,
    DatabaseError,
    NotFound,
}

impl ErrorCode {
    pub fn as_str(&self) -> &'static str {
        match self {
            ErrorCode::InvalidUrl => "INVALID_URL",
            ErrorCode::InvalidRequest => "INVALID_REQUEST",
            ErrorCode::FetchFailed => "FETCH_FAILED",
            ErrorCode::ParsingFailed => "PARSING_FAILED",
            ErrorCode::AiApiError => "AI_API_ERROR",
            ErrorCode::RateLimitExceeded => "RATE_LIMIT_EXCEEDED",
            ErrorCode::InternalError => "INTERNAL_ERROR",
            ErrorCode::NetworkError => "NETWORK_ERROR",
            ErrorCode::DatabaseError => "DATABASE_ERROR",
            ErrorCode::NotFound => "NOT_FOUND",
        }
    }

    /// Message shown to end users. Technical detail travels separately.
    pub fn user_message(&self) -> &'static str {
        match self {
            ErrorCode::InvalidUrl => "The URL is not valid. Enter a full http:// or https:// address.",
            ErrorCode::InvalidRequest => "The request could not be understood.",
            ErrorCode::FetchFailed => "Could not fetch the article. Check the URL and try again.",
            ErrorCode::ParsingFailed => "Could not read the article content. Try a different article.",
            ErrorCode::AiApiError => "The AI service failed to process the article. Please retry shortly.",
            ErrorCode::RateLimitExceeded => "Request limit reached. Please wait a moment and retry.",
            ErrorCode::InternalError => "An internal server error occurred.",
            ErrorCode::NetworkError => "A network error occurred. Check your connection.",
            ErrorCode::DatabaseError => "Saving or loading data failed. Please retry.",
            ErrorCode::NotFound => "The requested summary was not found.",
        }
    }
}

#[derive(Error, Debug)]
pub enum AppError {
    #[error("Invalid URL: {0}")]
    InvalidUrl(String),

    #[error("Invalid request: {0}")]
    InvalidRequest(String),

    #[error("Failed to fetch article: {0}")]
    Fetch(String),

    #[error("Failed to parse article: {0}")]
    Parsing(String),

    #[error("Claude API error: {0}")]
    ClaudeApi(String),

    #[error("Rate limit exceeded: {0}")]
    RateLimited(String),

    #[error("Network error: {0}")]
    Network(#[from] reqwest::Error),

    #[error("Database error: {0}")]
    Database(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("TOML parse error: {0}")]
    Toml(#[from] toml::de::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl AppError {
    pub fn code(&self) -> ErrorCode {
        match self {
            AppError::InvalidUrl(_) => ErrorCode::InvalidUrl,
            AppError::InvalidRequest(_) => ErrorCode::InvalidRequest,
            AppError::Fetch(_) => ErrorCode::FetchFailed,
            AppError::Parsing(_) => ErrorCode::ParsingFailed,
            AppError::ClaudeApi(_) => ErrorCode::AiApiError,
            AppError::RateLimited(_) => ErrorCode::RateLimitExceeded,
            AppError::Network(_) => ErrorCode::NetworkError,
            AppError::Database(_) => ErrorCode::DatabaseError,
            AppError::NotFound(_) => ErrorCode::NotFound,
            AppError::Config(_)
            | AppError::Io(_)
            | AppError::Toml(_)
            | AppError::Serialization(_) => ErrorCode::InternalError,
        }
    }

    pub fn retryable(&self) -> bool {
        matches!(
            self.code(),
            ErrorCode::FetchFailed
                | ErrorCode::AiApiError
                | ErrorCode::RateLimitExceeded
                | ErrorCode::NetworkError
                | ErrorCode::DatabaseError
        )
    }

    pub fn status_code(&self) -> u16 {
        match self.code() {
            ErrorCode::InvalidUrl | ErrorCode::InvalidRequest => 400,
            ErrorCode::NotFound => 404,
            ErrorCode::RateLimitExceeded => 429,
            _ => 500,
        }
    }

    pub fn user_message(&self) -> &'static str {
        self.code().user_message()
    }

    /// Technical detail for logs and the `details` field of error envelopes.
    pub fn details(&self) -> String {
        self.to_string()
    }
}

impl From<rusqlite::Error> for AppError {
    fn from(e: rusqlite::Error) -> Self {
        AppError::Database(e.to_string())
    }
}

impl From<tokio_rusqlite::Error> for AppError {
    fn from(e: tokio_rusqlite::Error) -> Self {
        AppError::Database(e.to_string())
    }
}
