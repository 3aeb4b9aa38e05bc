mod analytics;
mod article;
mod comment;
mod summary;

pub use analytics::DailyAggregate;
pub use article::ArticleData;
pub use comment::{CommentResult, StoredComment, Tone};
pub use summary::{
    NewSummary, Pagination, PersistedSummary, ResponseMetadata, SummarizeRequest,
    SummarizeResponse, SummaryPage, SummaryResult,
};

#[cfg(test)]
pub use summary::SummarizeOptions;
