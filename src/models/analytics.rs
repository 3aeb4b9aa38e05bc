use chrono::NaiveDate;
use serde::Serialize;

/// Per-day running counters over successful generations.
#[derive(Debug, Clone, Serialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct DailyAggregate {
    pub date: NaiveDate,
    pub total_summaries: i64,
    pub total_comments: i64,
    pub total_tokens: i64,
    /// Incremented once per save; not deduplicated by URL.
    pub unique_urls: i64,
    /// Running mean of processing time in milliseconds.
    pub avg_processing_time: f64,
}
