use chrono::{DateTime, NaiveDate, SecondsFormat, SubsecRound, Utc};
use rusqlite::types::Type;
use rusqlite::{params, OptionalExtension, Row};
use tokio_rusqlite::Connection;
use uuid::Uuid;

use crate::error::{AppError, Result};
use crate::models::{
    DailyAggregate, NewSummary, Pagination, PersistedSummary, StoredComment, SummaryPage, Tone,
};

use super::schema::SCHEMA;

const DATE_FORMAT: &str = "%Y-%m-%d";

const SUMMARY_COLUMNS: &str = "id, url, title, description, content, author, published_at, \
     summary_lines, summary_text, tokens_used, processing_time, created_at";

const ANALYTICS_COLUMNS: &str =
    "date, total_summaries, total_comments, total_tokens, unique_urls, avg_processing_time";

pub struct Repository {
    conn: Connection,
}

impl Repository {
    pub async fn new(db_path: &str) -> Result<Self> {
        let conn = Connection::open(db_path).await?;
        Self::init(conn).await
    }

    #[cfg(test)]
    pub async fn open_in_memory() -> Result<Self> {
        let conn = Connection::open_in_memory().await?;
        Self::init(conn).await
    }

    async fn init(conn: Connection) -> Result<Self> {
        conn.call(|conn| {
            conn.execute_batch(SCHEMA)?;
            Ok(())
        })
        .await?;

        Ok(Self { conn })
    }

    // Summary operations

    /// Store a summary with its comments, then bump today's aggregate.
    ///
    /// The aggregate update is best-effort: its failure is logged and never
    /// fails the save.
    pub async fn save_summary(&self, data: NewSummary) -> Result<PersistedSummary> {
        let id = Uuid::new_v4().to_string();
        // Stored with microsecond precision
        let created_at = Utc::now().trunc_subsecs(6);
        let lines_json = serde_json::to_string(&data.summary_lines)?;

        let row = data.clone();
        let summary_id = id.clone();
        let created = created_at.to_rfc3339_opts(SecondsFormat::Micros, true);
        let comment_ids = self
            .conn
            .call(move |conn| {
                let tx = conn.transaction()?;
                tx.execute(
                    r#"INSERT INTO summaries (id, url, title, description, content, author, published_at,
                                              summary_lines, summary_text, tokens_used, processing_time, created_at)
                       VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12)"#,
                    params![
                        summary_id,
                        row.url,
                        row.title,
                        row.description,
                        row.content,
                        row.author,
                        row.published_at,
                        lines_json,
                        row.summary_text,
                        row.tokens_used as i64,
                        row.processing_time as i64,
                        created,
                    ],
                )?;

                let mut ids = Vec::with_capacity(row.comments.len());
                for comment in &row.comments {
                    tx.execute(
                        "INSERT INTO comments (summary_id, text, tone, length, position) VALUES (?1, ?2, ?3, ?4, ?5)",
                        params![
                            summary_id,
                            comment.text,
                            comment.tone.as_str(),
                            comment.length as i64,
                            comment.position,
                        ],
                    )?;
                    ids.push(tx.last_insert_rowid());
                }
                tx.commit()?;
                Ok(ids)
            })
            .await?;

        if let Err(e) = self.update_analytics(&data, created_at.date_naive()).await {
            tracing::warn!("Failed to update daily analytics: {}", e);
        }

        let mut comments: Vec<StoredComment> = data
            .comments
            .into_iter()
            .zip(comment_ids)
            .map(|(comment, id)| StoredComment {
                id,
                position: comment.position,
                tone: comment.tone,
                text: comment.text,
                length: comment.length,
            })
            .collect();
        comments.sort_by_key(|c| c.position);

        Ok(PersistedSummary {
            id,
            url: data.url,
            title: data.title,
            description: data.description,
            content: data.content,
            author: data.author,
            published_at: data.published_at,
            summary_lines: data.summary_lines,
            summary_text: data.summary_text,
            tokens_used: data.tokens_used,
            processing_time: data.processing_time,
            created_at,
            comments,
        })
    }

    /// Newest first, with each item's comments in position order.
    pub async fn get_summaries(&self, limit: u32, offset: u32) -> Result<SummaryPage> {
        let (items, total) = self
            .conn
            .call(move |conn| {
                let total: i64 = conn.query_row("SELECT COUNT(*) FROM summaries", [], |row| row.get(0))?;

                let mut stmt = conn.prepare(&format!(
                    "SELECT {} FROM summaries ORDER BY created_at DESC, rowid DESC LIMIT ?1 OFFSET ?2",
                    SUMMARY_COLUMNS
                ))?;
                let mut items = stmt
                    .query_map(params![limit, offset], summary_from_row)?
                    .collect::<std::result::Result<Vec<_>, _>>()?;

                for item in &mut items {
                    item.comments = load_comments(conn, &item.id)?;
                }
                Ok((items, total))
            })
            .await?;

        Ok(SummaryPage {
            items,
            pagination: Pagination::new(total.max(0) as u64, limit, offset),
        })
    }

    pub async fn get_summary_by_id(&self, id: &str) -> Result<PersistedSummary> {
        let key = id.to_string();
        let summary = self
            .conn
            .call(move |conn| {
                let summary = conn
                    .query_row(
                        &format!("SELECT {} FROM summaries WHERE id = ?1", SUMMARY_COLUMNS),
                        params![key],
                        summary_from_row,
                    )
                    .optional()?;
                match summary {
                    Some(mut summary) => {
                        summary.comments = load_comments(conn, &summary.id)?;
                        Ok(Some(summary))
                    }
                    None => Ok(None),
                }
            })
            .await?;

        summary.ok_or_else(|| AppError::NotFound(format!("summary {}", id)))
    }

    /// Delete a summary; its comments go with it.
    pub async fn delete_summary(&self, id: &str) -> Result<()> {
        let key = id.to_string();
        let deleted = self
            .conn
            .call(move |conn| {
                let deleted = conn.execute("DELETE FROM summaries WHERE id = ?1", params![key])?;
                Ok(deleted)
            })
            .await?;

        if deleted == 0 {
            return Err(AppError::Database(format!("no summary with id {}", id)));
        }
        Ok(())
    }

    // Analytics

    /// Fold one save into the aggregate for `day` with a single upsert.
    pub async fn update_analytics(&self, data: &NewSummary, day: NaiveDate) -> Result<()> {
        let date = day.format(DATE_FORMAT).to_string();
        let comments = data.comments.len() as i64;
        let tokens = data.tokens_used as i64;
        let processing_time = data.processing_time as f64;

        self.conn
            .call(move |conn| {
                // SET expressions all read the pre-update row, so the mean uses the old count.
                conn.execute(
                    r#"INSERT INTO daily_analytics (date, total_summaries, total_comments, total_tokens, unique_urls, avg_processing_time)
                       VALUES (?1, 1, ?2, ?3, 1, ?4)
                       ON CONFLICT(date) DO UPDATE SET
                           avg_processing_time = (avg_processing_time * total_summaries + excluded.avg_processing_time)
                                                 / (total_summaries + 1),
                           total_summaries = total_summaries + 1,
                           total_comments = total_comments + excluded.total_comments,
                           total_tokens = total_tokens + excluded.total_tokens,
                           unique_urls = unique_urls + 1"#,
                    params![date, comments, tokens, processing_time],
                )?;
                Ok(())
            })
            .await?;
        Ok(())
    }

    #[cfg(test)]
    pub async fn get_daily_analytics(&self, day: NaiveDate) -> Result<Option<DailyAggregate>> {
        let date = day.format(DATE_FORMAT).to_string();
        let aggregate = self
            .conn
            .call(move |conn| {
                let aggregate = conn
                    .query_row(
                        &format!("SELECT {} FROM daily_analytics WHERE date = ?1", ANALYTICS_COLUMNS),
                        params![date],
                        analytics_from_row,
                    )
                    .optional()?;
                Ok(aggregate)
            })
            .await?;
        Ok(aggregate)
    }

    /// Most recent `days` aggregates, newest first.
    pub async fn recent_analytics(&self, days: u32) -> Result<Vec<DailyAggregate>> {
        let aggregates = self
            .conn
            .call(move |conn| {
                let mut stmt = conn.prepare(&format!(
                    "SELECT {} FROM daily_analytics ORDER BY date DESC LIMIT ?1",
                    ANALYTICS_COLUMNS
                ))?;
                let aggregates = stmt
                    .query_map(params![days], analytics_from_row)?
                    .collect::<std::result::Result<Vec<_>, _>>()?;
                Ok(aggregates)
            })
            .await?;
        Ok(aggregates)
    }
}

fn load_comments(conn: &rusqlite::Connection, summary_id: &str) -> rusqlite::Result<Vec<StoredComment>> {
    let mut stmt = conn.prepare_cached(
        "SELECT id, position, tone, text, length FROM comments WHERE summary_id = ?1 ORDER BY position ASC",
    )?;
    let comments = stmt
        .query_map(params![summary_id], comment_from_row)?
        .collect::<std::result::Result<Vec<_>, _>>()?;
    Ok(comments)
}

fn parse_datetime(s: &str) -> Option<DateTime<Utc>> {
    // Try RFC3339 first (e.g., "2026-01-11T12:34:56.123456Z")
    if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
        return Some(dt.with_timezone(&Utc));
    }
    // Try SQLite datetime format (e.g., "2026-01-11 12:34:56")
    if let Ok(naive) = chrono::NaiveDateTime::parse_from_str(s, "%Y-%m-%d %H:%M:%S") {
        return Some(naive.and_utc());
    }
    None
}

fn conversion_error(
    index: usize,
    err: impl Into<Box<dyn std::error::Error + Send + Sync>>,
) -> rusqlite::Error {
    rusqlite::Error::FromSqlConversionFailure(index, Type::Text, err.into())
}

fn summary_from_row(row: &Row) -> rusqlite::Result<PersistedSummary> {
    let lines_json: String = row.get(7)?;
    let summary_lines: Vec<String> =
        serde_json::from_str(&lines_json).map_err(|e| conversion_error(7, e))?;

    Ok(PersistedSummary {
        id: row.get(0)?,
        url: row.get(1)?,
        title: row.get(2)?,
        description: row.get(3)?,
        content: row.get(4)?,
        author: row.get(5)?,
        published_at: row.get(6)?,
        summary_lines,
        summary_text: row.get(8)?,
        tokens_used: row.get::<_, i64>(9)?.max(0) as u64,
        processing_time: row.get::<_, i64>(10)?.max(0) as u64,
        created_at: row
            .get::<_, String>(11)
            .ok()
            .and_then(|s| parse_datetime(&s))
            .unwrap_or_else(Utc::now),
        comments: Vec::new(),
    })
}

fn comment_from_row(row: &Row) -> rusqlite::Result<StoredComment> {
    let tone: String = row.get(2)?;
    Ok(StoredComment {
        id: row.get(0)?,
        position: row.get(1)?,
        tone: tone.parse::<Tone>().map_err(|e| conversion_error(2, e))?,
        text: row.get(3)?,
        length: row.get::<_, i64>(4)?.max(0) as usize,
    })
}

fn analytics_from_row(row: &Row) -> rusqlite::Result<DailyAggregate> {
    let date: String = row.get(0)?;
    Ok(DailyAggregate {
        date: NaiveDate::parse_from_str(&date, DATE_FORMAT).map_err(|e| conversion_error(0, e))?,
        total_summaries: row.get(1)?,
        total_comments: row.get(2)?,
        total_tokens: row.get(3)?,
        unique_urls: row.get(4)?,
        avg_processing_time: row.get(5)?,
    })
}
