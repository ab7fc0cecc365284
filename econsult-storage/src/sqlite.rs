//! SQLite persistence gateway
//!
//! One `comments` table. CHECK constraints mirror the record bounds so the
//! database refuses anything the gateway failed to catch.

use crate::gateway::{enforce_record_limits, PersistenceGateway};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use econsult_core::{
    EconsultError, EconsultResult, LabelCounts, NewRecord, PersistedRecord, RecordId,
    SentimentArtifact, SentimentLabel, StakeholderType, StorageConfig, StorageError,
    SummaryArtifact,
};
use sqlx::sqlite::{
    SqliteConnectOptions, SqliteJournalMode, SqlitePool, SqlitePoolOptions, SqliteRow,
    SqliteSynchronous,
};
use sqlx::Row;
use std::time::Duration;

const BUSY_TIMEOUT: Duration = Duration::from_secs(5);

const CREATE_COMMENTS_TABLE: &str = r#"
CREATE TABLE IF NOT EXISTS comments (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    stakeholder_type TEXT NOT NULL
        CHECK (stakeholder_type IN ('citizen', 'business', 'ngo', 'academic')),
    raw_text TEXT NOT NULL CHECK (length(raw_text) BETWEEN 1 AND 300),
    sentiment_label TEXT NOT NULL
        CHECK (sentiment_label IN ('positive', 'neutral', 'negative')),
    sentiment_score REAL NOT NULL CHECK (sentiment_score BETWEEN 0.0 AND 1.0),
    summary TEXT NOT NULL CHECK (length(summary) <= 50),
    created_at TEXT NOT NULL
)
"#;

const CREATE_INDEXES: &[&str] = &[
    "CREATE INDEX IF NOT EXISTS idx_comments_created_at ON comments(created_at DESC)",
    "CREATE INDEX IF NOT EXISTS idx_comments_sentiment ON comments(sentiment_label)",
    "CREATE INDEX IF NOT EXISTS idx_comments_stakeholder ON comments(stakeholder_type)",
];

const SELECT_COLUMNS: &str = "SELECT id, stakeholder_type, raw_text, sentiment_label, \
     sentiment_score, summary, created_at FROM comments";

fn query_failed(e: sqlx::Error) -> EconsultError {
    StorageError::QueryFailed {
        reason: e.to_string(),
    }
    .into()
}

fn corrupt(id: RecordId, reason: impl ToString) -> EconsultError {
    StorageError::Corrupt {
        id,
        reason: reason.to_string(),
    }
    .into()
}

/// Gateway over a SQLite connection pool.
#[derive(Clone)]
pub struct SqliteGateway {
    pool: SqlitePool,
}

impl SqliteGateway {
    /// Open (creating if missing) the database file and ensure the schema.
    pub async fn connect(config: &StorageConfig) -> EconsultResult<Self> {
        config.validate()?;

        let options = SqliteConnectOptions::new()
            .filename(&config.database_path)
            .create_if_missing(true)
            .journal_mode(SqliteJournalMode::Wal)
            .synchronous(SqliteSynchronous::Normal)
            .busy_timeout(BUSY_TIMEOUT);

        let pool = SqlitePoolOptions::new()
            .max_connections(config.max_connections)
            .connect_with(options)
            .await
            .map_err(query_failed)?;

        tracing::info!(
            path = %config.database_path.display(),
            max_connections = config.max_connections,
            "Opened comment database"
        );
        Self::from_pool(pool).await
    }

    /// Private in-memory database on a single connection that is never
    /// recycled, since closing it would discard the data.
    pub async fn connect_in_memory() -> EconsultResult<Self> {
        let options = SqliteConnectOptions::new().in_memory(true);
        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .min_connections(1)
            .idle_timeout(None)
            .max_lifetime(None)
            .connect_with(options)
            .await
            .map_err(query_failed)?;
        Self::from_pool(pool).await
    }

    /// Wrap an existing pool, creating the schema if needed.
    pub async fn from_pool(pool: SqlitePool) -> EconsultResult<Self> {
        sqlx::query(CREATE_COMMENTS_TABLE)
            .execute(&pool)
            .await
            .map_err(query_failed)?;
        for statement in CREATE_INDEXES {
            sqlx::query(statement)
                .execute(&pool)
                .await
                .map_err(query_failed)?;
        }
        Ok(Self { pool })
    }

    pub async fn close(&self) {
        self.pool.close().await;
    }

    fn decode(row: &SqliteRow) -> EconsultResult<PersistedRecord> {
        let id: RecordId = row.try_get("id").map_err(query_failed)?;

        let stakeholder: String = row.try_get("stakeholder_type").map_err(|e| corrupt(id, e))?;
        let stakeholder_type =
            StakeholderType::from_db_str(&stakeholder).map_err(|e| corrupt(id, e))?;

        let label: String = row.try_get("sentiment_label").map_err(|e| corrupt(id, e))?;
        let label = SentimentLabel::from_db_str(&label).map_err(|e| corrupt(id, e))?;
        let score: f64 = row.try_get("sentiment_score").map_err(|e| corrupt(id, e))?;
        let sentiment = SentimentArtifact::new(label, score).map_err(|e| corrupt(id, e))?;

        let raw_text: String = row.try_get("raw_text").map_err(|e| corrupt(id, e))?;
        let summary: String = row.try_get("summary").map_err(|e| corrupt(id, e))?;
        let created_at: DateTime<Utc> = row.try_get("created_at").map_err(|e| corrupt(id, e))?;

        Ok(PersistedRecord {
            id,
            stakeholder_type,
            raw_text,
            sentiment,
            summary: SummaryArtifact::new(&summary),
            created_at,
        })
    }
}

impl std::fmt::Debug for SqliteGateway {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SqliteGateway")
            .field("connections", &self.pool.size())
            .field("closed", &self.pool.is_closed())
            .finish()
    }
}

#[async_trait]
impl PersistenceGateway for SqliteGateway {
    async fn insert(&self, record: NewRecord) -> EconsultResult<RecordId> {
        let record = enforce_record_limits(record)?;
        let result = sqlx::query(
            "INSERT INTO comments \
             (stakeholder_type, raw_text, sentiment_label, sentiment_score, summary, created_at) \
             VALUES (?, ?, ?, ?, ?, ?)",
        )
        .bind(record.stakeholder_type.as_db_str())
        .bind(&record.raw_text)
        .bind(record.sentiment.label.as_db_str())
        .bind(record.sentiment.score)
        .bind(record.summary.text())
        .bind(record.created_at)
        .execute(&self.pool)
        .await
        .map_err(|e| StorageError::InsertFailed {
            reason: e.to_string(),
        })?;

        let id = result.last_insert_rowid();
        tracing::debug!(id, label = %record.sentiment.label, "Stored comment");
        Ok(id)
    }

    async fn get(&self, id: RecordId) -> EconsultResult<Option<PersistedRecord>> {
        let row = sqlx::query(&format!("{SELECT_COLUMNS} WHERE id = ?"))
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .map_err(query_failed)?;
        row.as_ref().map(Self::decode).transpose()
    }

    async fn list(&self, limit: u32, offset: u32) -> EconsultResult<Vec<PersistedRecord>> {
        let rows = sqlx::query(&format!(
            "{SELECT_COLUMNS} ORDER BY created_at DESC, id DESC LIMIT ? OFFSET ?"
        ))
        .bind(i64::from(limit))
        .bind(i64::from(offset))
        .fetch_all(&self.pool)
        .await
        .map_err(query_failed)?;
        rows.iter().map(Self::decode).collect()
    }

    async fn aggregate(&self) -> EconsultResult<LabelCounts> {
        let rows = sqlx::query(
            "SELECT sentiment_label, COUNT(*) AS total FROM comments GROUP BY sentiment_label",
        )
        .fetch_all(&self.pool)
        .await
        .map_err(query_failed)?;

        let mut counts = LabelCounts::default();
        for row in rows {
            let label: String = row.try_get("sentiment_label").map_err(query_failed)?;
            let total: i64 = row.try_get("total").map_err(query_failed)?;
            match SentimentLabel::from_db_str(&label) {
                Ok(label) => counts.add(label, total.max(0) as u64),
                Err(e) => tracing::warn!(label = %e.0, "Skipping unknown sentiment label in aggregate"),
            }
        }
        Ok(counts)
    }

    async fn count(&self) -> EconsultResult<u64> {
        let total: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM comments")
            .fetch_one(&self.pool)
            .await
            .map_err(query_failed)?;
        Ok(total.max(0) as u64)
    }

    fn backend_name(&self) -> &'static str {
        "sqlite"
    }
}
