//! Persistence gateway contract
//!
//! Append-only: records are inserted once, never updated or deleted, and
//! ids are never reused.

use async_trait::async_trait;
use econsult_core::{
    text::{char_len, truncate_chars},
    EconsultResult, LabelCounts, NewRecord, PersistedRecord, RecordId, SentimentArtifact,
    StorageError, SummaryArtifact, RAW_TEXT_MAX_CHARS, SUMMARY_MAX_CHARS,
};

/// Async store for analyzed submissions.
#[async_trait]
pub trait PersistenceGateway: Send + Sync {
    /// Store a record and return its newly assigned id.
    ///
    /// Implementations pass the record through [`enforce_record_limits`]
    /// first, so over-long text is truncated rather than rejected and blank
    /// text is refused by every backend alike.
    async fn insert(&self, record: NewRecord) -> EconsultResult<RecordId>;

    /// Fetch one record by id.
    async fn get(&self, id: RecordId) -> EconsultResult<Option<PersistedRecord>>;

    /// Page through records, newest first (ties broken by id, highest first).
    async fn list(&self, limit: u32, offset: u32) -> EconsultResult<Vec<PersistedRecord>>;

    /// Count records per sentiment label. Recomputed on every call.
    async fn aggregate(&self) -> EconsultResult<LabelCounts>;

    /// Total number of stored records.
    async fn count(&self) -> EconsultResult<u64>;

    /// Short identifier for logs and health reports.
    fn backend_name(&self) -> &'static str;
}

/// Final bounds check before a record is written.
///
/// Raw text is cut to [`RAW_TEXT_MAX_CHARS`], the summary to
/// [`SUMMARY_MAX_CHARS`] and the score clamped into [0, 1]. Each correction
/// is logged; upstream layers are expected to have applied them already.
///
/// # Errors
/// `StorageError::InsertFailed` when the raw text is blank.
pub fn enforce_record_limits(mut record: NewRecord) -> EconsultResult<NewRecord> {
    if record.raw_text.trim().is_empty() {
        return Err(StorageError::InsertFailed {
            reason: "raw_text is blank".to_string(),
        }
        .into());
    }

    let raw_len = char_len(&record.raw_text);
    if raw_len > RAW_TEXT_MAX_CHARS {
        tracing::warn!(
            chars = raw_len,
            limit = RAW_TEXT_MAX_CHARS,
            "Truncating raw text at persistence boundary"
        );
        record.raw_text = truncate_chars(&record.raw_text, RAW_TEXT_MAX_CHARS).to_string();
    }

    let summary_len = record.summary.char_len();
    if summary_len > SUMMARY_MAX_CHARS {
        tracing::warn!(
            chars = summary_len,
            limit = SUMMARY_MAX_CHARS,
            "Shortening summary at persistence boundary"
        );
        record.summary = SummaryArtifact::new(record.summary.text());
    }

    if !(0.0..=1.0).contains(&record.sentiment.score) {
        tracing::warn!(score = record.sentiment.score, "Clamping sentiment score at persistence boundary");
        record.sentiment = SentimentArtifact::clamped(record.sentiment);
    }

    Ok(record)
}
