//! eConsult Test Utilities
//!
//! Shared test infrastructure for the workspace:
//! - Stub analyzer providers (counting, failing, stalling, panicking)
//! - A gateway that always fails, for persistence-error paths
//! - Proptest generators for submissions and artifacts
//! - Fixtures and custom assertions
//! - Tracing initialisation for tests

pub use econsult_storage::InMemoryGateway;

pub use econsult_core::{
    EconsultError, EconsultResult, LabelCounts, NewRecord, PersistedRecord, PipelineConfig,
    ProviderError, SentimentArtifact, SentimentLabel, StakeholderType, StorageError,
    SummaryArtifact, RAW_TEXT_MAX_CHARS, SUMMARY_MAX_CHARS,
};
pub use econsult_llm::{
    ProviderCandidate, ProviderTier, SentimentChain, SentimentProvider, SummaryChain,
    SummaryProvider,
};

use async_trait::async_trait;
use econsult_core::RecordId;
use econsult_storage::PersistenceGateway;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

// ============================================================================
// TRACING
// ============================================================================

/// Install a test-writer subscriber honouring `RUST_LOG`. Safe to call from
/// every test; only the first call wins.
pub fn init_test_tracing() {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("warn"));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_test_writer()
        .try_init();
}

// ============================================================================
// STUB PROVIDERS
// ============================================================================

/// Sentiment provider returning a fixed artifact and counting calls.
#[derive(Debug)]
pub struct CountingSentimentProvider {
    artifact: SentimentArtifact,
    calls: AtomicUsize,
}

impl CountingSentimentProvider {
    pub fn new(label: SentimentLabel, score: f64) -> Self {
        Self {
            artifact: SentimentArtifact { label, score },
            calls: AtomicUsize::new(0),
        }
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

impl SentimentProvider for CountingSentimentProvider {
    fn name(&self) -> &str {
        "counting-sentiment"
    }

    fn classify(&self, _text: &str) -> EconsultResult<SentimentArtifact> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        Ok(self.artifact)
    }
}

/// Summary provider returning `"summary: <first word>"` and counting calls.
#[derive(Debug, Default)]
pub struct CountingSummaryProvider {
    calls: AtomicUsize,
}

impl CountingSummaryProvider {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

impl SummaryProvider for CountingSummaryProvider {
    fn name(&self) -> &str {
        "counting-summary"
    }

    fn summarize(&self, text: &str) -> EconsultResult<String> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        let first = text.split_whitespace().next().unwrap_or_default();
        Ok(format!("summary: {}", first))
    }
}

/// Provider whose every call fails with a request error.
#[derive(Debug, Default)]
pub struct FailingProvider {
    calls: AtomicUsize,
}

impl FailingProvider {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    fn fail<T>(&self) -> EconsultResult<T> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        Err(ProviderError::RequestFailed {
            provider: "failing".to_string(),
            status: 503,
            message: "service unavailable".to_string(),
        }
        .into())
    }
}

impl SentimentProvider for FailingProvider {
    fn name(&self) -> &str {
        "failing"
    }

    fn classify(&self, _text: &str) -> EconsultResult<SentimentArtifact> {
        self.fail()
    }
}

impl SummaryProvider for FailingProvider {
    fn name(&self) -> &str {
        "failing"
    }

    fn summarize(&self, _text: &str) -> EconsultResult<String> {
        self.fail()
    }
}

/// Provider that panics on every call.
#[derive(Debug, Default)]
pub struct PanickingProvider;

impl SentimentProvider for PanickingProvider {
    fn name(&self) -> &str {
        "panicking"
    }

    fn classify(&self, _text: &str) -> EconsultResult<SentimentArtifact> {
        panic!("classifier crashed")
    }
}

impl SummaryProvider for PanickingProvider {
    fn name(&self) -> &str {
        "panicking"
    }

    fn summarize(&self, _text: &str) -> EconsultResult<String> {
        panic!("summarizer crashed")
    }
}

/// Provider that sleeps before answering. Pair with a shorter task timeout.
#[derive(Debug)]
pub struct StallingProvider {
    delay: Duration,
}

impl StallingProvider {
    pub fn new(delay: Duration) -> Self {
        Self { delay }
    }
}

impl SentimentProvider for StallingProvider {
    fn name(&self) -> &str {
        "stalling"
    }

    fn classify(&self, _text: &str) -> EconsultResult<SentimentArtifact> {
        std::thread::sleep(self.delay);
        Ok(SentimentArtifact {
            label: SentimentLabel::Positive,
            score: 0.99,
        })
    }
}

impl SummaryProvider for StallingProvider {
    fn name(&self) -> &str {
        "stalling"
    }

    fn summarize(&self, _text: &str) -> EconsultResult<String> {
        std::thread::sleep(self.delay);
        Ok("too late".to_string())
    }
}

/// Provider returning output that fails validation: an out-of-range score,
/// or a blank summary.
#[derive(Debug, Default)]
pub struct GarbageProvider;

impl SentimentProvider for GarbageProvider {
    fn name(&self) -> &str {
        "garbage"
    }

    fn classify(&self, _text: &str) -> EconsultResult<SentimentArtifact> {
        Ok(SentimentArtifact {
            label: SentimentLabel::Positive,
            score: 7.5,
        })
    }
}

impl SummaryProvider for GarbageProvider {
    fn name(&self) -> &str {
        "garbage"
    }

    fn summarize(&self, _text: &str) -> EconsultResult<String> {
        Ok(" \n ".to_string())
    }
}

// ============================================================================
// CHAIN HELPERS
// ============================================================================

/// Resolve a one-candidate sentiment chain around `provider`.
pub fn sentiment_chain(provider: Arc<dyn SentimentProvider>) -> SentimentChain {
    let name = provider.name().to_string();
    SentimentChain::resolve(
        "sentiment",
        vec![ProviderCandidate::ready(name, ProviderTier::Primary, provider)],
    )
    .expect("a ready candidate always resolves")
}

/// Resolve a one-candidate summary chain around `provider`.
pub fn summary_chain(provider: Arc<dyn SummaryProvider>) -> SummaryChain {
    let name = provider.name().to_string();
    SummaryChain::resolve(
        "summary",
        vec![ProviderCandidate::ready(name, ProviderTier::Primary, provider)],
    )
    .expect("a ready candidate always resolves")
}

// ============================================================================
// FAILING GATEWAY
// ============================================================================

/// Gateway whose writes always fail; reads return nothing.
#[derive(Debug, Default)]
pub struct FailingGateway {
    attempts: AtomicUsize,
}

impl FailingGateway {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn attempts(&self) -> usize {
        self.attempts.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl PersistenceGateway for FailingGateway {
    async fn insert(&self, _record: NewRecord) -> EconsultResult<RecordId> {
        self.attempts.fetch_add(1, Ordering::SeqCst);
        Err(StorageError::InsertFailed {
            reason: "disk full".to_string(),
        }
        .into())
    }

    async fn get(&self, _id: RecordId) -> EconsultResult<Option<PersistedRecord>> {
        Ok(None)
    }

    async fn list(&self, _limit: u32, _offset: u32) -> EconsultResult<Vec<PersistedRecord>> {
        Ok(Vec::new())
    }

    async fn aggregate(&self) -> EconsultResult<LabelCounts> {
        Ok(LabelCounts::default())
    }

    async fn count(&self) -> EconsultResult<u64> {
        Err(StorageError::QueryFailed {
            reason: "disk full".to_string(),
        }
        .into())
    }

    fn backend_name(&self) -> &'static str {
        "failing"
    }
}

// ============================================================================
// PROPTEST GENERATORS
// ============================================================================

pub mod generators {
    //! Proptest strategies for submissions and artifacts.

    use super::*;
    use proptest::prelude::*;

    pub fn arb_stakeholder_type() -> impl Strategy<Value = StakeholderType> {
        prop_oneof![
            Just(StakeholderType::Citizen),
            Just(StakeholderType::Business),
            Just(StakeholderType::Ngo),
            Just(StakeholderType::Academic),
        ]
    }

    pub fn arb_sentiment_label() -> impl Strategy<Value = SentimentLabel> {
        prop_oneof![
            Just(SentimentLabel::Positive),
            Just(SentimentLabel::Neutral),
            Just(SentimentLabel::Negative),
        ]
    }

    pub fn arb_sentiment_artifact() -> impl Strategy<Value = SentimentArtifact> {
        (arb_sentiment_label(), 0.0f64..=1.0).prop_map(|(label, score)| SentimentArtifact {
            label,
            score,
        })
    }

    /// Non-blank comment text of 1 to 300 characters, mixing ASCII and
    /// multi-byte characters.
    pub fn arb_comment_text() -> impl Strategy<Value = String> {
        "[a-zA-Zéü0-9 .,!?']{0,299}".prop_map(|tail| format!("x{}", tail))
    }

    /// Text longer than the raw text limit.
    pub fn arb_oversized_text() -> impl Strategy<Value = String> {
        (RAW_TEXT_MAX_CHARS + 1..RAW_TEXT_MAX_CHARS * 2).prop_map(|n| "w ".repeat(n / 2 + 1))
    }
}

// ============================================================================
// TEST FIXTURES
// ============================================================================

pub mod fixtures {
    //! Pre-built inputs and configurations.

    use super::*;

    pub const POSITIVE_COMMENT: &str =
        "I love this policy, it is excellent and will help everyone";
    pub const NEGATIVE_COMMENT: &str =
        "This is a terrible plan and I oppose the harm it will cause to small shops";
    pub const SHORT_COMMENT: &str = "Good idea.";

    /// Pipeline settings sized for tests: small caches, short timeout.
    pub fn test_pipeline_config(per_task_timeout: Duration) -> PipelineConfig {
        PipelineConfig {
            cache_capacity: 100,
            eviction_batch: 10,
            worker_pool_size: 4,
            per_task_timeout,
            short_summary_word_threshold: 3,
        }
    }

    /// A valid record ready for a gateway.
    pub fn new_record(label: SentimentLabel, raw_text: &str) -> NewRecord {
        NewRecord {
            stakeholder_type: StakeholderType::Citizen,
            raw_text: raw_text.to_string(),
            sentiment: SentimentArtifact { label, score: 0.8 },
            summary: SummaryArtifact::new(raw_text),
            created_at: chrono::Utc::now(),
        }
    }
}

// ============================================================================
// CUSTOM ASSERTIONS
// ============================================================================

pub mod assertions {
    //! Assertions for record invariants and error classes.

    use super::*;

    /// Assert the bounds every stored record must satisfy.
    #[track_caller]
    pub fn assert_record_within_bounds(record: &PersistedRecord) {
        let raw_len = record.raw_text.chars().count();
        assert!(
            (1..=RAW_TEXT_MAX_CHARS).contains(&raw_len),
            "raw text has {} chars",
            raw_len
        );
        assert!(
            record.summary.char_len() <= SUMMARY_MAX_CHARS,
            "summary has {} chars: {:?}",
            record.summary.char_len(),
            record.summary.text()
        );
        assert!(!record.summary.text().is_empty(), "summary is empty");
        assert!(
            (0.0..=1.0).contains(&record.sentiment.score),
            "score {} out of range",
            record.sentiment.score
        );
        assert!(record.id > 0, "id {} not assigned", record.id);
    }

    /// Assert the neutral 0.5 default sentiment.
    #[track_caller]
    pub fn assert_default_sentiment(record: &PersistedRecord) {
        assert_eq!(record.sentiment, SentimentArtifact::neutral_default());
    }

    /// Assert the result is a persistence failure.
    #[track_caller]
    pub fn assert_persistence_failure<T: std::fmt::Debug>(result: &EconsultResult<T>) {
        match result {
            Err(e) if e.is_persistence_failure() => {}
            other => panic!("Expected persistence failure, got: {:?}", other),
        }
    }

    /// Assert the result is a validation error.
    #[track_caller]
    pub fn assert_validation_error<T: std::fmt::Debug>(result: &EconsultResult<T>) {
        match result {
            Err(EconsultError::Validation(_)) => {}
            other => panic!("Expected Validation error, got: {:?}", other),
        }
    }
}

// ============================================================================
// TESTS
// ============================================================================
