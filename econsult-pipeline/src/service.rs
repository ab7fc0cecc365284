//! Analysis service: the comment-processing orchestrator
//!
//! Owns both result caches, both resolved provider chains, the worker pool
//! and the persistence gateway. Built once at startup and shared by
//! reference.
//!
//! Flow for one submission:
//! 1. bound the text and fingerprint it
//! 2. short texts take themselves as summary; otherwise check each cache
//! 3. dispatch misses to the pool concurrently and join
//! 4. cache fresh provider results (never defaults)
//! 5. re-check bounds, persist, return the stored record
//!
//! Analyzer failures only change which artifact is used. The only error a
//! processed submission can produce is a persistence error.

use crate::pool::{PoolStatsSnapshot, WorkerPool};
use crate::stats::{ArtifactSource, PipelineStats, PipelineStatsSnapshot};
use chrono::Utc;
use econsult_core::text::{char_len, truncate_chars, word_count};
use econsult_core::{
    DashboardStats, EconsultError, EconsultResult, Fingerprint, HealthCheck, HealthReport,
    NewRecord, PersistedRecord, PipelineConfig, ProviderError, ProvidersConfig, RecordId,
    SentimentArtifact, StakeholderType, Submission, SummaryArtifact, ValidationError,
    RAW_TEXT_MAX_CHARS, SUMMARY_MAX_CHARS,
};
use econsult_llm::{resolve_default_chains, ProviderChain, SentimentChain, SummaryChain};
use econsult_storage::{PersistenceGateway, ResultCache};
use serde::Serialize;
use std::sync::Arc;
use tracing::Instrument;

/// Records shown on the dashboard.
pub const DASHBOARD_RECENT_LIMIT: u32 = 5;

// ============================================================================
// OUTCOME TYPES
// ============================================================================

/// A stored record plus how each of its artifacts was obtained.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ProcessOutcome {
    pub record: PersistedRecord,
    pub fingerprint: Fingerprint,
    pub sentiment_source: ArtifactSource,
    pub summary_source: ArtifactSource,
}

impl ProcessOutcome {
    /// True when either artifact is a failure default.
    pub fn is_degraded(&self) -> bool {
        self.sentiment_source.is_degraded() || self.summary_source.is_degraded()
    }
}

/// A batch row that was not processed.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SkippedRow {
    pub index: usize,
    pub reason: String,
}

/// Result of [`AnalysisService::process_batch`].
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct BatchReport {
    pub processed: Vec<PersistedRecord>,
    pub skipped: Vec<SkippedRow>,
}

// ============================================================================
// SERVICE
// ============================================================================

pub struct AnalysisService {
    config: PipelineConfig,
    sentiment: SentimentChain,
    summary: SummaryChain,
    sentiment_cache: ResultCache<SentimentArtifact>,
    summary_cache: ResultCache<SummaryArtifact>,
    pool: WorkerPool,
    gateway: Arc<dyn PersistenceGateway>,
    stats: PipelineStats,
}

impl AnalysisService {
    /// Assemble a service from already-resolved chains.
    pub fn new(
        config: PipelineConfig,
        sentiment: SentimentChain,
        summary: SummaryChain,
        gateway: Arc<dyn PersistenceGateway>,
    ) -> EconsultResult<Self> {
        config.validate()?;

        tracing::info!(
            sentiment = sentiment.resolved_name(),
            summary = summary.resolved_name(),
            store = gateway.backend_name(),
            workers = config.worker_pool_size,
            timeout_ms = config.per_task_timeout.as_millis() as u64,
            "Analysis service ready"
        );

        Ok(Self {
            sentiment_cache: ResultCache::new(
                "sentiment",
                config.cache_capacity,
                config.eviction_batch,
            ),
            summary_cache: ResultCache::new(
                "summary",
                config.cache_capacity,
                config.eviction_batch,
            ),
            pool: WorkerPool::new(config.worker_pool_size, config.per_task_timeout),
            config,
            sentiment,
            summary,
            gateway,
            stats: PipelineStats::default(),
        })
    }

    /// Resolve the default provider chains, then assemble the service.
    ///
    /// # Errors
    /// `ProviderError::ResolutionFailed` if a chain has no loadable provider.
    pub fn from_config(
        config: PipelineConfig,
        providers: &ProvidersConfig,
        gateway: Arc<dyn PersistenceGateway>,
    ) -> EconsultResult<Self> {
        let (sentiment, summary) = resolve_default_chains(providers)?;
        Self::new(config, sentiment, summary, gateway)
    }

    // ------------------------------------------------------------------------
    // Write side
    // ------------------------------------------------------------------------

    /// Analyze and store one comment.
    ///
    /// # Errors
    /// - `ValidationError` for blank text
    /// - `StorageError` when the record could not be stored
    pub async fn process(
        &self,
        stakeholder_type: StakeholderType,
        raw_text: &str,
    ) -> EconsultResult<PersistedRecord> {
        let submission = Submission::new(stakeholder_type, raw_text)?;
        Ok(self.process_submission(submission).await?.record)
    }

    /// As [`process`](Self::process), parsing the stakeholder string first.
    pub async fn submit(
        &self,
        stakeholder_type: &str,
        raw_text: &str,
    ) -> EconsultResult<PersistedRecord> {
        let submission = Submission::parse(stakeholder_type, raw_text)?;
        Ok(self.process_submission(submission).await?.record)
    }

    /// Analyze and store a prepared submission, reporting artifact sources.
    pub async fn process_submission(&self, submission: Submission) -> EconsultResult<ProcessOutcome> {
        let span = tracing::info_span!(
            "process_submission",
            submission_id = %submission.submission_id,
            stakeholder = %submission.stakeholder_type,
        );
        self.run_submission(submission).instrument(span).await
    }

    async fn run_submission(&self, submission: Submission) -> EconsultResult<ProcessOutcome> {
        let raw_text = truncate_chars(&submission.raw_text, RAW_TEXT_MAX_CHARS);
        if raw_text.trim().is_empty() {
            return Err(ValidationError::RequiredFieldMissing {
                field: "raw_text".to_string(),
            }
            .into());
        }

        let fingerprint = Fingerprint::of(raw_text);
        let short_text = word_count(raw_text) < self.config.short_summary_word_threshold;
        tracing::debug!(%fingerprint, chars = char_len(raw_text), short_text, "Analyzing submission");

        let summary_task = async {
            if short_text {
                (SummaryArtifact::fallback_for(raw_text), ArtifactSource::ShortText)
            } else {
                self.summarize(fingerprint, raw_text).await
            }
        };
        let ((sentiment, sentiment_source), (summary, summary_source)) =
            tokio::join!(self.classify(fingerprint, raw_text), summary_task);

        if sentiment_source == ArtifactSource::Provider {
            self.sentiment_cache.put(fingerprint, sentiment);
        }
        if summary_source == ArtifactSource::Provider {
            self.summary_cache.put(fingerprint, summary.clone());
        }
        self.stats.record_sentiment(sentiment_source);
        self.stats.record_summary(summary_source);

        let summary = if summary.char_len() > SUMMARY_MAX_CHARS {
            SummaryArtifact::new(summary.text())
        } else {
            summary
        };
        let record = NewRecord {
            stakeholder_type: submission.stakeholder_type,
            raw_text: raw_text.to_string(),
            sentiment: sentiment.clamped(),
            summary,
            created_at: Utc::now(),
        };

        let id = match self.gateway.insert(record.clone()).await {
            Ok(id) => id,
            Err(e) => {
                self.stats.record_persistence_failure();
                tracing::error!(error = %e, "Failed to store analyzed submission");
                return Err(e);
            }
        };
        self.stats.record_processed();

        let outcome = ProcessOutcome {
            record: record.into_persisted(id),
            fingerprint,
            sentiment_source,
            summary_source,
        };
        tracing::debug!(
            id,
            label = %outcome.record.sentiment.label,
            sentiment_source = ?sentiment_source,
            summary_source = ?summary_source,
            "Stored submission"
        );
        Ok(outcome)
    }

    async fn classify(&self, fingerprint: Fingerprint, text: &str) -> (SentimentArtifact, ArtifactSource) {
        if let Some(hit) = self.sentiment_cache.get(fingerprint) {
            tracing::debug!(%fingerprint, "Sentiment cache hit");
            return (hit, ArtifactSource::Cache);
        }

        let provider = self.sentiment.provider();
        let name = self.sentiment.resolved_name().to_string();
        let input = text.to_string();
        let result = self
            .pool
            .run("sentiment", move || {
                let artifact = provider.classify(&input)?;
                SentimentArtifact::new(artifact.label, artifact.score).map_err(|reason| {
                    EconsultError::from(ProviderError::InvalidResponse {
                        provider: provider.name().to_string(),
                        reason,
                    })
                })
            })
            .await;

        match result {
            Ok(artifact) => (artifact, ArtifactSource::Provider),
            Err(e) => {
                self.note_failure(&e);
                tracing::warn!(provider = %name, error = %e, "Sentiment degraded to neutral default");
                (SentimentArtifact::neutral_default(), ArtifactSource::Default)
            }
        }
    }

    async fn summarize(&self, fingerprint: Fingerprint, text: &str) -> (SummaryArtifact, ArtifactSource) {
        if let Some(hit) = self.summary_cache.get(fingerprint) {
            tracing::debug!(%fingerprint, "Summary cache hit");
            return (hit, ArtifactSource::Cache);
        }

        let provider = self.summary.provider();
        let name = self.summary.resolved_name().to_string();
        let input = text.to_string();
        let result = self
            .pool
            .run("summary", move || {
                let output = provider.summarize(&input)?;
                SummaryArtifact::from_provider_output(&output).map_err(|reason| {
                    EconsultError::from(ProviderError::InvalidResponse {
                        provider: provider.name().to_string(),
                        reason,
                    })
                })
            })
            .await;

        match result {
            Ok(summary) => (summary, ArtifactSource::Provider),
            Err(e) => {
                self.note_failure(&e);
                tracing::warn!(provider = %name, error = %e, "Summary degraded to truncated text");
                (SummaryArtifact::fallback_for(text), ArtifactSource::Default)
            }
        }
    }

    fn note_failure(&self, error: &EconsultError) {
        if matches!(error, EconsultError::Provider(ProviderError::Timeout { .. })) {
            self.stats.record_timeout();
        }
    }

    /// Process pre-parsed `(stakeholder, text)` rows in order.
    ///
    /// Rows with an unknown stakeholder or blank text are skipped and
    /// reported. The first persistence failure aborts the batch; rows stored
    /// before it stay stored.
    pub async fn process_batch<I, S, T>(&self, rows: I) -> EconsultResult<BatchReport>
    where
        I: IntoIterator<Item = (S, T)>,
        S: AsRef<str>,
        T: AsRef<str>,
    {
        let mut report = BatchReport::default();

        for (index, (stakeholder, text)) in rows.into_iter().enumerate() {
            match self.submit(stakeholder.as_ref(), text.as_ref()).await {
                Ok(record) => report.processed.push(record),
                Err(e) if e.is_persistence_failure() => {
                    tracing::error!(index, error = %e, "Batch aborted on storage failure");
                    return Err(e);
                }
                Err(e) => {
                    tracing::debug!(index, error = %e, "Skipping batch row");
                    report.skipped.push(SkippedRow {
                        index,
                        reason: e.to_string(),
                    });
                }
            }
        }

        tracing::info!(
            processed = report.processed.len(),
            skipped = report.skipped.len(),
            "Batch complete"
        );
        Ok(report)
    }

    // ------------------------------------------------------------------------
    // Read side
    // ------------------------------------------------------------------------

    pub async fn get(&self, id: RecordId) -> EconsultResult<Option<PersistedRecord>> {
        self.gateway.get(id).await
    }

    pub async fn list(&self, limit: u32, offset: u32) -> EconsultResult<Vec<PersistedRecord>> {
        self.gateway.list(limit, offset).await
    }

    /// Label percentages over every record plus the most recent few.
    pub async fn dashboard(&self) -> EconsultResult<DashboardStats> {
        let counts = self.gateway.aggregate().await?;
        let recent = self.gateway.list(DASHBOARD_RECENT_LIMIT, 0).await?;
        Ok(DashboardStats::from_counts(counts, recent))
    }

    // ------------------------------------------------------------------------
    // Introspection
    // ------------------------------------------------------------------------

    pub async fn health(&self) -> HealthReport {
        let mut checks = vec![
            chain_check("sentiment_provider", &self.sentiment),
            chain_check("summary_provider", &self.summary),
            cache_check(&self.sentiment_cache),
            cache_check(&self.summary_cache),
        ];

        let store = match self.gateway.count().await {
            Ok(total) => HealthCheck::healthy("store").with_metadata("records", total.into()),
            Err(e) => HealthCheck::unhealthy("store", e.to_string()),
        };
        checks.push(store.with_metadata("backend", self.gateway.backend_name().into()));

        HealthReport::from_checks(checks)
    }

    pub fn stats(&self) -> PipelineStatsSnapshot {
        self.stats.snapshot()
    }

    pub fn pool_stats(&self) -> PoolStatsSnapshot {
        self.pool.stats()
    }

    pub fn config(&self) -> &PipelineConfig {
        &self.config
    }

    pub fn sentiment_chain(&self) -> &SentimentChain {
        &self.sentiment
    }

    pub fn summary_chain(&self) -> &SummaryChain {
        &self.summary
    }

    pub fn sentiment_cache(&self) -> &ResultCache<SentimentArtifact> {
        &self.sentiment_cache
    }

    pub fn summary_cache(&self) -> &ResultCache<SummaryArtifact> {
        &self.summary_cache
    }
}

fn chain_check<P: ?Sized>(component: &str, chain: &ProviderChain<P>) -> HealthCheck {
    let check = if chain.is_fallback() {
        HealthCheck::degraded(
            component,
            format!("running on fallback provider {}", chain.resolved_name()),
        )
    } else {
        HealthCheck::healthy(component)
    };
    check
        .with_metadata("provider", chain.resolved_name().into())
        .with_metadata("tier", chain.tier().as_str().into())
}

fn cache_check<V: Clone>(cache: &ResultCache<V>) -> HealthCheck {
    let stats = cache.stats();
    HealthCheck::healthy(format!("{}_cache", cache.name()))
        .with_metadata("size", stats.entry_count.into())
        .with_metadata("capacity", stats.capacity.into())
        .with_metadata("hit_rate", stats.hit_rate().into())
}

impl std::fmt::Debug for AnalysisService {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AnalysisService")
            .field("sentiment", &self.sentiment)
            .field("summary", &self.summary)
            .field("pool", &self.pool)
            .field("store", &self.gateway.backend_name())
            .finish()
    }
}
