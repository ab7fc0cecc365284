//! Pipeline counters

use serde::Serialize;
use std::sync::atomic::{AtomicU64, Ordering};

/// Where an artifact in a processed record came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ArtifactSource {
    /// Served from the result cache
    Cache,
    /// Computed by the resolved provider
    Provider,
    /// Provider failed or timed out; the deterministic default was used
    Default,
    /// Summary skipped for short text; the text itself was used
    ShortText,
}

impl ArtifactSource {
    pub fn is_degraded(&self) -> bool {
        matches!(self, ArtifactSource::Default)
    }
}

#[derive(Debug, Default)]
pub struct PipelineStats {
    processed: AtomicU64,
    sentiment_hits: AtomicU64,
    sentiment_misses: AtomicU64,
    summary_hits: AtomicU64,
    summary_misses: AtomicU64,
    degraded_sentiment: AtomicU64,
    degraded_summary: AtomicU64,
    timeouts: AtomicU64,
    short_text_bypasses: AtomicU64,
    persistence_failures: AtomicU64,
}

/// Point-in-time copy of [`PipelineStats`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct PipelineStatsSnapshot {
    pub processed: u64,
    pub sentiment_hits: u64,
    pub sentiment_misses: u64,
    pub summary_hits: u64,
    pub summary_misses: u64,
    pub degraded_sentiment: u64,
    pub degraded_summary: u64,
    pub timeouts: u64,
    pub short_text_bypasses: u64,
    pub persistence_failures: u64,
}

fn bump(counter: &AtomicU64) {
    counter.fetch_add(1, Ordering::Relaxed);
}

impl PipelineStats {
    pub(crate) fn record_sentiment(&self, source: ArtifactSource) {
        match source {
            ArtifactSource::Cache => bump(&self.sentiment_hits),
            ArtifactSource::Provider => bump(&self.sentiment_misses),
            ArtifactSource::Default => {
                bump(&self.sentiment_misses);
                bump(&self.degraded_sentiment);
            }
            ArtifactSource::ShortText => {}
        }
    }

    pub(crate) fn record_summary(&self, source: ArtifactSource) {
        match source {
            ArtifactSource::Cache => bump(&self.summary_hits),
            ArtifactSource::Provider => bump(&self.summary_misses),
            ArtifactSource::Default => {
                bump(&self.summary_misses);
                bump(&self.degraded_summary);
            }
            ArtifactSource::ShortText => bump(&self.short_text_bypasses),
        }
    }

    pub(crate) fn record_timeout(&self) {
        bump(&self.timeouts);
    }

    pub(crate) fn record_processed(&self) {
        bump(&self.processed);
    }

    pub(crate) fn record_persistence_failure(&self) {
        bump(&self.persistence_failures);
    }

    pub fn snapshot(&self) -> PipelineStatsSnapshot {
        PipelineStatsSnapshot {
            processed: self.processed.load(Ordering::Relaxed),
            sentiment_hits: self.sentiment_hits.load(Ordering::Relaxed),
            sentiment_misses: self.sentiment_misses.load(Ordering::Relaxed),
            summary_hits: self.summary_hits.load(Ordering::Relaxed),
            summary_misses: self.summary_misses.load(Ordering::Relaxed),
            degraded_sentiment: self.degraded_sentiment.load(Ordering::Relaxed),
            degraded_summary: self.degraded_summary.load(Ordering::Relaxed),
            timeouts: self.timeouts.load(Ordering::Relaxed),
            short_text_bypasses: self.short_text_bypasses.load(Ordering::Relaxed),
            persistence_failures: self.persistence_failures.load(Ordering::Relaxed),
        }
    }
}
