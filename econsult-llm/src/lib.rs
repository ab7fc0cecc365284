//! eConsult LLM - Analyzer Provider Layer
//!
//! Provider-agnostic traits for sentiment classification and summarization,
//! plus the startup resolution chains that pick one implementation of each.
//! Chains are resolved once; after that the orchestrator only ever talks to
//! the resolved provider.

use econsult_core::{EconsultResult, ProviderError, SentimentArtifact};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

pub mod defaults;
pub mod heuristic;
pub mod providers;

pub use defaults::{default_sentiment_candidates, default_summary_candidates, resolve_default_chains};
pub use heuristic::{
    HeuristicKeywordClassifier, KeywordScorer, LexiconClassifier, TruncationSummarizer,
};

// ============================================================================
// ANALYZER TRAITS
// ============================================================================

/// Trait for sentiment classifiers.
/// Implementations must be thread-safe (Send + Sync); calls are blocking and
/// run on the orchestrator's worker pool.
///
/// # Example
/// ```ignore
/// struct RemoteClassifier { /* ... */ }
///
/// impl SentimentProvider for RemoteClassifier {
///     fn name(&self) -> &str { "remote" }
///     fn classify(&self, text: &str) -> EconsultResult<SentimentArtifact> {
///         // Call the model
///     }
/// }
/// ```
pub trait SentimentProvider: Send + Sync {
    /// Identifier used in logs and health reports.
    fn name(&self) -> &str;

    /// Classify one text.
    ///
    /// # Returns
    /// * `Ok(SentimentArtifact)` - Label and confidence
    /// * `Err(EconsultError::Provider)` - If classification fails
    fn classify(&self, text: &str) -> EconsultResult<SentimentArtifact>;
}

/// Trait for summarizers.
/// Implementations must be thread-safe (Send + Sync).
pub trait SummaryProvider: Send + Sync {
    /// Identifier used in logs and health reports.
    fn name(&self) -> &str;

    /// Produce a short summary of one text. Raw model output; the
    /// orchestrator normalizes and bounds it.
    fn summarize(&self, text: &str) -> EconsultResult<String>;
}

// ============================================================================
// PROVIDER CHAIN
// ============================================================================

/// Where a candidate sits in its chain.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ProviderTier {
    /// Model-backed remote provider
    Primary,
    /// Cheaper local alternative
    Secondary,
    /// Built-in heuristic that always loads
    Fallback,
}

impl ProviderTier {
    pub fn as_str(&self) -> &'static str {
        match self {
            ProviderTier::Primary => "primary",
            ProviderTier::Secondary => "secondary",
            ProviderTier::Fallback => "fallback",
        }
    }
}

impl std::fmt::Display for ProviderTier {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

type Loader<P> = Box<dyn FnOnce() -> EconsultResult<Arc<P>>>;

/// One entry of a resolution chain: a name, a tier and a deferred loader.
pub struct ProviderCandidate<P: ?Sized> {
    name: String,
    tier: ProviderTier,
    loader: Loader<P>,
}

impl<P: ?Sized + 'static> ProviderCandidate<P> {
    /// Candidate whose construction is attempted during resolution.
    pub fn new(
        name: impl Into<String>,
        tier: ProviderTier,
        loader: impl FnOnce() -> EconsultResult<Arc<P>> + 'static,
    ) -> Self {
        Self {
            name: name.into(),
            tier,
            loader: Box::new(loader),
        }
    }

    /// Candidate that is already constructed.
    pub fn ready(name: impl Into<String>, tier: ProviderTier, provider: Arc<P>) -> Self {
        Self::new(name, tier, move || Ok(provider))
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn tier(&self) -> ProviderTier {
        self.tier
    }
}

impl<P: ?Sized> std::fmt::Debug for ProviderCandidate<P> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ProviderCandidate")
            .field("name", &self.name)
            .field("tier", &self.tier)
            .finish()
    }
}

/// A candidate that failed to load during resolution.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RejectedCandidate {
    pub name: String,
    pub tier: ProviderTier,
    pub reason: String,
}

/// The provider chosen for one analyzer kind.
///
/// Construction tries each candidate in order and keeps the first that loads.
/// Nothing is re-resolved afterwards, so per-call failures never demote the
/// chain; they are handled at the invocation site instead.
pub struct ProviderChain<P: ?Sized> {
    chain: String,
    provider: Arc<P>,
    resolved_name: String,
    tier: ProviderTier,
    rejected: Vec<RejectedCandidate>,
}

/// Chain resolved for sentiment classification.
pub type SentimentChain = ProviderChain<dyn SentimentProvider>;

/// Chain resolved for summarization.
pub type SummaryChain = ProviderChain<dyn SummaryProvider>;

impl<P: ?Sized> ProviderChain<P> {
    /// Resolve a chain from its ordered candidates.
    ///
    /// # Errors
    /// `ProviderError::ResolutionFailed` listing every attempt when no
    /// candidate loads (including an empty candidate list).
    pub fn resolve(
        chain: impl Into<String>,
        candidates: Vec<ProviderCandidate<P>>,
    ) -> EconsultResult<Self> {
        let chain = chain.into();
        let mut rejected = Vec::new();

        for candidate in candidates {
            let ProviderCandidate { name, tier, loader } = candidate;
            match loader() {
                Ok(provider) => {
                    if rejected.is_empty() {
                        tracing::info!(chain = %chain, provider = %name, tier = %tier, "Resolved analyzer provider");
                    } else {
                        tracing::warn!(
                            chain = %chain,
                            provider = %name,
                            tier = %tier,
                            skipped = rejected.len(),
                            "Resolved analyzer provider after falling through"
                        );
                    }
                    return Ok(Self {
                        chain,
                        provider,
                        resolved_name: name,
                        tier,
                        rejected,
                    });
                }
                Err(e) => {
                    tracing::warn!(chain = %chain, provider = %name, error = %e, "Analyzer candidate failed to load");
                    rejected.push(RejectedCandidate {
                        name,
                        tier,
                        reason: e.to_string(),
                    });
                }
            }
        }

        let attempts = if rejected.is_empty() {
            vec!["no candidates".to_string()]
        } else {
            rejected
                .iter()
                .map(|r| format!("{}: {}", r.name, r.reason))
                .collect()
        };
        tracing::error!(chain = %chain, "No analyzer provider could be loaded");
        Err(ProviderError::ResolutionFailed { chain, attempts }.into())
    }

    /// Shared handle to the resolved provider.
    pub fn provider(&self) -> Arc<P> {
        Arc::clone(&self.provider)
    }

    pub fn chain_name(&self) -> &str {
        &self.chain
    }

    pub fn resolved_name(&self) -> &str {
        &self.resolved_name
    }

    pub fn tier(&self) -> ProviderTier {
        self.tier
    }

    /// Candidates tried and rejected before the resolved one.
    pub fn rejected(&self) -> &[RejectedCandidate] {
        &self.rejected
    }

    /// True when the chain landed on its built-in heuristic.
    pub fn is_fallback(&self) -> bool {
        self.tier == ProviderTier::Fallback
    }
}

impl<P: ?Sized> std::fmt::Debug for ProviderChain<P> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ProviderChain")
            .field("chain", &self.chain)
            .field("resolved", &self.resolved_name)
            .field("tier", &self.tier)
            .field("rejected", &self.rejected.len())
            .finish()
    }
}

// ============================================================================
// UNIT TESTS
// ============================================================================


// ============================================================================
// PROPERTY-BASED TESTS
// ============================================================================

#[cfg(test)]
mod prop_tests {
    use super::*;
    use econsult_core::ProviderError;
    use proptest::prelude::*;

    fn failing(name: String) -> ProviderCandidate<dyn SummaryProvider> {
        let provider = name.clone();
        ProviderCandidate::new(name, ProviderTier::Primary, move || {
            Err(ProviderError::ConstructionFailed {
                provider,
                reason: "unavailable".to_string(),
            }
            .into())
        })
    }

    proptest! {
        #![proptest_config(ProptestConfig::with_cases(64))]

        /// Property: a chain with N failing candidates ahead of a loadable one
        /// resolves to the loadable one and records exactly N rejections.
        #[test]
        fn prop_resolution_skips_failing_prefix(failures in 0usize..6) {
            let mut candidates: Vec<_> =
                (0..failures).map(|i| failing(format!("remote-{i}"))).collect();
            candidates.push(ProviderCandidate::ready(
                "truncation",
                ProviderTier::Fallback,
                Arc::new(TruncationSummarizer::new()) as Arc<dyn SummaryProvider>,
            ));

            let chain = SummaryChain::resolve("summary", candidates).unwrap();
            prop_assert_eq!(chain.resolved_name(), "truncation");
            prop_assert_eq!(chain.rejected().len(), failures);
        }
    }
}
