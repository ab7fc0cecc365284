//! Default resolution chains
//!
//! Sentiment: Hugging Face model, then a JSON lexicon, then built-in keywords.
//! Summary: Hugging Face model, then OpenAI, then first-sentence truncation.

use crate::heuristic::{HeuristicKeywordClassifier, LexiconClassifier, TruncationSummarizer};
use crate::providers::{
    not_configured, HuggingFaceClassifier, HuggingFaceSummarizer, OpenAISummarizer,
};
use crate::{
    ProviderCandidate, ProviderTier, SentimentChain, SentimentProvider, SummaryChain,
    SummaryProvider,
};
use econsult_core::{EconsultResult, ProvidersConfig};
use std::sync::Arc;

pub fn default_sentiment_candidates(
    config: &ProvidersConfig,
) -> Vec<ProviderCandidate<dyn SentimentProvider>> {
    let remote = config.clone();
    let lexicon_path = config.lexicon_path.clone();

    vec![
        ProviderCandidate::new(HuggingFaceClassifier::NAME, ProviderTier::Primary, move || {
            let provider = HuggingFaceClassifier::from_config(&remote)?;
            Ok(Arc::new(provider) as Arc<dyn SentimentProvider>)
        }),
        ProviderCandidate::new(LexiconClassifier::NAME, ProviderTier::Secondary, move || {
            let path = lexicon_path.ok_or_else(|| {
                not_configured(LexiconClassifier::NAME, "ECONSULT_LEXICON_PATH is not set")
            })?;
            let provider = LexiconClassifier::load(&path)?;
            Ok(Arc::new(provider) as Arc<dyn SentimentProvider>)
        }),
        ProviderCandidate::ready(
            "keyword-heuristic",
            ProviderTier::Fallback,
            Arc::new(HeuristicKeywordClassifier::new()) as Arc<dyn SentimentProvider>,
        ),
    ]
}

pub fn default_summary_candidates(
    config: &ProvidersConfig,
) -> Vec<ProviderCandidate<dyn SummaryProvider>> {
    let huggingface = config.clone();
    let openai = config.clone();

    vec![
        ProviderCandidate::new(HuggingFaceSummarizer::NAME, ProviderTier::Primary, move || {
            let provider = HuggingFaceSummarizer::from_config(&huggingface)?;
            Ok(Arc::new(provider) as Arc<dyn SummaryProvider>)
        }),
        ProviderCandidate::new(OpenAISummarizer::NAME, ProviderTier::Secondary, move || {
            let provider = OpenAISummarizer::from_config(&openai)?;
            Ok(Arc::new(provider) as Arc<dyn SummaryProvider>)
        }),
        ProviderCandidate::ready(
            "truncation",
            ProviderTier::Fallback,
            Arc::new(TruncationSummarizer::new()) as Arc<dyn SummaryProvider>,
        ),
    ]
}

/// Resolve both default chains. Called once at startup.
pub fn resolve_default_chains(
    config: &ProvidersConfig,
) -> EconsultResult<(SentimentChain, SummaryChain)> {
    config.validate()?;
    let sentiment = SentimentChain::resolve("sentiment", default_sentiment_candidates(config))?;
    let summary = SummaryChain::resolve("summary", default_summary_candidates(config))?;
    Ok((sentiment, summary))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_unconfigured_chains_fall_back_to_heuristics() {
        let (sentiment, summary) = resolve_default_chains(&ProvidersConfig::default()).unwrap();

        assert_eq!(sentiment.resolved_name(), "keyword-heuristic");
        assert!(sentiment.is_fallback());
        assert_eq!(sentiment.rejected().len(), 2);

        assert_eq!(summary.resolved_name(), "truncation");
        assert!(summary.is_fallback());
        assert_eq!(summary.rejected().len(), 2);
    }

    #[test]
    fn test_lexicon_path_selects_secondary_tier() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, r#"{{"positive": ["yes"], "negative": ["no"]}}"#).unwrap();

        let config = ProvidersConfig {
            lexicon_path: Some(file.path().to_path_buf()),
            ..ProvidersConfig::default()
        };
        let (sentiment, _) = resolve_default_chains(&config).unwrap();
        assert_eq!(sentiment.resolved_name(), LexiconClassifier::NAME);
        assert_eq!(sentiment.tier(), ProviderTier::Secondary);
    }

    #[test]
    fn test_invalid_config_is_rejected() {
        let config = ProvidersConfig {
            request_timeout: std::time::Duration::ZERO,
            ..ProvidersConfig::default()
        };
        assert!(resolve_default_chains(&config).is_err());
    }
}
