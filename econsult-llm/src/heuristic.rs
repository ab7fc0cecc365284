//! Local analyzers that need no network
//!
//! These are the last links of the default chains, so they must always load.

use crate::{SentimentProvider, SummaryProvider};
use econsult_core::{
    text::{char_len, truncate_chars, ELLIPSIS},
    EconsultResult, ProviderError, SentimentArtifact, SentimentLabel, SUMMARY_MAX_CHARS,
};
use serde::Deserialize;
use std::collections::HashSet;
use std::path::Path;

// ============================================================================
// KEYWORD SCORING
// ============================================================================

const POSITIVE_WORDS: &[&str] = &[
    "excellent",
    "great",
    "good",
    "positive",
    "support",
    "benefit",
    "improve",
    "welcome",
    "appreciate",
    "effective",
    "successful",
    "helpful",
    "valuable",
    "outstanding",
    "wonderful",
    "amazing",
    "fantastic",
    "brilliant",
    "perfect",
    "love",
    "like",
    "enjoy",
];

const NEGATIVE_WORDS: &[&str] = &[
    "terrible",
    "bad",
    "negative",
    "oppose",
    "against",
    "harm",
    "problem",
    "concerned",
    "worried",
    "disappointed",
    "frustrated",
    "angry",
    "upset",
    "awful",
    "horrible",
    "hate",
    "dislike",
    "reject",
    "refuse",
    "fail",
    "failure",
    "wrong",
    "error",
];

const BASE_CONFIDENCE: f64 = 0.7;
const CONFIDENCE_STEP: f64 = 0.1;
const MAX_CONFIDENCE: f64 = 0.95;
const TIE_CONFIDENCE: f64 = 0.6;

fn normalize_token(token: &str) -> String {
    token
        .trim_matches(|c: char| !c.is_alphanumeric())
        .to_lowercase()
}

/// Scores text by counting distinct positive and negative words.
///
/// The side with more hits wins with confidence
/// `min(0.95, 0.7 + 0.1 * difference)`; a tie is neutral at 0.6.
#[derive(Debug, Clone)]
pub struct KeywordScorer {
    positive: HashSet<String>,
    negative: HashSet<String>,
}

impl KeywordScorer {
    /// Build a scorer from two word lists. A word may not appear in both.
    pub fn new<I, J, S, T>(positive: I, negative: J) -> Result<Self, String>
    where
        I: IntoIterator<Item = S>,
        J: IntoIterator<Item = T>,
        S: AsRef<str>,
        T: AsRef<str>,
    {
        let positive: HashSet<String> = positive
            .into_iter()
            .map(|w| normalize_token(w.as_ref()))
            .filter(|w| !w.is_empty())
            .collect();
        let negative: HashSet<String> = negative
            .into_iter()
            .map(|w| normalize_token(w.as_ref()))
            .filter(|w| !w.is_empty())
            .collect();

        let mut overlap: Vec<&String> = positive.intersection(&negative).collect();
        if !overlap.is_empty() {
            overlap.sort();
            return Err(format!("words listed as both positive and negative: {:?}", overlap));
        }

        Ok(Self { positive, negative })
    }

    /// Scorer over the built-in English word lists.
    pub fn builtin() -> Self {
        Self {
            positive: POSITIVE_WORDS.iter().map(|w| w.to_string()).collect(),
            negative: NEGATIVE_WORDS.iter().map(|w| w.to_string()).collect(),
        }
    }

    /// Distinct positive and negative words present in `text`.
    pub fn hits(&self, text: &str) -> (usize, usize) {
        let words: HashSet<String> = text.split_whitespace().map(normalize_token).collect();
        let positive = words.iter().filter(|w| self.positive.contains(*w)).count();
        let negative = words.iter().filter(|w| self.negative.contains(*w)).count();
        (positive, negative)
    }

    pub fn score(&self, text: &str) -> SentimentArtifact {
        let (positive, negative) = self.hits(text);
        let (label, diff) = match positive.cmp(&negative) {
            std::cmp::Ordering::Greater => (SentimentLabel::Positive, positive - negative),
            std::cmp::Ordering::Less => (SentimentLabel::Negative, negative - positive),
            std::cmp::Ordering::Equal => {
                return SentimentArtifact {
                    label: SentimentLabel::Neutral,
                    score: TIE_CONFIDENCE,
                }
            }
        };
        SentimentArtifact {
            label,
            score: (BASE_CONFIDENCE + CONFIDENCE_STEP * diff as f64).min(MAX_CONFIDENCE),
        }
    }

    pub fn vocabulary_size(&self) -> (usize, usize) {
        (self.positive.len(), self.negative.len())
    }
}

// ============================================================================
// SENTIMENT CLASSIFIERS
// ============================================================================

/// Built-in keyword classifier. Always loads.
#[derive(Debug, Clone)]
pub struct HeuristicKeywordClassifier {
    scorer: KeywordScorer,
}

impl HeuristicKeywordClassifier {
    pub fn new() -> Self {
        Self {
            scorer: KeywordScorer::builtin(),
        }
    }
}

impl Default for HeuristicKeywordClassifier {
    fn default() -> Self {
        Self::new()
    }
}

impl SentimentProvider for HeuristicKeywordClassifier {
    fn name(&self) -> &str {
        "keyword-heuristic"
    }

    fn classify(&self, text: &str) -> EconsultResult<SentimentArtifact> {
        Ok(self.scorer.score(text))
    }
}

#[derive(Debug, Deserialize)]
struct LexiconFile {
    positive: Vec<String>,
    negative: Vec<String>,
}

/// Keyword classifier over word lists loaded from a JSON file:
///
/// ```json
/// { "positive": ["support", "..."], "negative": ["oppose", "..."] }
/// ```
#[derive(Debug, Clone)]
pub struct LexiconClassifier {
    scorer: KeywordScorer,
}

impl LexiconClassifier {
    pub const NAME: &'static str = "lexicon";

    /// Load the lexicon. Fails when the file is unreadable, malformed,
    /// empty, or lists a word on both sides.
    pub fn load(path: &Path) -> EconsultResult<Self> {
        let failed = |reason: String| ProviderError::ConstructionFailed {
            provider: Self::NAME.to_string(),
            reason,
        };

        let raw = std::fs::read_to_string(path)
            .map_err(|e| failed(format!("cannot read {}: {}", path.display(), e)))?;
        let file: LexiconFile = serde_json::from_str(&raw)
            .map_err(|e| failed(format!("cannot parse {}: {}", path.display(), e)))?;
        let scorer = KeywordScorer::new(file.positive, file.negative).map_err(failed)?;

        let (positive, negative) = scorer.vocabulary_size();
        if positive == 0 || negative == 0 {
            return Err(failed("lexicon needs at least one positive and one negative word".to_string()).into());
        }

        Ok(Self { scorer })
    }

    pub fn from_scorer(scorer: KeywordScorer) -> Self {
        Self { scorer }
    }
}

impl SentimentProvider for LexiconClassifier {
    fn name(&self) -> &str {
        Self::NAME
    }

    fn classify(&self, text: &str) -> EconsultResult<SentimentArtifact> {
        Ok(self.scorer.score(text))
    }
}

// ============================================================================
// SUMMARIZER
// ============================================================================

/// Output for empty input.
pub const EMPTY_SUMMARY: &str = "No content";

/// Summarizer that keeps the first sentence, shortened to fit.
///
/// Text already within [`SUMMARY_MAX_CHARS`] is returned as-is. Otherwise
/// the first sentence (ended by `.`, `!` or `?` not followed by a digit) is
/// kept, and anything longer than the limit minus the ellipsis is cut and
/// suffixed with `...`.
#[derive(Debug, Clone, Default)]
pub struct TruncationSummarizer;

impl TruncationSummarizer {
    pub fn new() -> Self {
        Self
    }

    fn first_sentence(text: &str) -> &str {
        let mut start = 0;
        let mut chars = text.char_indices().peekable();
        while let Some((i, c)) = chars.next() {
            // A digit after the mark keeps decimals such as 3.5 whole.
            let at_boundary = matches!(c, '.' | '!' | '?')
                && chars.peek().is_some_and(|(_, next)| !next.is_ascii_digit());
            if !at_boundary {
                continue;
            }
            let sentence = text[start..i].trim();
            if !sentence.is_empty() {
                return sentence;
            }
            start = i + c.len_utf8();
        }
        text[start..].trim()
    }
}

impl SummaryProvider for TruncationSummarizer {
    fn name(&self) -> &str {
        "truncation"
    }

    fn summarize(&self, text: &str) -> EconsultResult<String> {
        let text = text.trim();
        if text.is_empty() {
            return Ok(EMPTY_SUMMARY.to_string());
        }
        if char_len(text) <= SUMMARY_MAX_CHARS {
            return Ok(text.to_string());
        }

        let keep = SUMMARY_MAX_CHARS - char_len(ELLIPSIS);
        let sentence = Self::first_sentence(text);
        if char_len(sentence) > keep {
            Ok(format!("{}{}", truncate_chars(sentence, keep).trim_end(), ELLIPSIS))
        } else {
            Ok(sentence.to_string())
        }
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
    use proptest::prelude::*;

    proptest! {
        #![proptest_config(ProptestConfig::with_cases(200))]

        /// Property: the truncation summarizer never exceeds the summary limit.
        #[test]
        fn prop_truncation_summary_bounded(text in "\\PC{0,400}") {
            let summary = TruncationSummarizer::new().summarize(&text).unwrap();
            prop_assert!(char_len(&summary) <= SUMMARY_MAX_CHARS);
        }

        /// Property: keyword scores always lie in [0.6, 0.95].
        #[test]
        fn prop_keyword_score_in_range(words in proptest::collection::vec("[a-z]{1,10}", 0..40)) {
            let artifact = KeywordScorer::builtin().score(&words.join(" "));
            prop_assert!(artifact.score >= TIE_CONFIDENCE);
            prop_assert!(artifact.score <= MAX_CONFIDENCE);
        }
    }
}
