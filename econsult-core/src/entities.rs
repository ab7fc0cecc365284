//! Submission, artifact and record types

use crate::text::{
    char_len, ellipsize, single_line, truncate_chars, RAW_TEXT_MAX_CHARS, SUMMARY_MAX_CHARS,
};
use crate::{
    new_submission_id, EconsultResult, RecordId, SentimentLabel, StakeholderType, SubmissionId,
    Timestamp, ValidationError,
};
use chrono::Utc;
use serde::{Deserialize, Serialize};

// ============================================================================
// SUBMISSION
// ============================================================================

/// An inbound comment. Request-scoped, never persisted directly.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Submission {
    /// Correlation id for logs
    pub submission_id: SubmissionId,
    pub stakeholder_type: StakeholderType,
    /// At most [`RAW_TEXT_MAX_CHARS`] characters, never blank
    pub raw_text: String,
    pub submitted_at: Timestamp,
}

impl Submission {
    /// Build a submission, truncating the text to [`RAW_TEXT_MAX_CHARS`].
    ///
    /// Blank text is rejected with `ValidationError::RequiredFieldMissing`.
    pub fn new(stakeholder_type: StakeholderType, raw_text: &str) -> EconsultResult<Self> {
        let raw_text = truncate_chars(raw_text, RAW_TEXT_MAX_CHARS);
        if raw_text.trim().is_empty() {
            return Err(ValidationError::RequiredFieldMissing {
                field: "raw_text".to_string(),
            }
            .into());
        }
        Ok(Self {
            submission_id: new_submission_id(),
            stakeholder_type,
            raw_text: raw_text.to_string(),
            submitted_at: Utc::now(),
        })
    }

    /// Parse the stakeholder string, then build as [`Submission::new`].
    pub fn parse(stakeholder_type: &str, raw_text: &str) -> EconsultResult<Self> {
        let stakeholder = stakeholder_type.parse::<StakeholderType>().map_err(|e| {
            ValidationError::InvalidValue {
                field: "stakeholder_type".to_string(),
                value: e.0,
                reason: "expected one of citizen, business, ngo, academic".to_string(),
            }
        })?;
        Self::new(stakeholder, raw_text)
    }
}

// ============================================================================
// ARTIFACTS
// ============================================================================

/// Sentiment classification result.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SentimentArtifact {
    pub label: SentimentLabel,
    /// Confidence in [0.0, 1.0]
    pub score: f64,
}

impl SentimentArtifact {
    /// Score used when no classifier result is available.
    pub const DEFAULT_SCORE: f64 = 0.5;

    /// Create an artifact, rejecting scores outside [0.0, 1.0] (including NaN).
    pub fn new(label: SentimentLabel, score: f64) -> Result<Self, String> {
        if !(0.0..=1.0).contains(&score) {
            return Err(format!("score {} outside [0, 1]", score));
        }
        Ok(Self { label, score })
    }

    /// The degraded result: neutral at 0.5.
    pub fn neutral_default() -> Self {
        Self {
            label: SentimentLabel::Neutral,
            score: Self::DEFAULT_SCORE,
        }
    }

    /// Clamp the score into [0.0, 1.0]; NaN becomes the default score.
    pub fn clamped(self) -> Self {
        let score = if self.score.is_nan() {
            Self::DEFAULT_SCORE
        } else {
            self.score.clamp(0.0, 1.0)
        };
        Self {
            label: self.label,
            score,
        }
    }
}

/// Bounded-length summary.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SummaryArtifact {
    text: String,
}

impl SummaryArtifact {
    /// Wrap text, shortening it to [`SUMMARY_MAX_CHARS`] with an ellipsis.
    pub fn new(text: &str) -> Self {
        Self {
            text: ellipsize(text, SUMMARY_MAX_CHARS),
        }
    }

    /// Normalize model output: one line, trimmed, bounded.
    /// Empty output is rejected so the caller can substitute a default.
    pub fn from_provider_output(output: &str) -> Result<Self, String> {
        let line = single_line(output);
        if line.is_empty() {
            return Err("empty summary".to_string());
        }
        Ok(Self::new(&line))
    }

    /// The degraded result: the submission text itself, shortened if needed.
    pub fn fallback_for(raw_text: &str) -> Self {
        Self::new(raw_text.trim())
    }

    pub fn text(&self) -> &str {
        &self.text
    }

    pub fn into_text(self) -> String {
        self.text
    }

    pub fn char_len(&self) -> usize {
        char_len(&self.text)
    }
}

// ============================================================================
// RECORDS
// ============================================================================

/// A merged record ready for the persistence gateway.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NewRecord {
    pub stakeholder_type: StakeholderType,
    pub raw_text: String,
    pub sentiment: SentimentArtifact,
    pub summary: SummaryArtifact,
    pub created_at: Timestamp,
}

impl NewRecord {
    /// Attach the id assigned by the gateway.
    pub fn into_persisted(self, id: RecordId) -> PersistedRecord {
        PersistedRecord {
            id,
            stakeholder_type: self.stakeholder_type,
            raw_text: self.raw_text,
            sentiment: self.sentiment,
            summary: self.summary,
            created_at: self.created_at,
        }
    }
}

/// A stored submission. Immutable once the gateway assigns its id.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PersistedRecord {
    pub id: RecordId,
    pub stakeholder_type: StakeholderType,
    pub raw_text: String,
    pub sentiment: SentimentArtifact,
    pub summary: SummaryArtifact,
    pub created_at: Timestamp,
}

// ============================================================================
// AGGREGATES
// ============================================================================

/// Per-label record counts.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct LabelCounts {
    pub positive: u64,
    pub neutral: u64,
    pub negative: u64,
}

impl LabelCounts {
    pub fn get(&self, label: SentimentLabel) -> u64 {
        match label {
            SentimentLabel::Positive => self.positive,
            SentimentLabel::Neutral => self.neutral,
            SentimentLabel::Negative => self.negative,
        }
    }

    pub fn add(&mut self, label: SentimentLabel, count: u64) {
        match label {
            SentimentLabel::Positive => self.positive += count,
            SentimentLabel::Neutral => self.neutral += count,
            SentimentLabel::Negative => self.negative += count,
        }
    }

    pub fn total(&self) -> u64 {
        self.positive + self.neutral + self.negative
    }

    /// Share of `label` as a percentage rounded to two decimals; 0 when empty.
    pub fn percentage(&self, label: SentimentLabel) -> f64 {
        let total = self.total();
        if total == 0 {
            return 0.0;
        }
        let pct = self.get(label) as f64 / total as f64 * 100.0;
        (pct * 100.0).round() / 100.0
    }
}

/// Dashboard summary of everything recorded so far.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DashboardStats {
    pub total_comments: u64,
    pub positive_percentage: f64,
    pub neutral_percentage: f64,
    pub negative_percentage: f64,
    pub recent_comments: Vec<PersistedRecord>,
}

impl DashboardStats {
    pub fn from_counts(counts: LabelCounts, recent_comments: Vec<PersistedRecord>) -> Self {
        Self {
            total_comments: counts.total(),
            positive_percentage: counts.percentage(SentimentLabel::Positive),
            neutral_percentage: counts.percentage(SentimentLabel::Neutral),
            negative_percentage: counts.percentage(SentimentLabel::Negative),
            recent_comments,
        }
    }
}

// =============================================================================
// TESTS
// =============================================================================
