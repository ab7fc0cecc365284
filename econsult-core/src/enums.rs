//! Enum types for submissions and sentiment artifacts

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

// ============================================================================
// STAKEHOLDER TYPE
// ============================================================================

/// Who submitted a comment.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StakeholderType {
    Citizen,
    Business,
    Ngo,
    Academic,
}

impl StakeholderType {
    /// All stakeholder types, in declaration order.
    pub const ALL: [StakeholderType; 4] = [
        StakeholderType::Citizen,
        StakeholderType::Business,
        StakeholderType::Ngo,
        StakeholderType::Academic,
    ];

    /// Convert to database string representation.
    pub fn as_db_str(&self) -> &'static str {
        match self {
            StakeholderType::Citizen => "citizen",
            StakeholderType::Business => "business",
            StakeholderType::Ngo => "ngo",
            StakeholderType::Academic => "academic",
        }
    }

    /// Parse from database string representation.
    /// Accepts surrounding whitespace and any letter case.
    pub fn from_db_str(s: &str) -> Result<Self, StakeholderTypeParseError> {
        match s.trim().to_lowercase().as_str() {
            "citizen" => Ok(StakeholderType::Citizen),
            "business" => Ok(StakeholderType::Business),
            "ngo" => Ok(StakeholderType::Ngo),
            "academic" => Ok(StakeholderType::Academic),
            _ => Err(StakeholderTypeParseError(s.to_string())),
        }
    }
}

impl fmt::Display for StakeholderType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_db_str())
    }
}

impl FromStr for StakeholderType {
    type Err = StakeholderTypeParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::from_db_str(s)
    }
}

/// Error when parsing an invalid stakeholder type string.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StakeholderTypeParseError(pub String);

impl fmt::Display for StakeholderTypeParseError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Invalid stakeholder type: {}", self.0)
    }
}

impl std::error::Error for StakeholderTypeParseError {}

// ============================================================================
// SENTIMENT LABEL
// ============================================================================

/// Sentiment classification label.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SentimentLabel {
    Positive,
    Neutral,
    Negative,
}

impl SentimentLabel {
    /// All labels, in declaration order.
    pub const ALL: [SentimentLabel; 3] = [
        SentimentLabel::Positive,
        SentimentLabel::Neutral,
        SentimentLabel::Negative,
    ];

    /// Convert to database string representation.
    pub fn as_db_str(&self) -> &'static str {
        match self {
            SentimentLabel::Positive => "positive",
            SentimentLabel::Neutral => "neutral",
            SentimentLabel::Negative => "negative",
        }
    }

    /// Parse from database string representation.
    pub fn from_db_str(s: &str) -> Result<Self, SentimentLabelParseError> {
        match s.trim().to_lowercase().as_str() {
            "positive" => Ok(SentimentLabel::Positive),
            "neutral" => Ok(SentimentLabel::Neutral),
            "negative" => Ok(SentimentLabel::Negative),
            _ => Err(SentimentLabelParseError(s.to_string())),
        }
    }

    /// Map a raw label emitted by a classification model.
    ///
    /// Three-class models commonly report `LABEL_0..LABEL_2` in
    /// negative/neutral/positive order; others report the label names in
    /// upper case.
    pub fn from_model_label(raw: &str) -> Result<Self, SentimentLabelParseError> {
        match raw.trim().to_uppercase().as_str() {
            "LABEL_0" => Ok(SentimentLabel::Negative),
            "LABEL_1" => Ok(SentimentLabel::Neutral),
            "LABEL_2" => Ok(SentimentLabel::Positive),
            _ => Self::from_db_str(raw),
        }
    }
}

impl fmt::Display for SentimentLabel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_db_str())
    }
}

impl FromStr for SentimentLabel {
    type Err = SentimentLabelParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::from_db_str(s)
    }
}

/// Error when parsing an invalid sentiment label string.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SentimentLabelParseError(pub String);

impl fmt::Display for SentimentLabelParseError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Invalid sentiment label: {}", self.0)
    }
}

impl std::error::Error for SentimentLabelParseError {}

// =============================================================================
// TESTS
// =============================================================================
