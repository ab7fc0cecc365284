//! eConsultation Core - Data Types
//!
//! Pure data structures shared by every other crate: submissions, analysis
//! artifacts, persisted records, text limits, errors and configuration.
//! This crate performs no I/O.

pub mod config;
pub mod entities;
pub mod enums;
pub mod error;
pub mod health;
pub mod identity;
pub mod text;

pub use config::{PipelineConfig, ProvidersConfig, StorageConfig};
pub use entities::{
    DashboardStats, LabelCounts, NewRecord, PersistedRecord, SentimentArtifact, Submission,
    SummaryArtifact,
};
pub use enums::{
    SentimentLabel, SentimentLabelParseError, StakeholderType, StakeholderTypeParseError,
};
pub use error::{
    ConfigError, EconsultError, EconsultResult, ProviderError, StorageError, ValidationError,
};
pub use health::{HealthCheck, HealthReport, HealthStatus};
pub use identity::{new_submission_id, Fingerprint, RecordId, SubmissionId, Timestamp};
pub use text::{RAW_TEXT_MAX_CHARS, SUMMARY_MAX_CHARS};
