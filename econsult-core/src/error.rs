//! Error types for pipeline operations

use crate::RecordId;
use thiserror::Error;

/// Analyzer provider errors.
///
/// Everything except `ResolutionFailed` is absorbed by the orchestrator and
/// replaced with a default artifact.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ProviderError {
    #[error("Provider {provider} is not configured: {reason}")]
    NotConfigured { provider: String, reason: String },

    #[error("Provider {provider} failed to load: {reason}")]
    ConstructionFailed { provider: String, reason: String },

    #[error("No provider in the {chain} chain could be loaded: {}", attempts.join("; "))]
    ResolutionFailed { chain: String, attempts: Vec<String> },

    #[error("Request to {provider} failed with status {status}: {message}")]
    RequestFailed {
        provider: String,
        status: i32,
        message: String,
    },

    #[error("Invalid response from {provider}: {reason}")]
    InvalidResponse { provider: String, reason: String },

    #[error("Task {task} timed out after {timeout_ms}ms")]
    Timeout { task: String, timeout_ms: u64 },

    #[error("Task {task} did not complete: {reason}")]
    TaskFailed { task: String, reason: String },
}

/// Persistence errors. The only failure class allowed to reach the caller of
/// a submission.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum StorageError {
    #[error("Record not found: {id}")]
    NotFound { id: RecordId },

    #[error("Insert failed: {reason}")]
    InsertFailed { reason: String },

    #[error("Query failed: {reason}")]
    QueryFailed { reason: String },

    #[error("Stored row {id} could not be decoded: {reason}")]
    Corrupt { id: RecordId, reason: String },

    #[error("Storage lock poisoned")]
    LockPoisoned,
}

/// Validation errors for inbound submissions.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ValidationError {
    #[error("Required field missing: {field}")]
    RequiredFieldMissing { field: String },

    #[error("Invalid value for {field}: {value} - {reason}")]
    InvalidValue {
        field: String,
        value: String,
        reason: String,
    },
}

/// Configuration errors.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("Invalid value for {field}: {value} - {reason}")]
    InvalidValue {
        field: String,
        value: String,
        reason: String,
    },
}

/// Master error type for all pipeline errors.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum EconsultError {
    #[error("Provider error: {0}")]
    Provider(#[from] ProviderError),

    #[error("Storage error: {0}")]
    Storage(#[from] StorageError),

    #[error("Validation error: {0}")]
    Validation(#[from] ValidationError),

    #[error("Config error: {0}")]
    Config(#[from] ConfigError),
}

impl EconsultError {
    /// True when the submission was not recorded at all.
    pub fn is_persistence_failure(&self) -> bool {
        matches!(self, EconsultError::Storage(_))
    }
}

/// Result type alias for pipeline operations.
pub type EconsultResult<T> = Result<T, EconsultError>;

// =============================================================================
// TESTS
// =============================================================================
