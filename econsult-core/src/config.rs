//! Configuration types

use crate::*;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;

fn env_or<T: std::str::FromStr>(key: &str, default: T) -> T {
    std::env::var(key)
        .ok()
        .and_then(|s| s.trim().parse().ok())
        .unwrap_or(default)
}

fn env_opt(key: &str) -> Option<String> {
    std::env::var(key)
        .ok()
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
}

fn invalid(field: &str, value: impl ToString, reason: &str) -> EconsultError {
    EconsultError::Config(ConfigError::InvalidValue {
        field: field.to_string(),
        value: value.to_string(),
        reason: reason.to_string(),
    })
}

// ============================================================================
// PIPELINE
// ============================================================================

/// Orchestrator tuning.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PipelineConfig {
    /// Maximum entries per result cache
    pub cache_capacity: usize,
    /// Entries dropped per eviction pass (oldest-inserted first)
    pub eviction_batch: usize,
    /// Concurrent analyzer invocations
    pub worker_pool_size: usize,
    /// Budget for one analyzer task, queueing included
    pub per_task_timeout: Duration,
    /// Texts with fewer words than this skip summarization
    pub short_summary_word_threshold: usize,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            cache_capacity: 1000,
            eviction_batch: 100,
            worker_pool_size: 4,
            per_task_timeout: Duration::from_secs(10),
            short_summary_word_threshold: 3,
        }
    }
}

impl PipelineConfig {
    /// Create from environment variables with fallback to defaults.
    ///
    /// Environment variables:
    /// - `ECONSULT_CACHE_CAPACITY` (default: 1000)
    /// - `ECONSULT_EVICTION_BATCH` (default: 100)
    /// - `ECONSULT_WORKER_POOL_SIZE` (default: 4)
    /// - `ECONSULT_PER_TASK_TIMEOUT_MS` (default: 10000)
    /// - `ECONSULT_SHORT_SUMMARY_WORDS` (default: 3)
    pub fn from_env() -> Self {
        let defaults = Self::default();

        Self {
            cache_capacity: env_or("ECONSULT_CACHE_CAPACITY", defaults.cache_capacity),
            eviction_batch: env_or("ECONSULT_EVICTION_BATCH", defaults.eviction_batch),
            worker_pool_size: env_or("ECONSULT_WORKER_POOL_SIZE", defaults.worker_pool_size),
            per_task_timeout: Duration::from_millis(env_or(
                "ECONSULT_PER_TASK_TIMEOUT_MS",
                defaults.per_task_timeout.as_millis() as u64,
            )),
            short_summary_word_threshold: env_or(
                "ECONSULT_SHORT_SUMMARY_WORDS",
                defaults.short_summary_word_threshold,
            ),
        }
    }

    /// Validate the configuration.
    ///
    /// Validates:
    /// - cache_capacity > 0
    /// - 1 <= eviction_batch <= cache_capacity
    /// - worker_pool_size > 0
    /// - per_task_timeout is positive
    pub fn validate(&self) -> EconsultResult<()> {
        if self.cache_capacity == 0 {
            return Err(invalid(
                "cache_capacity",
                self.cache_capacity,
                "cache_capacity must be greater than 0",
            ));
        }

        if self.eviction_batch == 0 || self.eviction_batch > self.cache_capacity {
            return Err(invalid(
                "eviction_batch",
                self.eviction_batch,
                "eviction_batch must be between 1 and cache_capacity",
            ));
        }

        if self.worker_pool_size == 0 {
            return Err(invalid(
                "worker_pool_size",
                self.worker_pool_size,
                "worker_pool_size must be greater than 0",
            ));
        }

        if self.per_task_timeout.is_zero() {
            return Err(invalid(
                "per_task_timeout",
                format!("{:?}", self.per_task_timeout),
                "per_task_timeout must be positive",
            ));
        }

        Ok(())
    }
}

// ============================================================================
// PROVIDERS
// ============================================================================

/// Settings consulted when the provider chains are resolved at startup.
///
/// A remote candidate without credentials fails to load, and its chain
/// falls through to the next candidate.
#[derive(Clone, PartialEq, Serialize, Deserialize)]
pub struct ProvidersConfig {
    pub huggingface_api_token: Option<String>,
    pub huggingface_base_url: String,
    pub huggingface_sentiment_model: String,
    pub huggingface_summary_model: String,
    /// JSON word lists for the secondary classifier
    pub lexicon_path: Option<PathBuf>,
    pub openai_api_key: Option<String>,
    pub openai_base_url: String,
    pub openai_model: String,
    /// HTTP timeout for a single remote call
    pub request_timeout: Duration,
}

impl Default for ProvidersConfig {
    fn default() -> Self {
        Self {
            huggingface_api_token: None,
            huggingface_base_url: "https://api-inference.huggingface.co".to_string(),
            huggingface_sentiment_model: "cardiffnlp/twitter-roberta-base-sentiment-latest"
                .to_string(),
            huggingface_summary_model: "sshleifer/distilbart-cnn-6-6".to_string(),
            lexicon_path: None,
            openai_api_key: None,
            openai_base_url: "https://api.openai.com/v1".to_string(),
            openai_model: "gpt-4o-mini".to_string(),
            request_timeout: Duration::from_secs(30),
        }
    }
}

impl std::fmt::Debug for ProvidersConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let redact = |secret: &Option<String>| secret.as_ref().map(|_| "[REDACTED]");
        f.debug_struct("ProvidersConfig")
            .field("huggingface_api_token", &redact(&self.huggingface_api_token))
            .field("huggingface_base_url", &self.huggingface_base_url)
            .field("huggingface_sentiment_model", &self.huggingface_sentiment_model)
            .field("huggingface_summary_model", &self.huggingface_summary_model)
            .field("lexicon_path", &self.lexicon_path)
            .field("openai_api_key", &redact(&self.openai_api_key))
            .field("openai_base_url", &self.openai_base_url)
            .field("openai_model", &self.openai_model)
            .field("request_timeout", &self.request_timeout)
            .finish()
    }
}

impl ProvidersConfig {
    /// Create from environment variables with fallback to defaults.
    ///
    /// Environment variables:
    /// - `ECONSULT_HF_API_TOKEN`
    /// - `ECONSULT_HF_BASE_URL`
    /// - `ECONSULT_HF_SENTIMENT_MODEL`
    /// - `ECONSULT_HF_SUMMARY_MODEL`
    /// - `ECONSULT_LEXICON_PATH`
    /// - `ECONSULT_OPENAI_API_KEY`
    /// - `ECONSULT_OPENAI_BASE_URL`
    /// - `ECONSULT_OPENAI_MODEL`
    /// - `ECONSULT_PROVIDER_TIMEOUT_MS` (default: 30000)
    pub fn from_env() -> Self {
        let defaults = Self::default();

        Self {
            huggingface_api_token: env_opt("ECONSULT_HF_API_TOKEN"),
            huggingface_base_url: env_opt("ECONSULT_HF_BASE_URL")
                .unwrap_or(defaults.huggingface_base_url),
            huggingface_sentiment_model: env_opt("ECONSULT_HF_SENTIMENT_MODEL")
                .unwrap_or(defaults.huggingface_sentiment_model),
            huggingface_summary_model: env_opt("ECONSULT_HF_SUMMARY_MODEL")
                .unwrap_or(defaults.huggingface_summary_model),
            lexicon_path: env_opt("ECONSULT_LEXICON_PATH").map(PathBuf::from),
            openai_api_key: env_opt("ECONSULT_OPENAI_API_KEY"),
            openai_base_url: env_opt("ECONSULT_OPENAI_BASE_URL")
                .unwrap_or(defaults.openai_base_url),
            openai_model: env_opt("ECONSULT_OPENAI_MODEL").unwrap_or(defaults.openai_model),
            request_timeout: Duration::from_millis(env_or(
                "ECONSULT_PROVIDER_TIMEOUT_MS",
                defaults.request_timeout.as_millis() as u64,
            )),
        }
    }

    pub fn validate(&self) -> EconsultResult<()> {
        if self.request_timeout.is_zero() {
            return Err(invalid(
                "request_timeout",
                format!("{:?}", self.request_timeout),
                "request_timeout must be positive",
            ));
        }
        Ok(())
    }
}

// ============================================================================
// STORAGE
// ============================================================================

/// SQLite store settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StorageConfig {
    pub database_path: PathBuf,
    pub max_connections: u32,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            database_path: PathBuf::from("eConsultation.db"),
            max_connections: 5,
        }
    }
}

impl StorageConfig {
    /// Environment variables:
    /// - `ECONSULT_DATABASE_PATH` (default: eConsultation.db)
    /// - `ECONSULT_DATABASE_MAX_CONNECTIONS` (default: 5)
    pub fn from_env() -> Self {
        let defaults = Self::default();

        Self {
            database_path: env_opt("ECONSULT_DATABASE_PATH")
                .map(PathBuf::from)
                .unwrap_or(defaults.database_path),
            max_connections: env_or(
                "ECONSULT_DATABASE_MAX_CONNECTIONS",
                defaults.max_connections,
            ),
        }
    }

    pub fn validate(&self) -> EconsultResult<()> {
        if self.max_connections == 0 {
            return Err(invalid(
                "max_connections",
                self.max_connections,
                "max_connections must be greater than 0",
            ));
        }
        Ok(())
    }
}

// =============================================================================
// TESTS
// =============================================================================
