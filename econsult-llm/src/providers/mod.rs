//! Remote analyzer providers
//!
//! Blocking HTTP clients: every call already runs on a worker-pool thread,
//! so an async client would only add a second runtime hop.

pub mod huggingface;
pub mod openai;

pub use huggingface::{HuggingFaceClassifier, HuggingFaceSummarizer, InferenceClient};
pub use openai::{OpenAIClient, OpenAISummarizer};

use econsult_core::{EconsultError, ProviderError};

pub(crate) fn request_failed(
    provider: &str,
    status: i32,
    message: impl Into<String>,
) -> EconsultError {
    ProviderError::RequestFailed {
        provider: provider.to_string(),
        status,
        message: message.into(),
    }
    .into()
}

pub(crate) fn invalid_response(provider: &str, reason: impl Into<String>) -> EconsultError {
    ProviderError::InvalidResponse {
        provider: provider.to_string(),
        reason: reason.into(),
    }
    .into()
}

pub(crate) fn not_configured(provider: &str, reason: impl Into<String>) -> EconsultError {
    ProviderError::NotConfigured {
        provider: provider.to_string(),
        reason: reason.into(),
    }
    .into()
}

pub(crate) fn construction_failed(provider: &str, reason: impl Into<String>) -> EconsultError {
    ProviderError::ConstructionFailed {
        provider: provider.to_string(),
        reason: reason.into(),
    }
    .into()
}

/// Build the shared blocking HTTP client for one provider.
pub(crate) fn http_client(
    provider: &str,
    timeout: std::time::Duration,
) -> Result<reqwest::blocking::Client, EconsultError> {
    reqwest::blocking::Client::builder()
        .timeout(timeout)
        .build()
        .map_err(|e| construction_failed(provider, format!("HTTP client: {}", e)))
}
