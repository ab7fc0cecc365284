//! Hugging Face Inference API client

use super::types::ApiError;
use crate::providers::{http_client, invalid_response, not_configured, request_failed};
use econsult_core::{EconsultResult, ProvidersConfig};
use reqwest::blocking::Client;
use serde::{de::DeserializeOwned, Serialize};

const PROVIDER: &str = "huggingface";

/// Blocking client for `POST {base_url}/models/{model}`.
pub struct InferenceClient {
    client: Client,
    api_token: String,
    base_url: String,
}

impl InferenceClient {
    /// Create a client from provider settings.
    ///
    /// # Errors
    /// `ProviderError::NotConfigured` when no API token is set.
    pub fn from_config(config: &ProvidersConfig) -> EconsultResult<Self> {
        let api_token = config
            .huggingface_api_token
            .clone()
            .ok_or_else(|| not_configured(PROVIDER, "ECONSULT_HF_API_TOKEN is not set"))?;

        Ok(Self {
            client: http_client(PROVIDER, config.request_timeout)?,
            api_token,
            base_url: config.huggingface_base_url.trim_end_matches('/').to_string(),
        })
    }

    /// Run one inference request against `model`.
    pub fn infer<Req: Serialize, Res: DeserializeOwned>(
        &self,
        model: &str,
        body: &Req,
    ) -> EconsultResult<Res> {
        let url = format!("{}/models/{}", self.base_url, model);
        let response = self
            .client
            .post(&url)
            .bearer_auth(&self.api_token)
            .json(body)
            .send()
            .map_err(|e| request_failed(PROVIDER, 0, format!("HTTP request failed: {}", e)))?;

        let status = response.status();
        if status.is_success() {
            response
                .json()
                .map_err(|e| invalid_response(PROVIDER, format!("Failed to parse response: {}", e)))
        } else {
            let error_text = response
                .text()
                .unwrap_or_else(|_| "Unknown error".to_string());
            let error_msg = match serde_json::from_str::<ApiError>(&error_text) {
                Ok(api_error) => api_error.error,
                Err(_) => error_text,
            };
            Err(request_failed(PROVIDER, status.as_u16() as i32, error_msg))
        }
    }
}

impl std::fmt::Debug for InferenceClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("InferenceClient")
            .field("base_url", &self.base_url)
            .field("api_token", &"[REDACTED]")
            .finish()
    }
}
