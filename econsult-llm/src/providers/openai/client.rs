//! OpenAI HTTP client with request spacing

use super::types::ApiError;
use crate::providers::{http_client, invalid_response, not_configured, request_failed};
use econsult_core::{EconsultResult, ProvidersConfig};
use reqwest::blocking::Client;
use serde::{de::DeserializeOwned, Serialize};
use std::sync::Mutex;
use std::time::{Duration, Instant};

const PROVIDER: &str = "openai";
const DEFAULT_REQUESTS_PER_MINUTE: u32 = 60;

/// Blocking OpenAI API client.
///
/// Requests are spaced at least `60s / requests_per_minute` apart across all
/// worker threads sharing the client.
pub struct OpenAIClient {
    client: Client,
    api_key: String,
    base_url: String,
    last_request: Mutex<Option<Instant>>,
    min_request_interval: Duration,
}

impl OpenAIClient {
    /// Create a client from provider settings.
    ///
    /// # Errors
    /// `ProviderError::NotConfigured` when no API key is set.
    pub fn from_config(config: &ProvidersConfig) -> EconsultResult<Self> {
        let api_key = config
            .openai_api_key
            .clone()
            .ok_or_else(|| not_configured(PROVIDER, "ECONSULT_OPENAI_API_KEY is not set"))?;

        Ok(Self {
            client: http_client(PROVIDER, config.request_timeout)?,
            api_key,
            base_url: config.openai_base_url.trim_end_matches('/').to_string(),
            last_request: Mutex::new(None),
            min_request_interval: Self::interval_for(DEFAULT_REQUESTS_PER_MINUTE),
        })
    }

    fn interval_for(requests_per_minute: u32) -> Duration {
        let rpm = requests_per_minute.max(1) as u64;
        Duration::from_millis((60_000 / rpm).max(10))
    }

    /// Change the request budget.
    pub fn with_requests_per_minute(mut self, requests_per_minute: u32) -> Self {
        self.min_request_interval = Self::interval_for(requests_per_minute);
        self
    }

    fn wait_for_slot(&self) {
        // A poisoned lock only means another worker panicked mid-wait.
        let mut last = self.last_request.lock().unwrap_or_else(|e| e.into_inner());
        if let Some(previous) = *last {
            let elapsed = previous.elapsed();
            if elapsed < self.min_request_interval {
                std::thread::sleep(self.min_request_interval - elapsed);
            }
        }
        *last = Some(Instant::now());
    }

    /// Make an API request.
    pub fn request<Req: Serialize, Res: DeserializeOwned>(
        &self,
        endpoint: &str,
        body: &Req,
    ) -> EconsultResult<Res> {
        self.wait_for_slot();

        let url = format!("{}/{}", self.base_url, endpoint);
        let response = self
            .client
            .post(&url)
            .bearer_auth(&self.api_key)
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
                Ok(api_error) => api_error.error.message,
                Err(_) => error_text,
            };
            Err(request_failed(PROVIDER, status.as_u16() as i32, error_msg))
        }
    }
}

impl std::fmt::Debug for OpenAIClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("OpenAIClient")
            .field("base_url", &self.base_url)
            .field("api_key", &"[REDACTED]")
            .finish()
    }
}
