//! Hugging Face summarizer

use super::client::InferenceClient;
use super::types::{InferenceOptions, InferenceRequest, SummarizationOutput, SummaryParameters};
use crate::providers::invalid_response;
use crate::SummaryProvider;
use econsult_core::{EconsultResult, ProvidersConfig};

// Token counts, not characters. The result is still bounded downstream.
const MAX_SUMMARY_TOKENS: u32 = 50;
const MIN_SUMMARY_TOKENS: u32 = 10;

/// Summarizer backed by a hosted seq2seq model.
#[derive(Debug)]
pub struct HuggingFaceSummarizer {
    client: InferenceClient,
    model: String,
}

impl HuggingFaceSummarizer {
    pub const NAME: &'static str = "huggingface-summary";

    pub fn from_config(config: &ProvidersConfig) -> EconsultResult<Self> {
        Ok(Self {
            client: InferenceClient::from_config(config)?,
            model: config.huggingface_summary_model.clone(),
        })
    }
}

impl SummaryProvider for HuggingFaceSummarizer {
    fn name(&self) -> &str {
        Self::NAME
    }

    fn summarize(&self, text: &str) -> EconsultResult<String> {
        let request = InferenceRequest {
            inputs: text,
            parameters: Some(SummaryParameters {
                max_length: MAX_SUMMARY_TOKENS,
                min_length: MIN_SUMMARY_TOKENS,
                do_sample: false,
            }),
            options: InferenceOptions {
                wait_for_model: true,
            },
        };
        let outputs: Vec<SummarizationOutput> = self.client.infer(&self.model, &request)?;
        outputs
            .into_iter()
            .next()
            .map(|o| o.summary_text)
            .ok_or_else(|| invalid_response(Self::NAME, "empty summary list"))
    }
}
