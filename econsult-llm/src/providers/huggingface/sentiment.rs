//! Hugging Face sentiment classifier

use super::client::InferenceClient;
use super::types::{ClassificationOutput, InferenceOptions, InferenceRequest};
use crate::providers::invalid_response;
use crate::SentimentProvider;
use econsult_core::{EconsultResult, ProvidersConfig, SentimentArtifact};

/// Classifier backed by a hosted text-classification model.
#[derive(Debug)]
pub struct HuggingFaceClassifier {
    client: InferenceClient,
    model: String,
}

impl HuggingFaceClassifier {
    pub const NAME: &'static str = "huggingface-sentiment";

    pub fn from_config(config: &ProvidersConfig) -> EconsultResult<Self> {
        Ok(Self {
            client: InferenceClient::from_config(config)?,
            model: config.huggingface_sentiment_model.clone(),
        })
    }
}

impl SentimentProvider for HuggingFaceClassifier {
    fn name(&self) -> &str {
        Self::NAME
    }

    fn classify(&self, text: &str) -> EconsultResult<SentimentArtifact> {
        let request = InferenceRequest {
            inputs: text,
            parameters: None,
            options: InferenceOptions {
                wait_for_model: true,
            },
        };
        let output: ClassificationOutput = self.client.infer(&self.model, &request)?;
        output
            .best()
            .map_err(|reason| invalid_response(Self::NAME, reason))
    }
}
