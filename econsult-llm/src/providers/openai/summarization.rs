//! OpenAI summarizer

use super::client::OpenAIClient;
use super::types::{ChatMessage, ChatRequest, ChatResponse, Role};
use crate::providers::invalid_response;
use crate::SummaryProvider;
use econsult_core::{EconsultResult, ProvidersConfig};

const SYSTEM_PROMPT: &str = "You summarize public consultation comments. \
     Reply with one plain sentence of at most 50 characters that states the \
     commenter's main point. No quotes, no preamble.";

/// Summarizer using OpenAI chat completions.
#[derive(Debug)]
pub struct OpenAISummarizer {
    client: OpenAIClient,
    model: String,
}

impl OpenAISummarizer {
    pub const NAME: &'static str = "openai-summary";

    pub fn from_config(config: &ProvidersConfig) -> EconsultResult<Self> {
        Ok(Self {
            client: OpenAIClient::from_config(config)?,
            model: config.openai_model.clone(),
        })
    }

    fn build_request<'a>(&'a self, text: &'a str) -> ChatRequest<'a> {
        ChatRequest {
            model: &self.model,
            messages: [
                ChatMessage {
                    role: Role::System,
                    content: SYSTEM_PROMPT,
                },
                ChatMessage {
                    role: Role::User,
                    content: text,
                },
            ],
            max_tokens: 32,
            temperature: 0.2,
        }
    }
}

impl SummaryProvider for OpenAISummarizer {
    fn name(&self) -> &str {
        Self::NAME
    }

    fn summarize(&self, text: &str) -> EconsultResult<String> {
        let response: ChatResponse = self
            .client
            .request("chat/completions", &self.build_request(text))?;

        response
            .into_first_text()
            .ok_or_else(|| invalid_response(Self::NAME, "no completion text in response"))
    }
}
