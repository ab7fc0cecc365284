//! OpenAI chat-completions summarizer

mod client;
mod summarization;
mod types;

pub use client::OpenAIClient;
pub use summarization::OpenAISummarizer;
