//! Hugging Face Inference API providers

mod client;
mod sentiment;
mod summarization;
mod types;

pub use client::InferenceClient;
pub use sentiment::HuggingFaceClassifier;
pub use summarization::HuggingFaceSummarizer;
pub use types::{ClassificationOutput, LabelScore};
