//! Hugging Face Inference API request and response types

use econsult_core::{SentimentArtifact, SentimentLabel};
use serde::{Deserialize, Serialize};

// ============================================================================
// REQUEST TYPES
// ============================================================================

#[derive(Debug, Clone, Serialize)]
pub struct InferenceRequest<'a> {
    pub inputs: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub parameters: Option<SummaryParameters>,
    pub options: InferenceOptions,
}

#[derive(Debug, Clone, Serialize)]
pub struct SummaryParameters {
    pub max_length: u32,
    pub min_length: u32,
    pub do_sample: bool,
}

#[derive(Debug, Clone, Serialize)]
pub struct InferenceOptions {
    pub wait_for_model: bool,
}

// ============================================================================
// RESPONSE TYPES
// ============================================================================

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct LabelScore {
    pub label: String,
    pub score: f64,
}

/// Text-classification output. Depending on the pipeline version the
/// scores arrive either flat or wrapped in one list per input.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(untagged)]
pub enum ClassificationOutput {
    Nested(Vec<Vec<LabelScore>>),
    Flat(Vec<LabelScore>),
}

impl ClassificationOutput {
    fn scores(&self) -> &[LabelScore] {
        match self {
            ClassificationOutput::Nested(outer) => outer.first().map(Vec::as_slice).unwrap_or(&[]),
            ClassificationOutput::Flat(scores) => scores,
        }
    }

    /// Highest-scoring label mapped onto the three-way scale.
    pub fn best(&self) -> Result<SentimentArtifact, String> {
        let best = self
            .scores()
            .iter()
            .filter(|s| !s.score.is_nan())
            .max_by(|a, b| a.score.total_cmp(&b.score))
            .ok_or_else(|| "no label scores in response".to_string())?;

        let label = SentimentLabel::from_model_label(&best.label)
            .map_err(|e| format!("unknown label '{}'", e.0))?;
        SentimentArtifact::new(label, best.score)
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct SummarizationOutput {
    pub summary_text: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ApiError {
    pub error: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_nested_scores() {
        let body = r#"[[{"label":"LABEL_0","score":0.1},{"label":"LABEL_2","score":0.85},{"label":"LABEL_1","score":0.05}]]"#;
        let output: ClassificationOutput = serde_json::from_str(body).unwrap();
        let artifact = output.best().unwrap();
        assert_eq!(artifact.label, SentimentLabel::Positive);
        assert_eq!(artifact.score, 0.85);
    }

    #[test]
    fn test_parse_flat_named_labels() {
        let body = r#"[{"label":"negative","score":0.7},{"label":"neutral","score":0.3}]"#;
        let output: ClassificationOutput = serde_json::from_str(body).unwrap();
        assert!(matches!(output, ClassificationOutput::Flat(_)));
        assert_eq!(output.best().unwrap().label, SentimentLabel::Negative);
    }

    #[test]
    fn test_best_rejects_empty_and_unknown() {
        assert!(ClassificationOutput::Nested(vec![]).best().is_err());

        let unknown = ClassificationOutput::Flat(vec![LabelScore {
            label: "joy".to_string(),
            score: 0.9,
        }]);
        assert!(unknown.best().unwrap_err().contains("joy"));
    }

    #[test]
    fn test_summary_request_serialization() {
        let request = InferenceRequest {
            inputs: "text",
            parameters: Some(SummaryParameters {
                max_length: 50,
                min_length: 10,
                do_sample: false,
            }),
            options: InferenceOptions {
                wait_for_model: true,
            },
        };
        let json = serde_json::to_value(&request).unwrap();
        assert_eq!(json["inputs"], "text");
        assert_eq!(json["parameters"]["max_length"], 50);
        assert_eq!(json["options"]["wait_for_model"], true);
    }
}
