//! Resume anonymization through a hosted model, with a local regex fallback.
//!
//! The remote path retries only on quota/rate-limit failures, doubling the delay
//! between attempts. Once the retry budget is spent on such failures the local
//! anonymizer answers instead, so quota exhaustion never fails an upload.

use std::sync::Arc;

use async_trait::async_trait;
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::{Map, Value as JsonValue};

use crate::config::AnonymizerConfig;
use crate::services::genai_service::{GenAiError, TextGenerator};
use crate::services::local_anonymizer::LocalAnonymizer;

#[derive(Debug, thiserror::Error)]
pub enum AnonymizeError {
    #[error("Error anonymizing resume: {0}")]
    Remote(#[source] GenAiError),

    #[error("Error anonymizing resume: could not parse model response: {0}")]
    Parse(#[from] serde_json::Error),
}

/// Structured output of the anonymization step, keyed the way the prompt asks.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AnonymizationResult {
    #[serde(default, deserialize_with = "lenient_string")]
    pub anonymized_resume: String,
    #[serde(default, deserialize_with = "lenient_list")]
    pub technical_skills: Vec<String>,
    #[serde(default, deserialize_with = "lenient_list")]
    pub soft_skills: Vec<String>,
    #[serde(default, deserialize_with = "lenient_string")]
    pub years_experience: String,
    #[serde(default, deserialize_with = "lenient_list")]
    pub key_achievements: Vec<String>,
    #[serde(default, deserialize_with = "lenient_list")]
    pub job_titles: Vec<String>,
    /// Keys the model returned beyond the requested ones.
    #[serde(flatten)]
    pub extra: Map<String, JsonValue>,
}

#[async_trait]
pub trait Anonymizer: Send + Sync {
    async fn anonymize(&self, resume_text: &str) -> Result<AnonymizationResult, AnonymizeError>;
}

pub struct GenAiAnonymizer {
    generator: Arc<dyn TextGenerator>,
    config: AnonymizerConfig,
    fallback: LocalAnonymizer,
}

impl GenAiAnonymizer {
    pub fn new(generator: Arc<dyn TextGenerator>, config: AnonymizerConfig) -> Self {
        Self {
            generator,
            config,
            fallback: LocalAnonymizer::new(),
        }
    }
}

#[async_trait]
impl Anonymizer for GenAiAnonymizer {
    async fn anonymize(&self, resume_text: &str) -> Result<AnonymizationResult, AnonymizeError> {
        let prompt = build_prompt(resume_text);
        let attempts = self.config.max_retries.max(1);
        let mut backoff = self.config.initial_backoff;

        for attempt in 1..=attempts {
            match self.generator.generate(&prompt).await {
                Ok(raw) => return parse_model_response(&raw).map_err(AnonymizeError::from),
                Err(err) if err.is_quota_or_rate_limit() => {
                    if attempt < attempts {
                        tracing::warn!(
                            attempt,
                            ?backoff,
                            "Model quota/rate limit hit, backing off: {}",
                            err
                        );
                        tokio::time::sleep(backoff).await;
                        backoff *= 2;
                    } else {
                        tracing::warn!(
                            attempts,
                            "Model quota/rate limit persisted, using local anonymizer: {}",
                            err
                        );
                        return Ok(self.fallback.anonymize_text(resume_text));
                    }
                }
                Err(err) => return Err(AnonymizeError::Remote(err)),
            }
        }

        Ok(self.fallback.anonymize_text(resume_text))
    }
}

pub fn build_prompt(resume_text: &str) -> String {
    format!(
        r#"You are a resume anonymization expert. Process the following resume to:

1. ANONYMIZE these elements (replace with [REDACTED]):
   - Names and personal identifiers
   - Email addresses and phone numbers
   - Specific addresses and zip codes (keep only state/country level)
   - Age-related information (graduation years converted to "X years ago", birth dates)
   - Gender-specific pronouns and names
   - Photos/profile pictures references
   - Any other identifying information

2. EXTRACT AND HIGHLIGHT:
   - Technical skills (programming languages, tools, frameworks)
   - Soft skills (leadership, communication, project management)
   - Years of experience in each area
   - Notable achievements with quantifiable impact

3. Return a JSON response with this structure:
   {{
     "anonymized_resume": "[full anonymized resume text]",
     "technical_skills": ["skill1", "skill2", ...],
     "soft_skills": ["skill1", "skill2", ...],
     "years_experience": "X years",
     "key_achievements": ["achievement1", "achievement2", ...],
     "job_titles": ["title1", "title2", ...]
   }}

Resume to process:
{resume_text}

Ensure the anonymized version is still professional and coherent."#
    )
}

/// Pulls the JSON object out of free-form model output.
///
/// The payload is the span from the first `{` to the last `}`. Output without
/// any `{` is taken as the anonymized text itself with nothing extracted.
pub fn parse_model_response(raw: &str) -> Result<AnonymizationResult, serde_json::Error> {
    let Some(start) = raw.find('{') else {
        return Ok(AnonymizationResult {
            anonymized_resume: raw.to_string(),
            ..AnonymizationResult::default()
        });
    };

    let tail = &raw[start..];
    let payload = match tail.rfind('}') {
        Some(end) => &tail[..=end],
        None => "",
    };
    serde_json::from_str(payload)
}

fn lenient_string<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(value_to_text(JsonValue::deserialize(deserializer)?))
}

fn lenient_list<'de, D>(deserializer: D) -> Result<Vec<String>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(match JsonValue::deserialize(deserializer)? {
        JsonValue::Null => Vec::new(),
        JsonValue::Array(items) => items
            .into_iter()
            .filter(|item| !item.is_null())
            .map(value_to_text)
            .collect(),
        other => vec![value_to_text(other)],
    })
}

fn value_to_text(value: JsonValue) -> String {
    match value {
        JsonValue::Null => String::new(),
        JsonValue::String(s) => s,
        other => other.to_string(),
    }
}
