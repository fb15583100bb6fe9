use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};

#[derive(Debug, thiserror::Error)]
pub enum GenAiError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("API error (status {status}): {message}")]
    Api { status: u16, message: String },

    #[error("Model returned empty content")]
    EmptyContent,
}

impl GenAiError {
    /// Whether the failure reads as a quota or rate-limit condition.
    /// Transport errors only count when they carry a 429; their messages embed
    /// the request URL, which would otherwise match on `generateContent`.
    pub fn is_quota_or_rate_limit(&self) -> bool {
        match self {
            GenAiError::Api { status, message } => {
                *status == 429 || mentions_quota_or_rate(message)
            }
            GenAiError::Http(err) => err.status().map(|s| s.as_u16()) == Some(429),
            GenAiError::EmptyContent => false,
        }
    }
}

fn mentions_quota_or_rate(message: &str) -> bool {
    let msg = message.to_lowercase();
    ["quota", "exceeded", "429", "rate", "resource_exhausted"]
        .iter()
        .any(|needle| msg.contains(needle))
}

/// Prompt in, free-form text out.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait TextGenerator: Send + Sync {
    async fn generate(&self, prompt: &str) -> Result<String, GenAiError>;
}

#[derive(Serialize)]
struct GenerateRequest<'a> {
    contents: Vec<RequestContent<'a>>,
}

#[derive(Serialize)]
struct RequestContent<'a> {
    role: &'a str,
    parts: Vec<RequestPart<'a>>,
}

#[derive(Serialize)]
struct RequestPart<'a> {
    text: &'a str,
}

#[derive(Debug, Deserialize)]
struct GenerateResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
}

#[derive(Debug, Deserialize)]
struct Candidate {
    content: Option<CandidateContent>,
}

#[derive(Debug, Deserialize)]
struct CandidateContent {
    #[serde(default)]
    parts: Vec<ResponsePart>,
}

#[derive(Debug, Deserialize)]
struct ResponsePart {
    text: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ApiErrorEnvelope {
    error: ApiErrorBody,
}

#[derive(Debug, Deserialize)]
struct ApiErrorBody {
    message: String,
    #[serde(default)]
    status: Option<String>,
}

/// Gemini `generateContent` client.
#[derive(Clone)]
pub struct GeminiClient {
    client: Client,
    api_key: String,
    model: String,
    base_url: String,
}

impl GeminiClient {
    pub fn new(api_key: String, model: String, base_url: String, client: Client) -> Self {
        Self {
            client,
            api_key,
            model,
            base_url: base_url.trim_end_matches('/').to_string(),
        }
    }

    fn endpoint(&self) -> String {
        format!("{}/models/{}:generateContent", self.base_url, self.model)
    }
}

#[async_trait]
impl TextGenerator for GeminiClient {
    async fn generate(&self, prompt: &str) -> Result<String, GenAiError> {
        let body = GenerateRequest {
            contents: vec![RequestContent {
                role: "user",
                parts: vec![RequestPart { text: prompt }],
            }],
        };

        let response = self
            .client
            .post(self.endpoint())
            .header("x-goog-api-key", &self.api_key)
            .json(&body)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let raw = response.text().await.unwrap_or_default();
            let message = api_error_message(&raw);
            tracing::warn!(status = status.as_u16(), "Gemini request failed: {}", message);
            return Err(GenAiError::Api {
                status: status.as_u16(),
                message,
            });
        }

        let parsed: GenerateResponse = response.json().await?;
        let text = response_text(parsed);
        if text.trim().is_empty() {
            return Err(GenAiError::EmptyContent);
        }
        tracing::debug!(model = %self.model, chars = text.len(), "Gemini response received");
        Ok(text)
    }
}

fn api_error_message(raw: &str) -> String {
    match serde_json::from_str::<ApiErrorEnvelope>(raw) {
        Ok(envelope) => match envelope.error.status {
            Some(status) => format!("{} ({})", envelope.error.message, status),
            None => envelope.error.message,
        },
        Err(_) => raw.to_string(),
    }
}

fn response_text(response: GenerateResponse) -> String {
    response
        .candidates
        .into_iter()
        .next()
        .and_then(|c| c.content)
        .map(|content| {
            content
                .parts
                .into_iter()
                .filter_map(|p| p.text)
                .collect::<Vec<_>>()
                .join("")
        })
        .unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn quota_detection_uses_message_text() {
        let quota = GenAiError::Api {
            status: 429,
            message: "Resource has been exhausted (e.g. check quota).".into(),
        };
        assert!(quota.is_quota_or_rate_limit());

        let forbidden = GenAiError::Api {
            status: 403,
            message: "API key not valid".into(),
        };
        assert!(!forbidden.is_quota_or_rate_limit());
        assert!(!GenAiError::EmptyContent.is_quota_or_rate_limit());

        let rate = GenAiError::Api {
            status: 503,
            message: "Rate limit reached for requests".into(),
        };
        assert!(rate.is_quota_or_rate_limit());
    }

    #[test]
    fn api_error_body_is_unwrapped() {
        let raw = r#"{"error":{"code":429,"message":"Quota exceeded","status":"RESOURCE_EXHAUSTED"}}"#;
        assert_eq!(api_error_message(raw), "Quota exceeded (RESOURCE_EXHAUSTED)");
        assert_eq!(api_error_message("upstream down"), "upstream down");
    }

    #[test]
    fn candidate_parts_are_concatenated() {
        let parsed: GenerateResponse = serde_json::from_str(
            r#"{"candidates":[{"content":{"parts":[{"text":"{\"a\":"},{"text":"1}"}]}}]}"#,
        )
        .unwrap();
        assert_eq!(response_text(parsed), "{\"a\":1}");

        let empty: GenerateResponse = serde_json::from_str("{}").unwrap();
        assert_eq!(response_text(empty), "");
    }

    #[test]
    fn endpoint_includes_model() {
        let client = GeminiClient::new(
            "key".into(),
            "gemini-2.0-flash-lite".into(),
            "https://example.test/v1beta/".into(),
            Client::new(),
        );
        assert_eq!(
            client.endpoint(),
            "https://example.test/v1beta/models/gemini-2.0-flash-lite:generateContent"
        );
    }
}
