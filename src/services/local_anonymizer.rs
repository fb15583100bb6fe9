//! Deterministic, regex-based redaction used when the model is unavailable.
//!
//! Best effort only: the patterns catch common contact details, years and a
//! leading name line, nothing more. Skills and experience are never extracted.

use async_trait::async_trait;
use once_cell::sync::Lazy;
use regex::Regex;

use crate::services::anonymizer_service::{AnonymizationResult, AnonymizeError, Anonymizer};

pub const UNKNOWN_EXPERIENCE: &str = "Unknown";

static EMAIL_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"\b[A-Za-z0-9._%+-]+@[A-Za-z0-9.-]+\.[A-Za-z]{2,}\b").expect("valid email regex")
});
static PHONE_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\+?\d[\d\-\s().]{7,}\d").expect("valid phone regex"));
static ZIP_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\b\d{5}(?:-\d{4})?\b").expect("valid zip regex"));
static ADDRESS_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r"(?i)\d+\s+[^\n,]{1,60}\b(?:Street|St\.?|Avenue|Ave\.?|Road|Rd\.?|Boulevard|Blvd\.?|Lane|Ln\.?|Drive|Dr\.?)\b",
    )
    .expect("valid address regex")
});
static YEAR_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\b(?:19|20)\d{2}\b").expect("valid year regex"));
static NAME_LINE_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[A-Z][a-z]+(?: [A-Z][a-z]+)+$").expect("valid name regex"));

#[derive(Debug, Clone, Copy, Default)]
pub struct LocalAnonymizer;

impl LocalAnonymizer {
    pub fn new() -> Self {
        Self
    }

    pub fn anonymize_text(&self, text: &str) -> AnonymizationResult {
        let redacted = EMAIL_RE.replace_all(text, "[REDACTED_EMAIL]");
        let redacted = PHONE_RE.replace_all(&redacted, "[REDACTED_PHONE]");
        let redacted = ZIP_RE.replace_all(&redacted, "[REDACTED_ZIP]");
        let redacted = ADDRESS_RE.replace_all(&redacted, "[REDACTED_ADDRESS]");
        let redacted = YEAR_RE.replace_all(&redacted, "[REDACTED_YEAR]");

        AnonymizationResult {
            anonymized_resume: redact_name_line(&redacted),
            years_experience: UNKNOWN_EXPERIENCE.to_string(),
            ..AnonymizationResult::default()
        }
    }
}

#[async_trait]
impl Anonymizer for LocalAnonymizer {
    async fn anonymize(&self, resume_text: &str) -> Result<AnonymizationResult, AnonymizeError> {
        Ok(self.anonymize_text(resume_text))
    }
}

fn redact_name_line(text: &str) -> String {
    let mut lines: Vec<&str> = text.lines().collect();
    match lines.first() {
        Some(first) if NAME_LINE_RE.is_match(first.trim()) => {
            lines[0] = "[REDACTED_NAME]";
            lines.join("\n")
        }
        _ => text.to_string(),
    }
}
