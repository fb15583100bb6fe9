use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::models::resume::{Experience, Resume, Skills};

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct UploadReport {
    pub processed: Vec<ProcessedFile>,
    pub errors: Vec<FileError>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProcessedFile {
    pub filename: String,
    pub resume_id: Uuid,
    pub email_sent: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub email_error: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FileError {
    pub filename: String,
    pub error: String,
}

/// Dashboard listing entry.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ResumeSummary {
    pub id: Uuid,
    pub filename: String,
    pub uploaded_at: DateTime<Utc>,
    pub status: String,
    pub technical_skills: usize,
    pub years_experience: String,
}

impl From<Resume> for ResumeSummary {
    fn from(r: Resume) -> Self {
        Self {
            id: r.id,
            filename: r.original_filename,
            uploaded_at: r.uploaded_at,
            status: r.processing_status,
            technical_skills: r.extracted_skills.technical.len(),
            years_experience: r.highlighted_experience.0.years,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ResumeDetail {
    pub id: Uuid,
    pub filename: String,
    pub uploaded_at: DateTime<Utc>,
    pub status: String,
    pub original_text: String,
    pub anonymized_text: String,
    pub skills: Skills,
    pub experience: Experience,
}

impl From<Resume> for ResumeDetail {
    fn from(r: Resume) -> Self {
        Self {
            id: r.id,
            filename: r.original_filename,
            uploaded_at: r.uploaded_at,
            status: r.processing_status,
            original_text: r.original_text.unwrap_or_default(),
            anonymized_text: r.anonymized_text.unwrap_or_default(),
            skills: r.extracted_skills.0,
            experience: r.highlighted_experience.0,
        }
    }
}

/// Extracted data only, as served to API clients.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ResumeData {
    pub id: Uuid,
    pub filename: String,
    pub uploaded_at: DateTime<Utc>,
    pub anonymized_text: String,
    pub skills: Skills,
    pub experience: Experience,
}

impl From<Resume> for ResumeData {
    fn from(r: Resume) -> Self {
        Self {
            id: r.id,
            filename: r.original_filename,
            uploaded_at: r.uploaded_at,
            anonymized_text: r.anonymized_text.unwrap_or_default(),
            skills: r.extracted_skills.0,
            experience: r.highlighted_experience.0,
        }
    }
}
