use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::types::Json;
use sqlx::FromRow;
use uuid::Uuid;

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Skills {
    pub technical: Vec<String>,
    pub soft: Vec<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Experience {
    pub years: String,
    pub job_titles: Vec<String>,
    pub key_achievements: Vec<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ResumeStatus {
    Pending,
    Completed,
    Failed,
}

impl ResumeStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            ResumeStatus::Pending => "pending",
            ResumeStatus::Completed => "completed",
            ResumeStatus::Failed => "failed",
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Resume {
    pub id: Uuid,
    pub user_id: Uuid,
    pub original_filename: String,
    pub uploaded_at: DateTime<Utc>,
    pub original_text: Option<String>,
    pub anonymized_text: Option<String>,
    pub extracted_skills: Json<Skills>,
    pub highlighted_experience: Json<Experience>,
    pub processing_status: String,
}

/// Insert payload; the row id and upload time are assigned by the store.
#[derive(Debug, Clone)]
pub struct NewResume {
    pub user_id: Uuid,
    pub original_filename: String,
    pub original_text: String,
    pub anonymized_text: String,
    pub skills: Skills,
    pub experience: Experience,
    pub status: ResumeStatus,
}
