use async_trait::async_trait;
use sqlx::types::Json;
use sqlx::PgPool;
use uuid::Uuid;

use crate::error::{Error, Result};
use crate::models::resume::{NewResume, Resume};

/// Resume persistence. Rows are never updated after insert.
#[async_trait]
pub trait ResumeStore: Send + Sync {
    /// Inserts the row in its own transaction.
    async fn create(&self, resume: NewResume) -> Result<Resume>;
    /// Newest first.
    async fn list_for_user(&self, user_id: Uuid) -> Result<Vec<Resume>>;
    async fn find_by_id(&self, id: Uuid) -> Result<Option<Resume>>;
    /// Returns false when no row owned by `user_id` matched.
    async fn delete(&self, id: Uuid, user_id: Uuid) -> Result<bool>;
}

/// Loads a resume and checks that `user_id` owns it.
pub async fn get_owned_resume(store: &dyn ResumeStore, id: Uuid, user_id: Uuid) -> Result<Resume> {
    let resume = store
        .find_by_id(id)
        .await?
        .ok_or_else(|| Error::NotFound(format!("Resume {} not found", id)))?;

    if resume.user_id != user_id {
        tracing::warn!(resume_id = %id, user_id = %user_id, "Rejected cross-user resume access");
        return Err(Error::Forbidden("Unauthorized".to_string()));
    }
    Ok(resume)
}

pub async fn delete_owned_resume(store: &dyn ResumeStore, id: Uuid, user_id: Uuid) -> Result<()> {
    get_owned_resume(store, id, user_id).await?;
    if !store.delete(id, user_id).await? {
        return Err(Error::NotFound(format!("Resume {} not found", id)));
    }
    tracing::info!(resume_id = %id, "Resume deleted");
    Ok(())
}

#[derive(Clone)]
pub struct ResumeService {
    pool: PgPool,
}

impl ResumeService {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

const RESUME_COLUMNS: &str = "id, user_id, original_filename, uploaded_at, original_text, \
    anonymized_text, extracted_skills, highlighted_experience, processing_status";

#[async_trait]
impl ResumeStore for ResumeService {
    async fn create(&self, resume: NewResume) -> Result<Resume> {
        let mut tx = self.pool.begin().await?;

        let row = sqlx::query_as::<_, Resume>(&format!(
            r#"
            INSERT INTO resumes
                (user_id, original_filename, original_text, anonymized_text,
                 extracted_skills, highlighted_experience, processing_status)
            VALUES ($1, $2, $3, $4, $5, $6, $7)
            RETURNING {}
            "#,
            RESUME_COLUMNS
        ))
        .bind(resume.user_id)
        .bind(&resume.original_filename)
        .bind(&resume.original_text)
        .bind(&resume.anonymized_text)
        .bind(Json(&resume.skills))
        .bind(Json(&resume.experience))
        .bind(resume.status.as_str())
        .fetch_one(&mut *tx)
        .await?;

        tx.commit().await?;
        Ok(row)
    }

    async fn list_for_user(&self, user_id: Uuid) -> Result<Vec<Resume>> {
        let rows = sqlx::query_as::<_, Resume>(&format!(
            "SELECT {} FROM resumes WHERE user_id = $1 ORDER BY uploaded_at DESC",
            RESUME_COLUMNS
        ))
        .bind(user_id)
        .fetch_all(&self.pool)
        .await?;
        Ok(rows)
    }

    async fn find_by_id(&self, id: Uuid) -> Result<Option<Resume>> {
        let row = sqlx::query_as::<_, Resume>(&format!(
            "SELECT {} FROM resumes WHERE id = $1",
            RESUME_COLUMNS
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(row)
    }

    async fn delete(&self, id: Uuid, user_id: Uuid) -> Result<bool> {
        let result = sqlx::query("DELETE FROM resumes WHERE id = $1 AND user_id = $2")
            .bind(id)
            .bind(user_id)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }
}
