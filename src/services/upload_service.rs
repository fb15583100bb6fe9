//! Batch processing of uploaded resumes.
//!
//! Files are handled one after another. Each one is stored, extracted,
//! anonymized and persisted on its own; a failure is recorded against that
//! file and the batch moves on. Email delivery happens after the row is
//! committed and its failure never undoes the insert.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use bytes::Bytes;
use uuid::Uuid;

use crate::config::UploadConfig;
use crate::dto::resume_dto::{FileError, ProcessedFile, UploadReport};
use crate::error::{Error, Result};
use crate::models::resume::{NewResume, Resume, ResumeStatus};
use crate::services::anonymizer_service::Anonymizer;
use crate::services::auth_service::AuthUser;
use crate::services::mail_service::{ResultMailer, ResultsEmail};
use crate::services::pdf_service;
use crate::services::result_assembler;
use crate::services::resume_service::ResumeStore;
use crate::utils::{time, validation};

#[derive(Debug, Clone)]
pub struct UploadedFile {
    pub filename: String,
    pub data: Bytes,
}

#[derive(Clone)]
pub struct UploadService {
    resumes: Arc<dyn ResumeStore>,
    anonymizer: Arc<dyn Anonymizer>,
    mailer: Option<Arc<dyn ResultMailer>>,
    config: UploadConfig,
}

impl UploadService {
    pub fn new(
        resumes: Arc<dyn ResumeStore>,
        anonymizer: Arc<dyn Anonymizer>,
        mailer: Option<Arc<dyn ResultMailer>>,
        config: UploadConfig,
    ) -> Self {
        Self {
            resumes,
            anonymizer,
            mailer,
            config,
        }
    }

    pub async fn process_batch(&self, owner: &AuthUser, files: Vec<UploadedFile>) -> UploadReport {
        let mut report = UploadReport::default();

        for file in files {
            let filename = file.filename.clone();
            match self.process_file(owner, file).await {
                Ok(resume) => {
                    let (email_sent, email_error) = self.notify(owner, &resume).await;
                    report.processed.push(ProcessedFile {
                        filename,
                        resume_id: resume.id,
                        email_sent,
                        email_error,
                    });
                }
                Err(e) => {
                    tracing::warn!(filename = %filename, user_id = %owner.id, "Resume processing failed: {}", e);
                    report.errors.push(FileError {
                        filename,
                        error: format!("Processing error: {}", e),
                    });
                }
            }
        }

        tracing::info!(
            user_id = %owner.id,
            processed = report.processed.len(),
            failed = report.errors.len(),
            "Upload batch finished"
        );
        report
    }

    async fn process_file(&self, owner: &AuthUser, file: UploadedFile) -> Result<Resume> {
        if file.filename.trim().is_empty() {
            return Err(Error::BadRequest("No file selected".to_string()));
        }
        if !validation::allowed_file(&file.filename, &self.config.allowed_extensions) {
            return Err(Error::BadRequest("Only PDF files are allowed".to_string()));
        }

        let stored_path = self.store_file(&file).await?;
        match self.analyze_and_persist(owner, file.filename, &stored_path).await {
            Ok(resume) => Ok(resume),
            Err(e) => {
                discard_stored_file(&stored_path).await;
                Err(e)
            }
        }
    }

    async fn analyze_and_persist(
        &self,
        owner: &AuthUser,
        original_filename: String,
        stored_path: &Path,
    ) -> Result<Resume> {
        let original_text = pdf_service::extract_text_from_pdf(stored_path).await?;
        let anonymized = self.anonymizer.anonymize(&original_text).await?;
        let assembled = result_assembler::assemble(anonymized);

        let resume = self
            .resumes
            .create(NewResume {
                user_id: owner.id,
                original_filename,
                original_text,
                anonymized_text: assembled.anonymized_text,
                skills: assembled.skills,
                experience: assembled.experience,
                status: ResumeStatus::Completed,
            })
            .await?;

        tracing::info!(resume_id = %resume.id, user_id = %owner.id, "Resume processed");
        Ok(resume)
    }

    async fn store_file(&self, file: &UploadedFile) -> Result<PathBuf> {
        tokio::fs::create_dir_all(&self.config.folder).await?;
        let path = stored_file_path(&self.config.folder, &file.filename);
        tokio::fs::write(&path, &file.data).await.map_err(|e| {
            tracing::error!("Failed to write upload {}: {}", path.display(), e);
            Error::Internal(format!("Failed to save file: {}", e))
        })?;
        Ok(path)
    }

    async fn notify(&self, owner: &AuthUser, resume: &Resume) -> (bool, Option<String>) {
        let Some(mailer) = &self.mailer else {
            return (false, None);
        };

        let email = ResultsEmail {
            anonymized_text: resume.anonymized_text.clone().unwrap_or_default(),
            technical_skills: resume.extracted_skills.technical.clone(),
            key_achievements: resume.highlighted_experience.key_achievements.clone(),
        };

        match mailer.send_results(&owner.email, &email).await {
            Ok(()) => (true, None),
            Err(e) => {
                tracing::error!(resume_id = %resume.id, "Results email failed: {}", e);
                (false, Some(e.to_string()))
            }
        }
    }
}

/// `<YYYYmmdd_HHMMSS>_<8 hex>_<sanitized name>`; the random segment keeps
/// same-second uploads of one filename apart.
fn stored_file_path(folder: &Path, filename: &str) -> PathBuf {
    let stamp = time::now().format("%Y%m%d_%H%M%S");
    let unique = Uuid::new_v4().simple().to_string();
    folder.join(format!(
        "{}_{}_{}",
        stamp,
        &unique[..8],
        validation::secure_filename(filename)
    ))
}

async fn discard_stored_file(path: &Path) {
    if let Err(e) = tokio::fs::remove_file(path).await {
        tracing::warn!("Failed to remove upload {}: {}", path.display(), e);
    }
}
