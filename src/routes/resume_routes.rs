use axum::{
    extract::{Multipart, Path, State},
    Extension, Json,
};
use uuid::Uuid;

use crate::dto::auth_dto::MessageResponse;
use crate::dto::resume_dto::{ResumeData, ResumeDetail, ResumeSummary, UploadReport};
use crate::error::{Error, Result};
use crate::services::auth_service::AuthUser;
use crate::services::resume_service;
use crate::services::upload_service::UploadedFile;
use crate::AppState;

pub async fn list_resumes(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
) -> Result<Json<Vec<ResumeSummary>>> {
    let resumes = state.resumes.list_for_user(user.id).await?;
    Ok(Json(resumes.into_iter().map(ResumeSummary::from).collect()))
}

/// Accepts any number of `files` (or `file`) parts and reports per-file outcomes.
pub async fn upload_resumes(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    mut multipart: Multipart,
) -> Result<Json<UploadReport>> {
    let mut files = Vec::new();

    while let Some(field) = multipart.next_field().await.map_err(|e| {
        tracing::error!("Failed to get next field: {}", e);
        Error::BadRequest(e.to_string())
    })? {
        let field_name = field.name().unwrap_or_default().to_string();
        if field_name != "files" && field_name != "file" {
            continue;
        }

        let filename = field.file_name().unwrap_or_default().to_string();
        let data = field.bytes().await.map_err(|e| {
            tracing::error!("Failed to read upload bytes: {}", e);
            Error::BadRequest("Failed to read file upload".into())
        })?;
        files.push(UploadedFile { filename, data });
    }

    if files.is_empty() {
        return Err(Error::BadRequest("No file provided".into()));
    }

    tracing::info!(user_id = %user.id, count = files.len(), "Upload batch received");
    Ok(Json(state.upload_service.process_batch(&user, files).await))
}

pub async fn get_resume(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    Path(id): Path<Uuid>,
) -> Result<Json<ResumeDetail>> {
    let resume = resume_service::get_owned_resume(state.resumes.as_ref(), id, user.id).await?;
    Ok(Json(resume.into()))
}

pub async fn get_resume_data(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    Path(id): Path<Uuid>,
) -> Result<Json<ResumeData>> {
    let resume = resume_service::get_owned_resume(state.resumes.as_ref(), id, user.id).await?;
    Ok(Json(resume.into()))
}

pub async fn delete_resume(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    Path(id): Path<Uuid>,
) -> Result<Json<MessageResponse>> {
    resume_service::delete_owned_resume(state.resumes.as_ref(), id, user.id).await?;
    Ok(Json(MessageResponse {
        success: true,
        message: "Resume deleted successfully".to_string(),
    }))
}
