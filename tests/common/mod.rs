#![allow(dead_code)]

use std::path::Path;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use axum::{
    body::{to_bytes, Body},
    http::{header, Request, StatusCode},
    Router,
};
use fairscan_backend::{
    config::{AnonymizerConfig, Config, UploadConfig},
    error::{Error, Result},
    models::{
        resume::{NewResume, Resume},
        user::User,
    },
    routes,
    services::{
        anonymizer_service::GenAiAnonymizer,
        genai_service::{GenAiError, TextGenerator},
        resume_service::ResumeStore,
        user_service::UserStore,
    },
    AppState,
};
use lopdf::content::{Content, Operation};
use lopdf::{dictionary, Document, Object, Stream};
use serde_json::{json, Value as JsonValue};
use tempfile::TempDir;
use tower::ServiceExt;
use uuid::Uuid;

pub const BOUNDARY: &str = "fairscan-test-boundary";

#[derive(Default)]
pub struct MemoryUsers {
    pub rows: Mutex<Vec<User>>,
}

#[async_trait]
impl UserStore for MemoryUsers {
    async fn create_user(&self, email: &str, password_hash: &str) -> Result<User> {
        let mut rows = self.rows.lock().unwrap();
        if rows.iter().any(|u| u.email == email) {
            return Err(Error::Conflict("Email already registered".into()));
        }
        let user = User {
            id: Uuid::new_v4(),
            email: email.to_string(),
            password_hash: password_hash.to_string(),
            is_active: true,
            created_at: chrono::Utc::now(),
        };
        rows.push(user.clone());
        Ok(user)
    }

    async fn find_by_email(&self, email: &str) -> Result<Option<User>> {
        Ok(self.rows.lock().unwrap().iter().find(|u| u.email == email).cloned())
    }

    async fn find_by_id(&self, id: Uuid) -> Result<Option<User>> {
        Ok(self.rows.lock().unwrap().iter().find(|u| u.id == id).cloned())
    }
}

#[derive(Default)]
pub struct MemoryResumes {
    pub rows: Mutex<Vec<Resume>>,
}

#[async_trait]
impl ResumeStore for MemoryResumes {
    async fn create(&self, resume: NewResume) -> Result<Resume> {
        let row = Resume {
            id: Uuid::new_v4(),
            user_id: resume.user_id,
            original_filename: resume.original_filename,
            uploaded_at: chrono::Utc::now(),
            original_text: Some(resume.original_text),
            anonymized_text: Some(resume.anonymized_text),
            extracted_skills: sqlx::types::Json(resume.skills),
            highlighted_experience: sqlx::types::Json(resume.experience),
            processing_status: resume.status.as_str().to_string(),
        };
        self.rows.lock().unwrap().push(row.clone());
        Ok(row)
    }

    async fn list_for_user(&self, user_id: Uuid) -> Result<Vec<Resume>> {
        let mut rows: Vec<Resume> = self
            .rows
            .lock()
            .unwrap()
            .iter()
            .filter(|r| r.user_id == user_id)
            .cloned()
            .collect();
        rows.sort_by(|a, b| b.uploaded_at.cmp(&a.uploaded_at));
        Ok(rows)
    }

    async fn find_by_id(&self, id: Uuid) -> Result<Option<Resume>> {
        Ok(self.rows.lock().unwrap().iter().find(|r| r.id == id).cloned())
    }

    async fn delete(&self, id: Uuid, user_id: Uuid) -> Result<bool> {
        let mut rows = self.rows.lock().unwrap();
        let before = rows.len();
        rows.retain(|r| !(r.id == id && r.user_id == user_id));
        Ok(rows.len() != before)
    }
}

/// Answers every prompt with the same canned model output and keeps the prompts.
pub struct ScriptedGenerator {
    pub reply: String,
    pub prompts: Mutex<Vec<String>>,
}

impl ScriptedGenerator {
    pub fn new(reply: JsonValue) -> Self {
        Self {
            reply: format!("```json\n{}\n```", reply),
            prompts: Mutex::new(Vec::new()),
        }
    }
}

#[async_trait]
impl TextGenerator for ScriptedGenerator {
    async fn generate(&self, prompt: &str) -> std::result::Result<String, GenAiError> {
        self.prompts.lock().unwrap().push(prompt.to_string());
        Ok(self.reply.clone())
    }
}

pub fn default_reply() -> JsonValue {
    json!({
        "anonymized_resume": "[NAME]\n[EMAIL]\nSenior engineer building data pipelines.",
        "technical_skills": ["Rust", "PostgreSQL", "Kubernetes"],
        "soft_skills": ["Mentoring"],
        "years_experience": "7",
        "key_achievements": ["Cut batch runtime by 40%"],
        "job_titles": ["Senior Engineer"]
    })
}

pub fn test_config(upload_folder: &Path) -> Config {
    Config {
        server_address: "127.0.0.1:0".into(),
        database_url: "postgres://unused".into(),
        database_max_connections: 1,
        jwt_secret: "integration-secret".into(),
        jwt_ttl_minutes: 60,
        gemini_api_key: Some("test-key".into()),
        genai_model: "test-model".into(),
        genai_base_url: "http://localhost".into(),
        anonymizer: AnonymizerConfig {
            max_retries: 1,
            initial_backoff: Duration::from_millis(1),
        },
        upload: UploadConfig {
            folder: upload_folder.to_path_buf(),
            ..UploadConfig::default()
        },
        auth_rps: 1000,
        mail: None,
    }
}

pub struct TestApp {
    pub router: Router,
    pub users: Arc<MemoryUsers>,
    pub resumes: Arc<MemoryResumes>,
    pub generator: Arc<ScriptedGenerator>,
    pub uploads: TempDir,
}

impl TestApp {
    pub fn new() -> Self {
        Self::with_config(|_| {})
    }

    pub fn with_config(adjust: impl FnOnce(&mut Config)) -> Self {
        let uploads = tempfile::tempdir().unwrap();
        let mut config = test_config(uploads.path());
        adjust(&mut config);

        let users = Arc::new(MemoryUsers::default());
        let resumes = Arc::new(MemoryResumes::default());
        let generator = Arc::new(ScriptedGenerator::new(default_reply()));
        let anonymizer = Arc::new(GenAiAnonymizer::new(
            generator.clone(),
            config.anonymizer.clone(),
        ));

        let state = AppState::from_parts(
            config,
            users.clone(),
            resumes.clone(),
            anonymizer,
            None,
        );

        Self {
            router: routes::router(state),
            users,
            resumes,
            generator,
            uploads,
        }
    }

    pub async fn send(&self, req: Request<Body>) -> (StatusCode, JsonValue) {
        let resp = self.router.clone().oneshot(req).await.unwrap();
        let status = resp.status();
        let bytes = to_bytes(resp.into_body(), usize::MAX).await.unwrap();
        let body = serde_json::from_slice(&bytes).unwrap_or(JsonValue::Null);
        (status, body)
    }

    pub async fn post_json(&self, uri: &str, body: JsonValue) -> (StatusCode, JsonValue) {
        self.send(
            Request::builder()
                .method("POST")
                .uri(uri)
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from(body.to_string()))
                .unwrap(),
        )
        .await
    }

    pub async fn authed(&self, method: &str, uri: &str, token: &str) -> (StatusCode, JsonValue) {
        self.send(
            Request::builder()
                .method(method)
                .uri(uri)
                .header(header::AUTHORIZATION, format!("Bearer {}", token))
                .body(Body::empty())
                .unwrap(),
        )
        .await
    }

    pub async fn upload(&self, token: &str, files: &[(&str, &str, Vec<u8>)]) -> (StatusCode, JsonValue) {
        self.send(
            Request::builder()
                .method("POST")
                .uri("/api/resumes/upload")
                .header(header::AUTHORIZATION, format!("Bearer {}", token))
                .header(
                    header::CONTENT_TYPE,
                    format!("multipart/form-data; boundary={}", BOUNDARY),
                )
                .body(Body::from(multipart_body(files)))
                .unwrap(),
        )
        .await
    }

    /// Signs up and logs in, returning the bearer token.
    pub async fn register(&self, email: &str) -> String {
        let password = "correct-horse-battery";
        let (status, _) = self
            .post_json(
                "/api/auth/signup",
                json!({ "email": email, "password": password, "confirm_password": password }),
            )
            .await;
        assert_eq!(status, StatusCode::CREATED);

        let (status, body) = self
            .post_json("/api/auth/login", json!({ "email": email, "password": password }))
            .await;
        assert_eq!(status, StatusCode::OK);
        body["access_token"].as_str().unwrap().to_string()
    }
}

/// Builds a multipart body from `(field name, filename, bytes)` parts.
pub fn multipart_body(files: &[(&str, &str, Vec<u8>)]) -> Vec<u8> {
    let mut body = Vec::new();
    for (field, filename, data) in files {
        body.extend_from_slice(format!("--{}\r\n", BOUNDARY).as_bytes());
        body.extend_from_slice(
            format!(
                "Content-Disposition: form-data; name=\"{}\"; filename=\"{}\"\r\n",
                field, filename
            )
            .as_bytes(),
        );
        body.extend_from_slice(b"Content-Type: application/pdf\r\n\r\n");
        body.extend_from_slice(data);
        body.extend_from_slice(b"\r\n");
    }
    body.extend_from_slice(format!("--{}--\r\n", BOUNDARY).as_bytes());
    body
}

/// Single-page PDF with one text line per entry.
pub fn pdf_with_lines(lines: &[&str]) -> Vec<u8> {
    let mut doc = Document::with_version("1.5");
    let pages_id = doc.new_object_id();
    let font_id = doc.add_object(dictionary! {
        "Type" => "Font",
        "Subtype" => "Type1",
        "BaseFont" => "Courier",
    });
    let resources_id = doc.add_object(dictionary! {
        "Font" => dictionary! { "F1" => font_id },
    });

    let mut operations = vec![
        Operation::new("BT", vec![]),
        Operation::new("Tf", vec!["F1".into(), 12.into()]),
        Operation::new("Td", vec![72.into(), 760.into()]),
    ];
    for line in lines {
        operations.push(Operation::new("Tj", vec![Object::string_literal(*line)]));
        operations.push(Operation::new("Td", vec![0.into(), (-16).into()]));
    }
    operations.push(Operation::new("ET", vec![]));

    let content = Content { operations };
    let content_id = doc.add_object(Stream::new(dictionary! {}, content.encode().unwrap()));
    let page_id = doc.add_object(dictionary! {
        "Type" => "Page",
        "Parent" => pages_id,
        "Contents" => content_id,
    });
    let pages = dictionary! {
        "Type" => "Pages",
        "Kids" => vec![page_id.into()],
        "Count" => 1,
        "Resources" => resources_id,
        "MediaBox" => vec![0.into(), 0.into(), 595.into(), 842.into()],
    };
    doc.objects.insert(pages_id, Object::Dictionary(pages));
    let catalog_id = doc.add_object(dictionary! {
        "Type" => "Catalog",
        "Pages" => pages_id,
    });
    doc.trailer.set("Root", catalog_id);

    let mut buf = Vec::new();
    doc.save_to(&mut buf).unwrap();
    buf
}
