pub mod config;
pub mod database;
pub mod dto;
pub mod error;
pub mod middleware;
pub mod models;
pub mod routes;
pub mod services;
pub mod utils;

use std::sync::Arc;

use crate::config::Config;
use crate::error::{Error, Result};
use crate::services::{
    anonymizer_service::{Anonymizer, GenAiAnonymizer},
    auth_service::AuthService,
    genai_service::GeminiClient,
    local_anonymizer::LocalAnonymizer,
    mail_service::{ResultMailer, SmtpMailer},
    resume_service::{ResumeService, ResumeStore},
    upload_service::UploadService,
    user_service::{UserService, UserStore},
};
use reqwest::Client;
use sqlx::PgPool;

#[derive(Clone)]
pub struct AppState {
    pub config: Arc<Config>,
    pub resumes: Arc<dyn ResumeStore>,
    pub auth_service: AuthService,
    pub upload_service: UploadService,
}

impl AppState {
    pub fn new(pool: PgPool, config: Config) -> Result<Self> {
        let anonymizer: Arc<dyn Anonymizer> = match &config.gemini_api_key {
            Some(api_key) => {
                let http_client = Client::builder()
                    .timeout(std::time::Duration::from_secs(120))
                    .build()
                    .map_err(|e| Error::Internal(format!("Failed to build HTTP client: {}", e)))?;
                let client = GeminiClient::new(
                    api_key.clone(),
                    config.genai_model.clone(),
                    config.genai_base_url.clone(),
                    http_client,
                );
                Arc::new(GenAiAnonymizer::new(Arc::new(client), config.anonymizer.clone()))
            }
            None => {
                tracing::warn!("GEMINI_API_KEY not set, using local anonymization only");
                Arc::new(LocalAnonymizer::new())
            }
        };

        let mailer = config
            .mail
            .clone()
            .map(|mail| Arc::new(SmtpMailer::new(mail)) as Arc<dyn ResultMailer>);
        if mailer.is_none() {
            tracing::info!("MAIL_SERVER not set, result emails disabled");
        }

        Ok(Self::from_parts(
            config,
            Arc::new(UserService::new(pool.clone())),
            Arc::new(ResumeService::new(pool)),
            anonymizer,
            mailer,
        ))
    }

    /// Assembles the state from already-built collaborators.
    pub fn from_parts(
        config: Config,
        users: Arc<dyn UserStore>,
        resumes: Arc<dyn ResumeStore>,
        anonymizer: Arc<dyn Anonymizer>,
        mailer: Option<Arc<dyn ResultMailer>>,
    ) -> Self {
        let auth_service =
            AuthService::new(users, config.jwt_secret.clone(), config.jwt_ttl_minutes);
        let upload_service =
            UploadService::new(resumes.clone(), anonymizer, mailer, config.upload.clone());

        Self {
            config: Arc::new(config),
            resumes,
            auth_service,
            upload_service,
        }
    }
}
