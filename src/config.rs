use crate::error::{Error, Result};
use dotenvy::dotenv;
use std::env;
use std::path::PathBuf;
use std::time::Duration;

pub const DEFAULT_GENAI_MODEL: &str = "gemini-2.0-flash-lite";
pub const DEFAULT_GENAI_BASE_URL: &str = "https://generativelanguage.googleapis.com/v1beta";

#[derive(Debug, Clone)]
pub struct Config {
    pub server_address: String,
    pub database_url: String,
    pub database_max_connections: u32,
    pub jwt_secret: String,
    pub jwt_ttl_minutes: i64,
    pub gemini_api_key: Option<String>,
    pub genai_model: String,
    pub genai_base_url: String,
    pub anonymizer: AnonymizerConfig,
    pub upload: UploadConfig,
    pub auth_rps: u32,
    pub mail: Option<MailConfig>,
}

/// Retry policy for the remote anonymization call.
#[derive(Debug, Clone, PartialEq)]
pub struct AnonymizerConfig {
    pub max_retries: u32,
    pub initial_backoff: Duration,
}

impl Default for AnonymizerConfig {
    fn default() -> Self {
        Self {
            max_retries: 3,
            initial_backoff: Duration::from_secs(2),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct UploadConfig {
    pub folder: PathBuf,
    pub allowed_extensions: Vec<String>,
    pub max_content_length: usize,
}

impl Default for UploadConfig {
    fn default() -> Self {
        Self {
            folder: PathBuf::from("./uploads"),
            allowed_extensions: vec!["pdf".to_string()],
            max_content_length: 16 * 1024 * 1024,
        }
    }
}

#[derive(Debug, Clone)]
pub struct MailConfig {
    pub server: String,
    pub port: u16,
    pub use_tls: bool,
    pub use_ssl: bool,
    pub username: Option<String>,
    pub password: Option<String>,
    pub default_sender: String,
}

impl Config {
    pub fn from_env() -> Result<Self> {
        dotenv().ok();

        let backoff_secs: f64 = get_env_parse_or("GENAI_INITIAL_BACKOFF", 2.0)?;
        if !backoff_secs.is_finite() || backoff_secs < 0.0 {
            return Err(Error::Config(format!(
                "Invalid value for GENAI_INITIAL_BACKOFF: {}",
                backoff_secs
            )));
        }

        let upload_defaults = UploadConfig::default();
        let allowed_extensions = match get_env_opt("ALLOWED_EXTENSIONS") {
            Some(raw) => parse_extensions(&raw),
            None => upload_defaults.allowed_extensions,
        };

        Ok(Self {
            server_address: get_env_or("SERVER_ADDRESS", "0.0.0.0:5000"),
            database_url: get_env("DATABASE_URL")?,
            database_max_connections: get_env_parse_or("DATABASE_MAX_CONNECTIONS", 10)?,
            jwt_secret: get_env("JWT_SECRET")?,
            jwt_ttl_minutes: get_env_parse_or("JWT_TTL_MINUTES", 24 * 60)?,
            gemini_api_key: get_env_opt("GEMINI_API_KEY"),
            genai_model: get_env_or("GENAI_MODEL", DEFAULT_GENAI_MODEL),
            genai_base_url: get_env_or("GENAI_BASE_URL", DEFAULT_GENAI_BASE_URL),
            anonymizer: AnonymizerConfig {
                max_retries: get_env_parse_or("GENAI_MAX_RETRIES", 3)?,
                initial_backoff: Duration::from_secs_f64(backoff_secs),
            },
            upload: UploadConfig {
                folder: PathBuf::from(get_env_or("UPLOAD_FOLDER", "./uploads")),
                allowed_extensions,
                max_content_length: get_env_parse_or(
                    "MAX_CONTENT_LENGTH",
                    upload_defaults.max_content_length,
                )?,
            },
            auth_rps: get_env_parse_or("AUTH_RPS", 20)?,
            mail: mail_config_from_env()?,
        })
    }
}

fn mail_config_from_env() -> Result<Option<MailConfig>> {
    let Some(server) = get_env_opt("MAIL_SERVER") else {
        return Ok(None);
    };
    let username = get_env_opt("MAIL_USERNAME");
    let default_sender = match get_env_opt("MAIL_DEFAULT_SENDER").or_else(|| username.clone()) {
        Some(sender) => sender,
        None => {
            return Err(Error::Config(
                "Missing environment variable: MAIL_DEFAULT_SENDER".to_string(),
            ))
        }
    };

    Ok(Some(MailConfig {
        server,
        port: get_env_parse_or("MAIL_PORT", 587)?,
        use_tls: get_env_parse_or("MAIL_USE_TLS", true)?,
        use_ssl: get_env_parse_or("MAIL_USE_SSL", false)?,
        username,
        password: get_env_opt("MAIL_PASSWORD"),
        default_sender,
    }))
}

/// Splits a comma separated extension list, normalising case and leading dots.
pub fn parse_extensions(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(|ext| ext.trim().trim_start_matches('.').to_lowercase())
        .filter(|ext| !ext.is_empty())
        .collect()
}

fn get_env(name: &str) -> Result<String> {
    env::var(name).map_err(|_| Error::Config(format!("Missing environment variable: {}", name)))
}

fn get_env_opt(name: &str) -> Option<String> {
    env::var(name).ok().filter(|v| !v.trim().is_empty())
}

fn get_env_or(name: &str, default: &str) -> String {
    get_env_opt(name).unwrap_or_else(|| default.to_string())
}

fn get_env_parse_or<T>(name: &str, default: T) -> Result<T>
where
    T: std::str::FromStr,
    T::Err: std::fmt::Display,
{
    match get_env_opt(name) {
        Some(raw) => raw
            .trim()
            .parse()
            .map_err(|e| Error::Config(format!("Invalid value for {}: {}", name, e))),
        None => Ok(default),
    }
}
