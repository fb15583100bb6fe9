use async_trait::async_trait;
use lettre::message::header::ContentType;
use lettre::message::Mailbox;
use lettre::transport::smtp::authentication::Credentials;
use lettre::{Message, SmtpTransport, Transport};

use crate::config::MailConfig;

pub const RESULTS_SUBJECT: &str = "Your Fair-Scan Anonymized Resume";

const AUTH_HINT: &str = "If you are using Gmail, ensure that either: \
    you have enabled 2-Step Verification and are using an App Password (recommended), or \
    your account allows SMTP access and the credentials in MAIL_USERNAME/MAIL_PASSWORD are correct. \
    See: https://support.google.com/mail/?p=BadCredentials";

#[derive(Debug, thiserror::Error)]
pub enum MailError {
    #[error("Error sending email: Authentication failed: {0}. {hint}", hint = AUTH_HINT)]
    Authentication(String),

    #[error("Error sending email: SMTP error: {0}. Check MAIL_SERVER, MAIL_PORT, and TLS settings.")]
    Smtp(String),

    #[error("Error sending email: {0}")]
    Message(String),
}

impl MailError {
    fn from_smtp(err: lettre::transport::smtp::Error) -> Self {
        let msg = err.to_string();
        let lower = msg.to_lowercase();
        if lower.contains("535") || lower.contains("authentication") || lower.contains("credentials") {
            MailError::Authentication(msg)
        } else {
            MailError::Smtp(msg)
        }
    }
}

/// Content of the results notification.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ResultsEmail {
    pub anonymized_text: String,
    pub technical_skills: Vec<String>,
    pub key_achievements: Vec<String>,
}

impl ResultsEmail {
    pub fn render_html(&self) -> String {
        format!(
            r#"<html>
    <body style="font-family: Arial, sans-serif; line-height: 1.6; color: #333;">
        <h2 style="color: #1a3a4a;">Your Anonymized Resume from Fair-Scan</h2>
        <p>Your resume has been successfully processed and anonymized. Here are your results:</p>
        <h3 style="color: #00b4d8; margin-top: 30px;">Anonymized Resume</h3>
        <div style="background-color: #f5f5f5; padding: 15px; border-left: 4px solid #00b4d8; margin: 15px 0;">
            <pre style="white-space: pre-wrap; word-wrap: break-word;">{resume}</pre>
        </div>
        <h3 style="color: #00b4d8; margin-top: 30px;">Extracted Skills</h3>
        <ul>{skills}</ul>
        <h3 style="color: #00b4d8; margin-top: 30px;">Key Achievements</h3>
        <ul>{achievements}</ul>
        <hr style="border: none; border-top: 1px solid #ddd; margin: 30px 0;">
        <p style="color: #666; font-size: 12px;">
            This email contains your anonymized resume data.
            Fair-Scan is committed to promoting fair and unbiased hiring practices.
        </p>
    </body>
</html>"#,
            resume = escape_html(&self.anonymized_text),
            skills = list_items(&self.technical_skills),
            achievements = list_items(&self.key_achievements),
        )
    }
}

fn list_items(items: &[String]) -> String {
    items
        .iter()
        .map(|item| format!("<li>{}</li>", escape_html(item)))
        .collect()
}

fn escape_html(raw: &str) -> String {
    let mut out = String::with_capacity(raw.len());
    for c in raw.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            other => out.push(other),
        }
    }
    out
}

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait ResultMailer: Send + Sync {
    async fn send_results(&self, recipient: &str, email: &ResultsEmail) -> Result<(), MailError>;
}

#[derive(Clone)]
pub struct SmtpMailer {
    config: MailConfig,
}

impl SmtpMailer {
    pub fn new(config: MailConfig) -> Self {
        Self { config }
    }

    fn transport(&self) -> Result<SmtpTransport, MailError> {
        let cfg = &self.config;
        let builder = if cfg.use_ssl {
            SmtpTransport::relay(&cfg.server).map_err(MailError::from_smtp)?
        } else if cfg.use_tls {
            SmtpTransport::starttls_relay(&cfg.server).map_err(MailError::from_smtp)?
        } else {
            SmtpTransport::builder_dangerous(&cfg.server)
        };

        let builder = builder.port(cfg.port);
        let builder = match (&cfg.username, &cfg.password) {
            (Some(user), Some(pass)) => {
                builder.credentials(Credentials::new(user.clone(), pass.clone()))
            }
            _ => builder,
        };
        Ok(builder.build())
    }

    fn build_message(&self, recipient: &str, email: &ResultsEmail) -> Result<Message, MailError> {
        let from: Mailbox = self
            .config
            .default_sender
            .parse()
            .map_err(|e| MailError::Message(format!("invalid sender address: {}", e)))?;
        let to: Mailbox = recipient
            .parse()
            .map_err(|e| MailError::Message(format!("invalid recipient address: {}", e)))?;

        Message::builder()
            .from(from)
            .to(to)
            .subject(RESULTS_SUBJECT)
            .header(ContentType::TEXT_HTML)
            .body(email.render_html())
            .map_err(|e| MailError::Message(e.to_string()))
    }
}

#[async_trait]
impl ResultMailer for SmtpMailer {
    async fn send_results(&self, recipient: &str, email: &ResultsEmail) -> Result<(), MailError> {
        let message = self.build_message(recipient, email)?;
        let transport = self.transport()?;

        tokio::task::spawn_blocking(move || transport.send(&message))
            .await
            .map_err(|e| MailError::Message(format!("mail task failed: {}", e)))?
            .map_err(MailError::from_smtp)?;

        tracing::info!(recipient, "Results email sent");
        Ok(())
    }
}
