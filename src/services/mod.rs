pub mod anonymizer_service;
pub mod auth_service;
pub mod genai_service;
pub mod local_anonymizer;
pub mod mail_service;
pub mod pdf_service;
pub mod result_assembler;
pub mod resume_service;
pub mod upload_service;
pub mod user_service;
