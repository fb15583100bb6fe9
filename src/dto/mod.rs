pub mod auth_dto;
pub mod resume_dto;
