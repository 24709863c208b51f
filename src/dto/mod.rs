pub mod auth_dto;
pub mod project_dto;
pub mod quiz_dto;
