pub mod auth_service;
pub mod gemini_service;
pub mod notification_service;
pub mod project_cache;
pub mod project_service;
pub mod quiz_service;
pub mod template_service;
