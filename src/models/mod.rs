pub mod password_reset;
pub mod project;
pub mod quiz;
pub mod user;
