pub mod auth;
pub mod health;
pub mod preview;
pub mod projects;
