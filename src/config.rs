use crate::error::{Error, Result};
use dotenvy::dotenv;
use std::env;
use std::sync::OnceLock;

pub const DEFAULT_GEMINI_MODEL: &str = "gemini-2.5-flash";
pub const DEFAULT_GEMINI_BASE_URL: &str = "https://generativelanguage.googleapis.com";
pub const MAX_SESSION_TTL_HOURS: i64 = 24 * 366;
pub const MAX_RESET_TTL_MINUTES: i64 = 24 * 60;

#[derive(Debug, Clone)]
pub struct Config {
    pub server_address: String,
    pub database_url: String,
    pub jwt_secret: String,
    pub jwt_ttl_hours: i64,
    pub gemini_api_key: Option<String>,
    pub gemini_model: String,
    pub gemini_base_url: String,
    pub ai_timeout_secs: u64,
    pub max_quiz_questions: u32,
    pub api_rps: u32,
    pub auth_rps: u32,
    pub reset_token_ttl_minutes: i64,
    pub reset_webhook_url: Option<String>,
    pub trust_proxy_headers: bool,
    pub cors_origins: Vec<String>,
    pub static_dir: Option<String>,
}

pub static CONFIG: OnceLock<Config> = OnceLock::new();

impl Config {
    pub fn from_env() -> Result<Self> {
        dotenv().ok();

        let gemini_base_url =
            get_env_or("GEMINI_BASE_URL", DEFAULT_GEMINI_BASE_URL.to_string());
        url::Url::parse(&gemini_base_url)
            .map_err(|e| Error::Config(format!("Invalid value for GEMINI_BASE_URL: {}", e)))?;

        Ok(Self {
            server_address: get_env("SERVER_ADDRESS")?,
            database_url: get_env("DATABASE_URL")?,
            jwt_secret: get_env("JWT_SECRET")?,
            jwt_ttl_hours: get_env_bounded("JWT_TTL_HOURS", 168, 1, MAX_SESSION_TTL_HOURS)?,
            gemini_api_key: get_env_opt("GEMINI_API_KEY"),
            gemini_model: get_env_or("GEMINI_MODEL", DEFAULT_GEMINI_MODEL.to_string()),
            gemini_base_url: gemini_base_url.trim_end_matches('/').to_string(),
            ai_timeout_secs: get_env_bounded("AI_TIMEOUT_SECS", 120, 1, 3600)?,
            max_quiz_questions: get_env_bounded("MAX_QUIZ_QUESTIONS", 50, 1, 500)?,
            api_rps: get_env_parse_or("API_RPS", 50)?,
            auth_rps: get_env_parse_or("AUTH_RPS", 10)?,
            reset_token_ttl_minutes: get_env_bounded(
                "RESET_TOKEN_TTL_MINUTES",
                30,
                1,
                MAX_RESET_TTL_MINUTES,
            )?,
            reset_webhook_url: get_env_opt("RESET_WEBHOOK_URL"),
            trust_proxy_headers: get_env_parse_or("TRUST_PROXY_HEADERS", false)?,
            cors_origins: get_env_opt("CORS_ORIGINS")
                .map(|raw| {
                    raw.split(',')
                        .map(str::trim)
                        .filter(|s| !s.is_empty())
                        .map(str::to_string)
                        .collect()
                })
                .unwrap_or_default(),
            static_dir: get_env_opt("STATIC_DIR"),
        })
    }
}

fn get_env(name: &str) -> Result<String> {
    env::var(name).map_err(|_| Error::Config(format!("Missing environment variable: {}", name)))
}

fn get_env_opt(name: &str) -> Option<String> {
    env::var(name).ok().filter(|v| !v.trim().is_empty())
}

fn get_env_or(name: &str, default: String) -> String {
    get_env_opt(name).unwrap_or(default)
}

fn get_env_parse_or<T>(name: &str, default: T) -> Result<T>
where
    T: std::str::FromStr,
    T::Err: std::fmt::Display,
{
    match get_env_opt(name) {
        Some(raw) => raw
            .parse()
            .map_err(|e| Error::Config(format!("Invalid value for {}: {}", name, e))),
        None => Ok(default),
    }
}

fn get_env_bounded<T>(name: &str, default: T, min: T, max: T) -> Result<T>
where
    T: std::str::FromStr + PartialOrd + std::fmt::Display,
    T::Err: std::fmt::Display,
{
    check_bounds(name, get_env_parse_or(name, default)?, min, max)
}

fn check_bounds<T>(name: &str, value: T, min: T, max: T) -> Result<T>
where
    T: PartialOrd + std::fmt::Display,
{
    if value < min || value > max {
        return Err(Error::Config(format!(
            "{} must be between {} and {}, got {}",
            name, min, max, value
        )));
    }
    Ok(value)
}

pub fn init_config() -> Result<()> {
    let config = Config::from_env()?;
    CONFIG
        .set(config)
        .map_err(|_| Error::Config("Configuration has already been initialized".to_string()))?;
    Ok(())
}

pub fn get_config() -> &'static Config {
    CONFIG
        .get()
        .expect("Configuration has not been initialized")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn out_of_range_durations_are_config_errors() {
        let ok = check_bounds("JWT_TTL_HOURS", 168, 1, MAX_SESSION_TTL_HOURS).unwrap();
        assert_eq!(ok, 168);

        let err = check_bounds("JWT_TTL_HOURS", i64::MAX, 1, MAX_SESSION_TTL_HOURS).unwrap_err();
        assert!(
            matches!(err, Error::Config(msg) if msg.starts_with("JWT_TTL_HOURS must be between"))
        );
        assert!(check_bounds("RESET_TOKEN_TTL_MINUTES", 0, 1, MAX_RESET_TTL_MINUTES).is_err());
    }
}
