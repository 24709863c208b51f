use axum::{
    extract::Request,
    http::{header::AUTHORIZATION, HeaderMap, StatusCode},
    middleware::Next,
    response::{IntoResponse, Json, Response},
};
use serde::{Deserialize, Serialize};
use serde_json::json;
use uuid::Uuid;

use crate::error::{Error, Result};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    pub sub: String,
    pub email: String,
    pub exp: usize,
}

impl Claims {
    pub fn user_id(&self) -> Option<Uuid> {
        Uuid::parse_str(&self.sub).ok()
    }

    pub fn require_user_id(&self) -> Result<Uuid> {
        self.user_id()
            .ok_or_else(|| Error::Unauthorized("invalid_token".to_string()))
    }
}

fn bearer_token(headers: &HeaderMap) -> std::result::Result<&str, &'static str> {
    let auth_header = headers.get(AUTHORIZATION).ok_or("missing_authorization")?;
    let auth_str = auth_header.to_str().map_err(|_| "bad_authorization")?;
    auth_str.strip_prefix("Bearer ").ok_or("unsupported_scheme")
}

fn reject(code: &str) -> Response {
    (StatusCode::UNAUTHORIZED, Json(json!({ "error": code }))).into_response()
}

/// Validates the session JWT and stores its [`Claims`] in request extensions.
pub async fn require_bearer_auth(mut req: Request, next: Next) -> Response {
    let token = match bearer_token(req.headers()) {
        Ok(token) => token,
        Err(code) => return reject(code),
    };

    let config = crate::config::get_config();
    match crate::utils::token::decode_session_token(token, &config.jwt_secret) {
        Ok(claims) if claims.user_id().is_some() => {
            req.extensions_mut().insert(claims);
            next.run(req).await
        }
        _ => reject("invalid_token"),
    }
}
