use chrono::{DateTime, Duration, Utc};
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use rand::{distributions::Alphanumeric, thread_rng, Rng};
use uuid::Uuid;

use crate::config::MAX_SESSION_TTL_HOURS;
use crate::middleware::auth::Claims;

pub fn generate_access_token(length: usize) -> String {
    thread_rng()
        .sample_iter(&Alphanumeric)
        .take(length)
        .map(char::from)
        .collect()
}

pub struct IssuedToken {
    pub token: String,
    pub expires_at: DateTime<Utc>,
}

pub fn issue_session_token(
    user_id: Uuid,
    email: &str,
    secret: &str,
    ttl_hours: i64,
) -> jsonwebtoken::errors::Result<IssuedToken> {
    let ttl_hours = ttl_hours.clamp(1, MAX_SESSION_TTL_HOURS);
    let expires_at = Utc::now() + Duration::hours(ttl_hours);
    let claims = Claims {
        sub: user_id.to_string(),
        email: email.to_string(),
        exp: expires_at.timestamp() as usize,
    };
    let token = encode(
        &Header::new(Algorithm::HS256),
        &claims,
        &EncodingKey::from_secret(secret.as_bytes()),
    )?;
    Ok(IssuedToken { token, expires_at })
}

pub fn decode_session_token(token: &str, secret: &str) -> jsonwebtoken::errors::Result<Claims> {
    let mut validation = Validation::new(Algorithm::HS256);
    validation.validate_exp = true;
    let data = decode::<Claims>(
        token,
        &DecodingKey::from_secret(secret.as_bytes()),
        &validation,
    )?;
    Ok(data.claims)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn access_token_is_alphanumeric_of_requested_length() {
        let t = generate_access_token(48);
        assert_eq!(t.len(), 48);
        assert!(t.chars().all(|c| c.is_ascii_alphanumeric()));
    }

    #[test]
    fn session_token_decodes_with_same_secret_only() {
        let id = Uuid::new_v4();
        let issued = issue_session_token(id, "a@b.io", "s3cret", 1).unwrap();
        let claims = decode_session_token(&issued.token, "s3cret").unwrap();
        assert_eq!(claims.user_id(), Some(id));
        assert_eq!(claims.email, "a@b.io");
        assert!(decode_session_token(&issued.token, "other").is_err());
    }

    #[test]
    fn absurd_ttl_is_clamped_instead_of_overflowing() {
        let issued =
            issue_session_token(Uuid::new_v4(), "a@b.io", "s3cret", i64::MAX).unwrap();
        let max = Utc::now() + Duration::hours(MAX_SESSION_TTL_HOURS);
        assert!(issued.expires_at <= max);
        assert!(decode_session_token(&issued.token, "s3cret").is_ok());
    }
}
