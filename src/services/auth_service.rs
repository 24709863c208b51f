use chrono::{Duration, Utc};
use sqlx::PgPool;
use uuid::Uuid;
use validator::Validate;

use crate::config::MAX_RESET_TTL_MINUTES;
use crate::dto::auth_dto::{
    PasswordResetConfirmPayload, PasswordResetRequestPayload, SessionResponse, SignInPayload,
    SignUpPayload, UserResponse,
};
use crate::error::{Error, Result};
use crate::models::password_reset::PasswordReset;
use crate::models::user::{Theme, User};
use crate::services::notification_service::NotificationService;
use crate::utils::{crypto, token};

pub const MIN_PASSWORD_LEN: usize = 6;
const RESET_TOKEN_LEN: usize = 48;
const INVALID_CREDENTIALS: &str = "Invalid email or password";
const INVALID_RESET_TOKEN: &str = "Invalid or expired reset token";

const USER_COLUMNS: &str = "id, email, password_hash, theme, created_at, updated_at";

#[derive(Clone)]
pub struct AuthService {
    pool: PgPool,
    notifier: NotificationService,
    jwt_secret: String,
    jwt_ttl_hours: i64,
    reset_ttl_minutes: i64,
}

pub fn normalize_email(email: &str) -> String {
    email.trim().to_lowercase()
}

/// Mismatch is reported before length, matching the sign-up form.
pub fn validate_new_password(password: &str, confirm: &str) -> Result<()> {
    if password != confirm {
        return Err(Error::BadRequest("Passwords do not match".to_string()));
    }
    if password.chars().count() < MIN_PASSWORD_LEN {
        return Err(Error::BadRequest("Password too short".to_string()));
    }
    Ok(())
}

impl AuthService {
    pub fn new(
        pool: PgPool,
        notifier: NotificationService,
        jwt_secret: String,
        jwt_ttl_hours: i64,
        reset_ttl_minutes: i64,
    ) -> Self {
        Self {
            pool,
            notifier,
            jwt_secret,
            jwt_ttl_hours,
            reset_ttl_minutes,
        }
    }

    pub async fn sign_up(&self, mut payload: SignUpPayload) -> Result<SessionResponse> {
        payload.email = normalize_email(&payload.email);
        payload.validate()?;
        validate_new_password(&payload.password, &payload.confirm_password)?;

        let password_hash = crypto::hash_password(&payload.password)?;
        let query = format!(
            "INSERT INTO users (id, email, password_hash) VALUES ($1, $2, $3) RETURNING {}",
            USER_COLUMNS
        );
        let user = sqlx::query_as::<_, User>(&query)
            .bind(Uuid::new_v4())
            .bind(&payload.email)
            .bind(&password_hash)
            .fetch_one(&self.pool)
            .await
            .map_err(|e| match e {
                sqlx::Error::Database(db) if db.is_unique_violation() => {
                    Error::Conflict("An account with this email already exists".to_string())
                }
                other => Error::from(other),
            })?;

        tracing::info!(user_id = %user.id, "account created");
        self.session_for(&user)
    }

    pub async fn sign_in(&self, mut payload: SignInPayload) -> Result<SessionResponse> {
        payload.email = normalize_email(&payload.email);
        payload.validate()?;

        let user = self
            .find_by_email(&payload.email)
            .await?
            .ok_or_else(|| Error::Unauthorized(INVALID_CREDENTIALS.to_string()))?;

        if !crypto::verify_password(&payload.password, &user.password_hash)? {
            tracing::info!(user_id = %user.id, "rejected sign-in");
            return Err(Error::Unauthorized(INVALID_CREDENTIALS.to_string()));
        }

        self.session_for(&user)
    }

    pub async fn get_user(&self, id: Uuid) -> Result<User> {
        let query = format!("SELECT {} FROM users WHERE id = $1", USER_COLUMNS);
        sqlx::query_as::<_, User>(&query)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?
            .ok_or_else(|| Error::Unauthorized("Account no longer exists".to_string()))
    }

    pub async fn set_theme(&self, id: Uuid, theme: Theme) -> Result<User> {
        let query = format!(
            "UPDATE users SET theme = $2, updated_at = NOW() WHERE id = $1 RETURNING {}",
            USER_COLUMNS
        );
        let user = sqlx::query_as::<_, User>(&query)
            .bind(id)
            .bind(theme.as_str())
            .fetch_one(&self.pool)
            .await?;
        Ok(user)
    }

    /// Always succeeds for a well-formed address so callers cannot learn
    /// which emails have accounts.
    pub async fn request_password_reset(&self, payload: PasswordResetRequestPayload) -> Result<()> {
        let email = normalize_email(&payload.email);
        PasswordResetRequestPayload {
            email: email.clone(),
        }
        .validate()?;

        let Some(user) = self.find_by_email(&email).await? else {
            tracing::debug!("password reset requested for unknown email");
            return Ok(());
        };

        let raw_token = token::generate_access_token(RESET_TOKEN_LEN);
        let digest = crypto::token_digest(&raw_token, &self.jwt_secret);
        let ttl = self.reset_ttl_minutes.clamp(1, MAX_RESET_TTL_MINUTES);
        let expires_at = Utc::now() + Duration::minutes(ttl);

        sqlx::query(
            r#"INSERT INTO password_resets (id, user_id, token_digest, expires_at)
               VALUES ($1, $2, $3, $4)"#,
        )
        .bind(Uuid::new_v4())
        .bind(user.id)
        .bind(&digest)
        .bind(expires_at)
        .execute(&self.pool)
        .await?;

        tracing::info!(user_id = %user.id, "password reset issued");
        // Same answer as for unknown emails, even when delivery fails.
        if let Err(e) = self
            .notifier
            .deliver_password_reset(&user.email, &raw_token, expires_at)
            .await
        {
            tracing::error!(user_id = %user.id, error = %e, "password reset delivery failed");
        }
        Ok(())
    }

    pub async fn confirm_password_reset(&self, payload: PasswordResetConfirmPayload) -> Result<()> {
        payload.validate()?;
        validate_new_password(&payload.password, &payload.confirm_password)?;

        let digest = crypto::token_digest(payload.token.trim(), &self.jwt_secret);
        let mut tx = self.pool.begin().await?;

        let reset = sqlx::query_as::<_, PasswordReset>(
            r#"SELECT id, user_id, token_digest, expires_at, used_at, created_at
               FROM password_resets WHERE token_digest = $1 FOR UPDATE"#,
        )
        .bind(&digest)
        .fetch_optional(&mut *tx)
        .await?
        .filter(|r| r.is_redeemable(Utc::now()))
        .ok_or_else(|| Error::BadRequest(INVALID_RESET_TOKEN.to_string()))?;

        let password_hash = crypto::hash_password(&payload.password)?;
        sqlx::query("UPDATE users SET password_hash = $2, updated_at = NOW() WHERE id = $1")
            .bind(reset.user_id)
            .bind(&password_hash)
            .execute(&mut *tx)
            .await?;
        sqlx::query("UPDATE password_resets SET used_at = NOW() WHERE id = $1")
            .bind(reset.id)
            .execute(&mut *tx)
            .await?;
        tx.commit().await?;

        tracing::info!(user_id = %reset.user_id, "password reset completed");
        Ok(())
    }

    async fn find_by_email(&self, email: &str) -> Result<Option<User>> {
        let query = format!("SELECT {} FROM users WHERE email = $1", USER_COLUMNS);
        let user = sqlx::query_as::<_, User>(&query)
            .bind(email)
            .fetch_optional(&self.pool)
            .await?;
        Ok(user)
    }

    fn session_for(&self, user: &User) -> Result<SessionResponse> {
        let issued = token::issue_session_token(
            user.id,
            &user.email,
            &self.jwt_secret,
            self.jwt_ttl_hours,
        )?;
        Ok(SessionResponse {
            access_token: issued.token,
            token_type: "Bearer".to_string(),
            expires_at: issued.expires_at,
            user: UserResponse::from(user),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn mismatch_is_reported_before_length() {
        let err = validate_new_password("abc", "abd").unwrap_err();
        assert!(matches!(err, Error::BadRequest(m) if m == "Passwords do not match"));

        let err = validate_new_password("abc", "abc").unwrap_err();
        assert!(matches!(err, Error::BadRequest(m) if m == "Password too short"));

        assert!(validate_new_password("abcdef", "abcdef").is_ok());
    }

    #[test]
    fn emails_are_trimmed_and_lowercased() {
        assert_eq!(normalize_email("  Tamim@Example.COM "), "tamim@example.com");
    }
}
