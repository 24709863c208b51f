use axum::{
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Json},
    Extension,
};

use crate::{
    dto::auth_dto::{
        PasswordResetAccepted, PasswordResetConfirmPayload, PasswordResetRequestPayload,
        PreferencesPayload, PreferencesResponse, SessionResponse, SignInPayload, SignUpPayload,
        UserResponse,
    },
    error::Result,
    middleware::auth::Claims,
    models::user::Theme,
    AppState,
};

#[utoipa::path(
    post,
    path = "/api/auth/sign-up",
    request_body = SignUpPayload,
    responses(
        (status = 201, description = "Account created and signed in", body = Json<SessionResponse>),
        (status = 400, description = "Invalid email or password"),
        (status = 409, description = "Email already registered")
    )
)]
#[axum::debug_handler]
pub async fn sign_up(
    State(state): State<AppState>,
    Json(payload): Json<SignUpPayload>,
) -> Result<impl IntoResponse> {
    let session = state.auth_service.sign_up(payload).await?;
    Ok((StatusCode::CREATED, Json(session)))
}

#[utoipa::path(
    post,
    path = "/api/auth/sign-in",
    request_body = SignInPayload,
    responses(
        (status = 200, description = "Signed in", body = Json<SessionResponse>),
        (status = 401, description = "Invalid email or password")
    )
)]
#[axum::debug_handler]
pub async fn sign_in(
    State(state): State<AppState>,
    Json(payload): Json<SignInPayload>,
) -> Result<impl IntoResponse> {
    let session = state.auth_service.sign_in(payload).await?;
    Ok(Json(session))
}

#[utoipa::path(
    get,
    path = "/api/auth/me",
    responses(
        (status = 200, description = "Current user", body = Json<UserResponse>),
        (status = 401, description = "Missing or invalid session")
    )
)]
#[axum::debug_handler]
pub async fn me(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
) -> Result<impl IntoResponse> {
    let user = state.auth_service.get_user(claims.require_user_id()?).await?;
    Ok(Json(UserResponse::from(&user)))
}

#[utoipa::path(
    post,
    path = "/api/auth/password-reset",
    request_body = PasswordResetRequestPayload,
    responses(
        (status = 202, description = "Reset issued if the account exists", body = Json<PasswordResetAccepted>),
        (status = 400, description = "Email missing or malformed")
    )
)]
#[axum::debug_handler]
pub async fn request_password_reset(
    State(state): State<AppState>,
    Json(payload): Json<PasswordResetRequestPayload>,
) -> Result<impl IntoResponse> {
    state.auth_service.request_password_reset(payload).await?;
    Ok((
        StatusCode::ACCEPTED,
        Json(PasswordResetAccepted {
            status: "sent".to_string(),
        }),
    ))
}

#[utoipa::path(
    post,
    path = "/api/auth/password-reset/confirm",
    request_body = PasswordResetConfirmPayload,
    responses(
        (status = 204, description = "Password changed"),
        (status = 400, description = "Invalid token or password")
    )
)]
#[axum::debug_handler]
pub async fn confirm_password_reset(
    State(state): State<AppState>,
    Json(payload): Json<PasswordResetConfirmPayload>,
) -> Result<impl IntoResponse> {
    state.auth_service.confirm_password_reset(payload).await?;
    Ok(StatusCode::NO_CONTENT)
}

#[utoipa::path(
    get,
    path = "/api/me/preferences",
    responses(
        (status = 200, description = "Stored preferences", body = Json<PreferencesResponse>)
    )
)]
#[axum::debug_handler]
pub async fn get_preferences(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
) -> Result<impl IntoResponse> {
    let user = state.auth_service.get_user(claims.require_user_id()?).await?;
    Ok(Json(PreferencesResponse {
        theme: Theme::from_stored(&user.theme),
    }))
}

#[utoipa::path(
    put,
    path = "/api/me/preferences",
    request_body = PreferencesPayload,
    responses(
        (status = 200, description = "Preferences updated", body = Json<PreferencesResponse>),
        (status = 400, description = "Unknown theme")
    )
)]
#[axum::debug_handler]
pub async fn update_preferences(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Json(payload): Json<PreferencesPayload>,
) -> Result<impl IntoResponse> {
    let user = state
        .auth_service
        .set_theme(claims.require_user_id()?, payload.theme)
        .await?;
    Ok(Json(PreferencesResponse {
        theme: Theme::from_stored(&user.theme),
    }))
}
