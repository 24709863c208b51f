pub mod config;
pub mod database;
pub mod dto;
pub mod error;
pub mod middleware;
pub mod models;
pub mod routes;
pub mod services;
pub mod utils;

use std::sync::Arc;
use std::time::Duration;

use axum::{
    extract::DefaultBodyLimit,
    routing::{get, post, put},
    Router,
};
use reqwest::Client;
use sqlx::PgPool;
use tower_http::{compression::CompressionLayer, services::ServeDir, trace::TraceLayer};

use crate::services::{
    auth_service::AuthService,
    gemini_service::{GeminiService, TextGenerator},
    notification_service::NotificationService,
    project_cache::ProjectCache,
    project_service::ProjectService,
    quiz_service::QuizService,
};

const MAX_BODY_BYTES: usize = 5 * 1024 * 1024;

#[derive(Clone)]
pub struct AppState {
    pub pool: PgPool,
    pub auth_service: AuthService,
    pub project_service: ProjectService,
    pub quiz_service: QuizService,
}

impl AppState {
    pub fn new(pool: PgPool) -> Self {
        let config = crate::config::get_config();
        let http_client = Client::builder()
            .timeout(Duration::from_secs(config.ai_timeout_secs.max(1) + 10))
            .build()
            .unwrap_or_else(|e| {
                tracing::warn!(error = %e, "falling back to default HTTP client");
                Client::new()
            });

        let gemini = GeminiService::new(
            config.gemini_api_key.clone(),
            config.gemini_model.clone(),
            config.gemini_base_url.clone(),
            Duration::from_secs(config.ai_timeout_secs.max(1)),
            http_client.clone(),
        );
        Self::with_generator(pool, Arc::new(gemini), http_client)
    }

    /// Same wiring as [`AppState::new`] with the AI backend swapped out.
    pub fn with_generator(
        pool: PgPool,
        generator: Arc<dyn TextGenerator>,
        http_client: Client,
    ) -> Self {
        let config = crate::config::get_config();

        let notification_service =
            NotificationService::new(config.reset_webhook_url.clone(), http_client);
        let auth_service = AuthService::new(
            pool.clone(),
            notification_service,
            config.jwt_secret.clone(),
            config.jwt_ttl_hours,
            config.reset_token_ttl_minutes,
        );
        let project_service = ProjectService::new(pool.clone(), ProjectCache::new());
        let quiz_service = QuizService::new(generator, config.max_quiz_questions);

        Self {
            pool,
            auth_service,
            project_service,
            quiz_service,
        }
    }
}

pub fn build_router(state: AppState) -> Router {
    let config = crate::config::get_config();

    let base_routes = Router::new()
        .route("/health", get(routes::health::health))
        .route("/health/ready", get(routes::health::ready));

    let auth_api = Router::new()
        .route("/api/auth/sign-up", post(routes::auth::sign_up))
        .route("/api/auth/sign-in", post(routes::auth::sign_in))
        .route(
            "/api/auth/password-reset",
            post(routes::auth::request_password_reset),
        )
        .route(
            "/api/auth/password-reset/confirm",
            post(routes::auth::confirm_password_reset),
        )
        .route_layer(axum::middleware::from_fn_with_state(
            middleware::rate_limit::new_rps_state(
                config.auth_rps,
                config.trust_proxy_headers,
            ),
            middleware::rate_limit::rps_middleware,
        ));

    let user_api = Router::new()
        .route("/api/auth/me", get(routes::auth::me))
        .route(
            "/api/me/preferences",
            get(routes::auth::get_preferences).put(routes::auth::update_preferences),
        )
        .route("/api/projects", get(routes::projects::list_projects))
        .route(
            "/api/projects/generate",
            post(routes::projects::generate_project),
        )
        .route(
            "/api/projects/:id",
            get(routes::projects::get_project)
                .patch(routes::projects::rename_project)
                .delete(routes::projects::delete_project),
        )
        .route(
            "/api/projects/:id/code",
            put(routes::projects::save_project_code),
        )
        .route(
            "/api/projects/:id/preview",
            get(routes::preview::preview_project),
        )
        .route("/api/preview", post(routes::preview::preview_buffer))
        .route_layer(axum::middleware::from_fn_with_state(
            middleware::rate_limit::new_rps_state(
                config.api_rps,
                config.trust_proxy_headers,
            ),
            middleware::rate_limit::rps_middleware,
        ))
        .route_layer(axum::middleware::from_fn(
            middleware::auth::require_bearer_auth,
        ));

    let mut app = base_routes
        .merge(auth_api)
        .merge(user_api)
        .with_state(state);

    if let Some(dir) = config.static_dir.as_deref() {
        tracing::info!("Serving client from: {}", dir);
        app = app.fallback_service(ServeDir::new(dir));
    }

    app.layer(middleware::cors::cors_layer(&config.cors_origins))
        .layer(CompressionLayer::new())
        .layer(TraceLayer::new_for_http())
        .layer(DefaultBodyLimit::max(MAX_BODY_BYTES))
}
