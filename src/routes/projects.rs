use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::{IntoResponse, Json},
    Extension,
};
use uuid::Uuid;
use validator::Validate;

use crate::{
    dto::{
        project_dto::{
            GeneratedProjectResponse, ProjectListResponse, ProjectResponse,
            RenameProjectPayload, SaveCodePayload,
        },
        quiz_dto::QuizConfig,
    },
    error::Result,
    middleware::auth::Claims,
    services::project_service::NewProject,
    AppState,
};

#[utoipa::path(
    post,
    path = "/api/projects/generate",
    request_body = QuizConfig,
    responses(
        (status = 201, description = "Quiz generated and stored", body = Json<GeneratedProjectResponse>),
        (status = 400, description = "Missing required fields or bad question count"),
        (status = 502, description = "AI service failed or returned unusable output"),
        (status = 503, description = "AI service not configured")
    )
)]
#[axum::debug_handler]
pub async fn generate_project(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Json(config): Json<QuizConfig>,
) -> Result<impl IntoResponse> {
    let user_id = claims.require_user_id()?;
    config.validate()?;

    let quiz = state.quiz_service.generate(&config).await?;
    let project = state
        .project_service
        .create(
            user_id,
            NewProject {
                name: config.project_name(),
                code: quiz.html,
                subject: Some(config.subject.trim().to_string()),
                topic: Some(config.topic.trim().to_string()),
            },
        )
        .await?;

    Ok((
        StatusCode::CREATED,
        Json(GeneratedProjectResponse {
            project: ProjectResponse::from(project),
            question_count: quiz.question_count,
        }),
    ))
}

#[utoipa::path(
    get,
    path = "/api/projects",
    responses(
        (status = 200, description = "Projects, newest first", body = Json<ProjectListResponse>)
    )
)]
#[axum::debug_handler]
pub async fn list_projects(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
) -> Result<impl IntoResponse> {
    let items = state
        .project_service
        .list(claims.require_user_id()?)
        .await?;
    Ok(Json(ProjectListResponse {
        items: items.into_iter().map(Into::into).collect(),
    }))
}

#[utoipa::path(
    get,
    path = "/api/projects/{id}",
    params(
        ("id" = Uuid, Path, description = "Project ID")
    ),
    responses(
        (status = 200, description = "Project with its document source", body = Json<ProjectResponse>),
        (status = 404, description = "Project not found")
    )
)]
#[axum::debug_handler]
pub async fn get_project(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse> {
    let project = state
        .project_service
        .get(claims.require_user_id()?, id)
        .await?;
    Ok(Json(ProjectResponse::from(project)))
}

#[utoipa::path(
    put,
    path = "/api/projects/{id}/code",
    params(
        ("id" = Uuid, Path, description = "Project ID")
    ),
    request_body = SaveCodePayload,
    responses(
        (status = 200, description = "Code saved", body = Json<ProjectResponse>),
        (status = 404, description = "Project not found")
    )
)]
#[axum::debug_handler]
pub async fn save_project_code(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Path(id): Path<Uuid>,
    Json(payload): Json<SaveCodePayload>,
) -> Result<impl IntoResponse> {
    let project = state
        .project_service
        .save_code(claims.require_user_id()?, id, &payload.code)
        .await?;
    Ok(Json(ProjectResponse::from(project)))
}

#[utoipa::path(
    patch,
    path = "/api/projects/{id}",
    params(
        ("id" = Uuid, Path, description = "Project ID")
    ),
    request_body = RenameProjectPayload,
    responses(
        (status = 200, description = "Project renamed", body = Json<ProjectResponse>),
        (status = 400, description = "Empty name"),
        (status = 404, description = "Project not found")
    )
)]
#[axum::debug_handler]
pub async fn rename_project(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Path(id): Path<Uuid>,
    Json(payload): Json<RenameProjectPayload>,
) -> Result<impl IntoResponse> {
    payload.validate()?;
    let project = state
        .project_service
        .rename(claims.require_user_id()?, id, &payload.name)
        .await?;
    Ok(Json(ProjectResponse::from(project)))
}

#[utoipa::path(
    delete,
    path = "/api/projects/{id}",
    params(
        ("id" = Uuid, Path, description = "Project ID")
    ),
    responses(
        (status = 204, description = "Project deleted"),
        (status = 404, description = "Project not found")
    )
)]
#[axum::debug_handler]
pub async fn delete_project(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse> {
    state
        .project_service
        .delete(claims.require_user_id()?, id)
        .await?;
    Ok(StatusCode::NO_CONTENT)
}
