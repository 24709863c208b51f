use axum::{
    extract::{Path, State},
    http::{header, HeaderValue},
    response::{Html, IntoResponse, Json, Response},
    Extension,
};
use uuid::Uuid;

use crate::{
    dto::project_dto::PreviewPayload, error::Result, middleware::auth::Claims, AppState,
};

/// Runs the document in an opaque origin: scripts and the finish-confirm
/// dialog work, but it cannot read the app's storage or cookies.
pub const PREVIEW_CSP: &str = "sandbox allow-scripts allow-modals allow-popups";

pub fn html_document(code: String) -> Response {
    let mut res = Html(code).into_response();
    let headers = res.headers_mut();
    headers.insert(
        header::CONTENT_SECURITY_POLICY,
        HeaderValue::from_static(PREVIEW_CSP),
    );
    headers.insert(header::CACHE_CONTROL, HeaderValue::from_static("no-store"));
    headers.insert(
        header::X_CONTENT_TYPE_OPTIONS,
        HeaderValue::from_static("nosniff"),
    );
    res
}

/// Serves a saved project as a standalone document.
///
/// Requires the bearer header like every project route, so an `<iframe src>`
/// cannot load it directly. Clients `fetch` it with the header and show the
/// body through a blob URL; [`preview_buffer`] does the same for unsaved code.
#[utoipa::path(
    get,
    path = "/api/projects/{id}/preview",
    params(
        ("id" = Uuid, Path, description = "Project ID")
    ),
    responses(
        (status = 200, description = "Stored document as HTML"),
        (status = 404, description = "Project not found")
    )
)]
#[axum::debug_handler]
pub async fn preview_project(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Path(id): Path<Uuid>,
) -> Result<Response> {
    let project = state
        .project_service
        .get(claims.require_user_id()?, id)
        .await?;
    Ok(html_document(project.code))
}

#[utoipa::path(
    post,
    path = "/api/preview",
    request_body = PreviewPayload,
    responses(
        (status = 200, description = "Unsaved editor contents as HTML")
    )
)]
#[axum::debug_handler]
pub async fn preview_buffer(
    Extension(_claims): Extension<Claims>,
    Json(payload): Json<PreviewPayload>,
) -> Response {
    html_document(payload.code)
}
