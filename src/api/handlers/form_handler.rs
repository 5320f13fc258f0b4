//! Form definition handlers.
//!
//! Every route needs a session; the service enforces the admin role for writes.

use axum::{
    extract::{Path, State},
    response::Json,
    routing::get,
    Extension, Router,
};
use uuid::Uuid;

use crate::api::AppState;
use crate::domain::{FormDefinition, FormDraft, FormSummary, Session};
use crate::errors::AppResult;
use crate::types::{Created, NoContent};

pub fn form_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(list_forms).post(create_form))
        .route("/:id", get(get_form).put(replace_form).delete(delete_form))
}

/// Active forms, newest first
#[utoipa::path(
    get,
    path = "/forms",
    tag = "Forms",
    security(("bearer_auth" = [])),
    responses(
        (status = 200, description = "Active forms", body = Vec<FormSummary>),
        (status = 401, description = "Not authenticated")
    )
)]
pub async fn list_forms(State(state): State<AppState>) -> AppResult<Json<Vec<FormSummary>>> {
    Ok(Json(state.form_service.list_active().await?))
}

/// Create a form with its sections and fields
#[utoipa::path(
    post,
    path = "/forms",
    tag = "Forms",
    security(("bearer_auth" = [])),
    request_body = FormDraft,
    responses(
        (status = 201, description = "Form created", body = FormDefinition),
        (status = 400, description = "Invalid form structure"),
        (status = 401, description = "Not authenticated"),
        (status = 403, description = "Admin access required")
    )
)]
pub async fn create_form(
    State(state): State<AppState>,
    Extension(session): Extension<Session>,
    Json(draft): Json<FormDraft>,
) -> AppResult<Created<FormDefinition>> {
    let form = state.form_service.create(&session, draft).await?;
    Ok(Created(form))
}

/// Form with ordered sections and fields
#[utoipa::path(
    get,
    path = "/forms/{id}",
    tag = "Forms",
    security(("bearer_auth" = [])),
    params(("id" = Uuid, Path, description = "Form ID")),
    responses(
        (status = 200, description = "Form definition", body = FormDefinition),
        (status = 401, description = "Not authenticated"),
        (status = 404, description = "Form not found")
    )
)]
pub async fn get_form(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> AppResult<Json<FormDefinition>> {
    Ok(Json(state.form_service.get(id).await?))
}

/// Replace a form's content and whole structure
///
/// Sections and fields get new identifiers.
#[utoipa::path(
    put,
    path = "/forms/{id}",
    tag = "Forms",
    security(("bearer_auth" = [])),
    params(("id" = Uuid, Path, description = "Form ID")),
    request_body = FormDraft,
    responses(
        (status = 204, description = "Form replaced"),
        (status = 400, description = "Invalid form structure"),
        (status = 403, description = "Admin access required"),
        (status = 404, description = "Form not found")
    )
)]
pub async fn replace_form(
    State(state): State<AppState>,
    Extension(session): Extension<Session>,
    Path(id): Path<Uuid>,
    Json(draft): Json<FormDraft>,
) -> AppResult<NoContent> {
    state.form_service.replace(&session, id, draft).await?;
    Ok(NoContent)
}

/// Delete a form that has no submissions
#[utoipa::path(
    delete,
    path = "/forms/{id}",
    tag = "Forms",
    security(("bearer_auth" = [])),
    params(("id" = Uuid, Path, description = "Form ID")),
    responses(
        (status = 204, description = "Form deleted"),
        (status = 403, description = "Admin access required"),
        (status = 404, description = "Form not found"),
        (status = 409, description = "Form has submissions")
    )
)]
pub async fn delete_form(
    State(state): State<AppState>,
    Extension(session): Extension<Session>,
    Path(id): Path<Uuid>,
) -> AppResult<NoContent> {
    state.form_service.delete(&session, id).await?;
    Ok(NoContent)
}
