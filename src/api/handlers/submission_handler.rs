//! Submission handlers.

use axum::{
    extract::State,
    response::Json,
    routing::{get, post},
    Extension, Router,
};
use serde::Deserialize;
use serde_json::Value;
use utoipa::ToSchema;
use uuid::Uuid;

use crate::api::AppState;
use crate::domain::{MySubmission, Session, Submission, SubmissionSummary};
use crate::errors::AppResult;
use crate::types::Created;

/// Answers keyed by field id
#[derive(Debug, Deserialize, ToSchema)]
pub struct SubmitRequest {
    #[serde(alias = "formId")]
    pub form_id: Uuid,
    /// `{"<field id>": <value>}`, values typed by the field
    #[schema(value_type = Object)]
    pub answers: Value,
}

pub fn submission_routes() -> Router<AppState> {
    Router::new()
        .route("/", post(submit))
        .route("/me", get(my_submission))
}

/// Admin-only submission listing, mounted under `/admin`
pub fn admin_submission_routes() -> Router<AppState> {
    Router::new().route("/submissions", get(list_submissions))
}

/// Submit answers for a form (once per user)
#[utoipa::path(
    post,
    path = "/submissions",
    tag = "Submissions",
    security(("bearer_auth" = [])),
    request_body = SubmitRequest,
    responses(
        (status = 201, description = "Submission recorded", body = Submission),
        (status = 400, description = "Invalid answers or inactive form"),
        (status = 404, description = "Form not found"),
        (status = 409, description = "Already submitted")
    )
)]
pub async fn submit(
    State(state): State<AppState>,
    Extension(session): Extension<Session>,
    Json(payload): Json<SubmitRequest>,
) -> AppResult<Created<Submission>> {
    let submission = state
        .submission_service
        .submit(&session, payload.form_id, payload.answers)
        .await?;
    Ok(Created(submission))
}

/// The caller's submission with labelled answers
#[utoipa::path(
    get,
    path = "/submissions/me",
    tag = "Submissions",
    security(("bearer_auth" = [])),
    responses(
        (status = 200, description = "Own submission", body = MySubmission),
        (status = 404, description = "Nothing submitted yet")
    )
)]
pub async fn my_submission(
    State(state): State<AppState>,
    Extension(session): Extension<Session>,
) -> AppResult<Json<MySubmission>> {
    Ok(Json(state.submission_service.get_mine(&session).await?))
}

/// Every submission, newest first
#[utoipa::path(
    get,
    path = "/admin/submissions",
    tag = "Admin",
    security(("bearer_auth" = [])),
    responses(
        (status = 200, description = "All submissions", body = Vec<SubmissionSummary>),
        (status = 403, description = "Admin access required")
    )
)]
pub async fn list_submissions(
    State(state): State<AppState>,
    Extension(session): Extension<Session>,
) -> AppResult<Json<Vec<SubmissionSummary>>> {
    Ok(Json(state.submission_service.list_all(&session).await?))
}
