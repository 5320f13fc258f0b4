//! Bulk enrollment handlers (admin only).

use axum::{
    extract::{Query, State},
    response::Json,
    routing::{get, post},
    Extension, Router,
};
use serde::{Deserialize, Serialize};
use utoipa::{IntoParams, ToSchema};

use crate::api::AppState;
use crate::domain::{
    normalize_email, ActivationState, EnrollmentRecord, EnrollmentReport, Session,
};
use crate::errors::{AppError, AppResult};

/// Records to enroll, or a raw table to parse and enroll in one step
///
/// Parsed records never echo passwords back, so a table with a password
/// column has to be sent as `csv`.
#[derive(Debug, Default, Deserialize, ToSchema)]
pub struct EnrollRequest {
    #[serde(default)]
    pub records: Option<Vec<EnrollmentRecord>>,
    #[serde(default)]
    #[schema(example = "email,name\nada@example.com,Ada Lovelace")]
    pub csv: Option<String>,
}

#[derive(Debug, Deserialize, IntoParams)]
pub struct StatusQuery {
    /// Enrollee email
    pub email: String,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct ActivationStatusResponse {
    pub email: String,
    pub state: ActivationState,
}

/// Mounted under `/admin`
pub fn enrollment_routes() -> Router<AppState> {
    Router::new()
        .route("/enrollment", post(enroll))
        .route("/enrollment/parse", post(parse_table))
        .route("/enrollment/status", get(activation_status))
}

/// Parse a CSV enrollment table without writing anything
#[utoipa::path(
    post,
    path = "/admin/enrollment/parse",
    tag = "Admin",
    security(("bearer_auth" = [])),
    request_body(content = String, content_type = "text/csv"),
    responses(
        (status = 200, description = "Parsed rows, invalid ones with a reason", body = Vec<EnrollmentRecord>),
        (status = 400, description = "Missing header or unreadable table"),
        (status = 403, description = "Admin access required")
    )
)]
pub async fn parse_table(
    State(state): State<AppState>,
    Extension(session): Extension<Session>,
    body: String,
) -> AppResult<Json<Vec<EnrollmentRecord>>> {
    let records = state.enrollment_service.parse(&session, &body).await?;
    Ok(Json(records))
}

/// Create accounts and mail activation codes
#[utoipa::path(
    post,
    path = "/admin/enrollment",
    tag = "Admin",
    security(("bearer_auth" = [])),
    request_body = EnrollRequest,
    responses(
        (status = 200, description = "Per-record outcomes", body = EnrollmentReport),
        (status = 400, description = "Neither records nor csv supplied"),
        (status = 403, description = "Admin access required")
    )
)]
pub async fn enroll(
    State(state): State<AppState>,
    Extension(session): Extension<Session>,
    Json(payload): Json<EnrollRequest>,
) -> AppResult<Json<EnrollmentReport>> {
    let service = &state.enrollment_service;
    let records = match (payload.records, payload.csv) {
        (Some(records), None) => records,
        (None, Some(csv)) => service.parse(&session, &csv).await?,
        _ => {
            return Err(AppError::bad_request(
                "Provide exactly one of 'records' or 'csv'",
            ))
        }
    };

    Ok(Json(service.enroll(&session, records).await?))
}

/// Where an enrollee is in the activation handshake
#[utoipa::path(
    get,
    path = "/admin/enrollment/status",
    tag = "Admin",
    security(("bearer_auth" = [])),
    params(StatusQuery),
    responses(
        (status = 200, description = "Activation state", body = ActivationStatusResponse),
        (status = 403, description = "Admin access required"),
        (status = 404, description = "No account for this email")
    )
)]
pub async fn activation_status(
    State(state): State<AppState>,
    Extension(session): Extension<Session>,
    Query(query): Query<StatusQuery>,
) -> AppResult<Json<ActivationStatusResponse>> {
    let activation = state
        .enrollment_service
        .activation_state(&session, &query.email)
        .await?;

    Ok(Json(ActivationStatusResponse {
        email: normalize_email(&query.email),
        state: activation,
    }))
}
