//! Liveness and dependency health.

use axum::{extract::State, http::StatusCode, response::Json};
use serde::Serialize;
use utoipa::ToSchema;

use crate::api::AppState;

#[derive(Debug, Serialize, ToSchema)]
pub struct HealthResponse {
    /// `healthy` or `degraded`
    #[schema(value_type = String)]
    pub status: &'static str,
    pub services: ServiceHealth,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct ServiceHealth {
    pub database: ServiceStatus,
    pub redis: ServiceStatus,
    pub mail: ServiceStatus,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct ServiceStatus {
    #[schema(value_type = String)]
    pub status: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl ServiceStatus {
    fn from_result<E: std::fmt::Display>(result: Result<(), E>) -> Self {
        match result {
            Ok(()) => Self {
                status: "healthy",
                error: None,
            },
            Err(e) => Self {
                status: "unhealthy",
                error: Some(e.to_string()),
            },
        }
    }

    fn is_healthy(&self) -> bool {
        self.error.is_none()
    }
}

pub async fn root() -> &'static str {
    "formdesk"
}

/// Database, Redis and mail transport reachability
#[utoipa::path(
    get,
    path = "/health",
    tag = "Health",
    responses(
        (status = 200, description = "All dependencies reachable", body = HealthResponse),
        (status = 503, description = "At least one dependency is down", body = HealthResponse)
    )
)]
pub async fn health(State(state): State<AppState>) -> (StatusCode, Json<HealthResponse>) {
    let (database, redis, mail) = tokio::join!(
        state.database.ping(),
        state.cache.ping(),
        state.mailer.health_check(),
    );

    let services = ServiceHealth {
        database: ServiceStatus::from_result(database),
        redis: ServiceStatus::from_result(redis),
        mail: ServiceStatus::from_result(mail),
    };
    let healthy =
        services.database.is_healthy() && services.redis.is_healthy() && services.mail.is_healthy();

    let response = HealthResponse {
        status: if healthy { "healthy" } else { "degraded" },
        services,
    };
    let code = if healthy {
        StatusCode::OK
    } else {
        StatusCode::SERVICE_UNAVAILABLE
    };

    (code, Json(response))
}
