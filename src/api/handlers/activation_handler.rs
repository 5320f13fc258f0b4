//! Account activation handshake for enrolled users.

use axum::{extract::State, response::Json, routing::post, Router};
use serde::Deserialize;
use utoipa::ToSchema;
use validator::Validate;

use crate::api::extractors::ValidatedJson;
use crate::api::AppState;
use crate::errors::{AppError, AppResult};
use crate::types::MessageResponse;

#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct RequestOtpRequest {
    #[validate(email(message = "Invalid email format"))]
    #[schema(example = "enrollee@example.com")]
    pub email: String,
}

#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct CompleteActivationRequest {
    #[validate(email(message = "Invalid email format"))]
    #[schema(example = "enrollee@example.com")]
    pub email: String,
    /// Code from the activation mail
    #[validate(length(min = 1, message = "Activation code is required"))]
    #[schema(example = "042137")]
    pub otp: String,
    /// Password policy is checked by the service
    #[serde(alias = "newPassword")]
    #[schema(example = "SecurePass123!")]
    pub new_password: String,
}

pub fn activation_routes() -> Router<AppState> {
    Router::new()
        .route("/otp", post(request_otp))
        .route("/complete", post(complete_activation))
}

/// Mail a fresh activation code
///
/// Answers the same way whether or not the email is registered.
#[utoipa::path(
    post,
    path = "/activation/otp",
    tag = "Activation",
    request_body = RequestOtpRequest,
    responses(
        (status = 200, description = "Code sent if the account exists", body = MessageResponse),
        (status = 400, description = "Validation error"),
        (status = 429, description = "Rate limit exceeded")
    )
)]
pub async fn request_otp(
    State(state): State<AppState>,
    ValidatedJson(payload): ValidatedJson<RequestOtpRequest>,
) -> AppResult<Json<MessageResponse>> {
    let sent = state.enrollment_service.request_otp(&payload.email).await;
    Ok(Json(otp_request_outcome(sent)?))
}

/// Fold a delivery failure into the generic answer.
///
/// Only registered emails reach the mailer, so its failures stay out of the response.
fn otp_request_outcome(sent: AppResult<()>) -> AppResult<MessageResponse> {
    match sent {
        Ok(()) => {}
        Err(AppError::Delivery(reason)) => {
            tracing::warn!(%reason, "Activation code requested but not delivered");
        }
        Err(e) => return Err(e),
    }

    Ok(MessageResponse::new(
        "If the account exists, an activation code has been sent",
    ))
}

/// Trade a valid code for a password
#[utoipa::path(
    post,
    path = "/activation/complete",
    tag = "Activation",
    request_body = CompleteActivationRequest,
    responses(
        (status = 200, description = "Account activated", body = MessageResponse),
        (status = 400, description = "Weak password, or invalid or expired code"),
        (status = 429, description = "Rate limit exceeded")
    )
)]
pub async fn complete_activation(
    State(state): State<AppState>,
    ValidatedJson(payload): ValidatedJson<CompleteActivationRequest>,
) -> AppResult<Json<MessageResponse>> {
    state
        .enrollment_service
        .complete_activation(&payload.email, &payload.otp, &payload.new_password)
        .await?;

    Ok(Json(MessageResponse::new("Account activated, you can now log in")))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_delivery_failure_looks_like_success() {
        let delivered = otp_request_outcome(Ok(())).unwrap();
        let refused = otp_request_outcome(Err(AppError::delivery("relay down"))).unwrap();
        assert_eq!(delivered.message, refused.message);

        assert!(matches!(
            otp_request_outcome(Err(AppError::internal("db gone"))),
            Err(AppError::Internal(_))
        ));
    }
}
