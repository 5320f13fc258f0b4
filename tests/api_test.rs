//! HTTP-facing behaviour that needs no Redis: error rendering, tokens and
//! the OpenAPI document.

mod common;

use axum::{body::to_bytes, http::StatusCode, response::IntoResponse};
use serde_json::Value;
use utoipa::OpenApi;

use common::TestApp;
use formdesk::api::ApiDoc;
use formdesk::domain::UserRole;
use formdesk::errors::AppError;
use formdesk::services::AuthService;

async fn render(error: AppError) -> (StatusCode, Value) {
    let response = error.into_response();
    let status = response.status();
    let body = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    (status, serde_json::from_slice(&body).unwrap())
}

#[tokio::test]
async fn test_error_envelope_codes_and_statuses() {
    let cases = [
        (AppError::Unauthorized, StatusCode::UNAUTHORIZED, "UNAUTHORIZED"),
        (AppError::InvalidCredentials, StatusCode::UNAUTHORIZED, "INVALID_CREDENTIALS"),
        (AppError::Forbidden, StatusCode::FORBIDDEN, "FORBIDDEN"),
        (AppError::bad_request("x"), StatusCode::BAD_REQUEST, "BAD_REQUEST"),
        (AppError::validation("x"), StatusCode::BAD_REQUEST, "VALIDATION_ERROR"),
        (AppError::conflict("x"), StatusCode::CONFLICT, "CONFLICT"),
        (AppError::NotFound, StatusCode::NOT_FOUND, "NOT_FOUND"),
        (AppError::InvalidOrExpiredOtp, StatusCode::BAD_REQUEST, "INVALID_OR_EXPIRED"),
        (AppError::delivery("x"), StatusCode::BAD_GATEWAY, "DELIVERY_ERROR"),
        (AppError::internal("x"), StatusCode::INTERNAL_SERVER_ERROR, "INTERNAL_ERROR"),
    ];

    for (error, status, code) in cases {
        let (actual_status, body) = render(error).await;
        assert_eq!(actual_status, status, "{}", code);
        assert_eq!(body["error"]["code"], code);
        assert!(body["error"]["message"].is_string());
    }
}

#[tokio::test]
async fn test_internal_details_are_hidden() {
    let (_, body) = render(AppError::internal("pool exhausted at 10.0.0.5")).await;
    assert_eq!(body["error"]["message"], "An internal error occurred");

    let (_, body) = render(AppError::delivery("smtp.internal:587 refused")).await;
    assert_eq!(body["error"]["message"], "The email could not be delivered");

    let (_, body) = render(AppError::conflict("You have already submitted a form")).await;
    assert_eq!(body["error"]["message"], "You have already submitted a form");
}

#[tokio::test]
async fn test_login_token_carries_session() {
    let app = TestApp::new().await;
    let admin = app.admin().await;

    let token = app
        .auth()
        .login(admin.email.clone(), "AdminPass123!".into())
        .await
        .unwrap();
    assert_eq!(token.expires_in, 24 * 3600);

    let session = app.auth().verify_token(&token.access_token).unwrap().session();
    assert_eq!(session, admin);
    assert_eq!(session.role, UserRole::Admin);

    assert!(matches!(
        app.auth().verify_token("not-a-token"),
        Err(AppError::Jwt(_))
    ));
}

#[tokio::test]
async fn test_registration_rules() {
    let app = TestApp::new().await;
    app.user("taken@example.com").await;

    let duplicate = app
        .auth()
        .register("Taken@Example.com".into(), "Password123!".into(), "Again".into())
        .await;
    assert!(matches!(duplicate, Err(AppError::Conflict(_))));

    let weak = app
        .auth()
        .register("new@example.com".into(), "short".into(), "New".into())
        .await;
    assert!(matches!(weak, Err(AppError::Validation(_))));

    let wrong = app
        .auth()
        .login("taken@example.com".into(), "WrongPass123!".into())
        .await;
    assert!(matches!(wrong, Err(AppError::InvalidCredentials)));
}

#[test]
fn test_openapi_document_is_complete() {
    let doc = serde_json::to_value(ApiDoc::openapi()).unwrap();
    let paths = doc["paths"].as_object().unwrap();

    for path in [
        "/health",
        "/auth/login",
        "/activation/otp",
        "/forms",
        "/submissions",
        "/admin/submissions",
        "/admin/enrollment",
        "/admin/enrollment/parse",
    ] {
        assert!(paths.contains_key(path), "missing {}", path);
    }
    assert!(doc["components"]["securitySchemes"]["bearer_auth"].is_object());
}
