//! Bulk enrollment and OTP activation against SQLite.

mod common;

use common::{FakeMailer, TestApp};
use formdesk::domain::{parse_enrollment_table, ActivationState, EnrollmentStatus};
use formdesk::errors::AppError;
use formdesk::infra::{ActivationRepository, UnitOfWork, UserRepository};
use formdesk::services::{AuthService, EnrollmentService};
use formdesk::with_transaction;

const TABLE: &str = "\
Email,Name
ada@example.com,Ada
 BOB@example.com , Bob

not-an-email,Carol
ada@example.com,Ada again
existing@example.com,Existing
fail@example.com,Fail
";

#[tokio::test]
async fn test_parse_is_deterministic() {
    let first = parse_enrollment_table(TABLE).unwrap();
    let second = parse_enrollment_table(TABLE).unwrap();
    assert_eq!(first, second);

    assert_eq!(first.len(), 6);
    assert_eq!(first[1].email, "bob@example.com");
    assert_eq!(first[1].name, "Bob");
    assert!(!first[2].valid);
    assert_eq!(first[2].reason.as_deref(), Some("Invalid email address"));
}

#[tokio::test]
async fn test_enrollment_scenario() {
    let app = TestApp::with_mailer(FakeMailer::failing_for(&["fail@example.com"])).await;
    let admin = app.admin().await;
    app.user("existing@example.com").await;

    let service = app.enrollment();
    let records = service.parse(&admin, TABLE).await.unwrap();
    let report = service.enroll(&admin, records).await.unwrap();

    assert_eq!(report.created, 3);
    assert_eq!(report.skipped, 2);
    assert_eq!(report.failed, 2);

    let statuses: Vec<_> = report.records.iter().map(|r| (r.row, r.status)).collect();
    assert_eq!(
        statuses,
        vec![
            (1, EnrollmentStatus::OtpSent),
            (2, EnrollmentStatus::OtpSent),
            (3, EnrollmentStatus::Invalid),
            (4, EnrollmentStatus::Skipped),
            (5, EnrollmentStatus::Skipped),
            (6, EnrollmentStatus::DeliveryFailed),
        ]
    );

    let sent: Vec<_> = app.mailer.sent().into_iter().map(|m| m.to).collect();
    assert_eq!(sent.len(), 2);
    assert!(sent.contains(&"ada@example.com".to_string()));
    assert!(sent.contains(&"bob@example.com".to_string()));

    let bob = app.uow.users().find_by_email("bob@example.com").await.unwrap().unwrap();
    assert!(!bob.has_password());
    assert!(!bob.email_verified);

    // Enrolled accounts cannot log in before activation
    let login = app
        .auth()
        .login("bob@example.com".into(), "anything-at-all".into())
        .await;
    assert!(matches!(login, Err(AppError::InvalidCredentials)));
}

#[tokio::test]
async fn test_large_table_is_written_in_chunks() {
    let app = TestApp::new().await;
    let admin = app.admin().await;
    app.user("person-7@example.com").await;

    let mut table = String::from("email,name\n");
    for i in 0..250 {
        table.push_str(&format!("person-{}@example.com,Person {}\n", i, i));
    }

    let service = app.enrollment();
    let records = service.parse(&admin, &table).await.unwrap();
    let report = service.enroll(&admin, records).await.unwrap();

    assert_eq!(report.created, 249);
    assert_eq!(report.skipped, 1);
    assert_eq!(report.failed, 0);
    assert_eq!(report.records[7].status, EnrollmentStatus::Skipped);
    assert_eq!(app.mailer.sent().len(), 249);
}

#[tokio::test]
async fn test_enroll_requires_admin() {
    let app = TestApp::new().await;
    let member = app.user("member@example.com").await;

    let service = app.enrollment();
    assert!(matches!(service.parse(&member, TABLE).await, Err(AppError::Forbidden)));
    assert!(matches!(
        service.activation_state(&member, "member@example.com").await,
        Err(AppError::Forbidden)
    ));
}

#[tokio::test]
async fn test_activation_handshake() {
    let app = TestApp::new().await;
    let admin = app.admin().await;
    let service = app.enrollment();

    let records = service.parse(&admin, "email,name\nada@example.com,Ada\n").await.unwrap();
    service.enroll(&admin, records).await.unwrap();
    assert_eq!(
        service.activation_state(&admin, "ada@example.com").await.unwrap(),
        ActivationState::OtpRequested
    );

    let code = app.mailer.last_code("ada@example.com").unwrap();

    let weak = service.complete_activation("ada@example.com", &code, "short").await;
    assert!(matches!(weak, Err(AppError::BadRequest(_))));

    service
        .complete_activation("Ada@Example.com", &code, "NewPassword123!")
        .await
        .unwrap();

    assert_eq!(
        service.activation_state(&admin, "ada@example.com").await.unwrap(),
        ActivationState::Activated
    );
    let ada = app.uow.users().find_by_email("ada@example.com").await.unwrap().unwrap();
    assert!(ada.email_verified);
    assert!(app.uow.activation().find("ada@example.com").await.unwrap().is_none());

    let token = app
        .auth()
        .login("ada@example.com".into(), "NewPassword123!".into())
        .await
        .unwrap();
    assert_eq!(token.token_type, "Bearer");

    // The code was consumed
    let reused = service
        .complete_activation("ada@example.com", &code, "Another123!")
        .await;
    assert!(matches!(reused, Err(AppError::InvalidOrExpiredOtp)));
}

#[tokio::test]
async fn test_wrong_codes_are_counted_then_discarded() {
    let app = TestApp::new().await;
    let admin = app.admin().await;
    let service = app.enrollment();

    let records = service.parse(&admin, "email,name\nbob@example.com,Bob\n").await.unwrap();
    service.enroll(&admin, records).await.unwrap();
    let code = app.mailer.last_code("bob@example.com").unwrap();
    let wrong = if code == "000000" { "111111" } else { "000000" };

    for attempt in 1..=2 {
        let result = service
            .complete_activation("bob@example.com", wrong, "NewPassword123!")
            .await;
        assert!(matches!(result, Err(AppError::InvalidOrExpiredOtp)));
        let pending = app.uow.activation().find("bob@example.com").await.unwrap().unwrap();
        assert_eq!(pending.attempts, attempt);
    }

    let third = service
        .complete_activation("bob@example.com", wrong, "NewPassword123!")
        .await;
    assert!(matches!(third, Err(AppError::InvalidOrExpiredOtp)));
    assert!(app.uow.activation().find("bob@example.com").await.unwrap().is_none());

    // Even the right code is useless once discarded
    let late = service
        .complete_activation("bob@example.com", &code, "NewPassword123!")
        .await;
    assert!(matches!(late, Err(AppError::InvalidOrExpiredOtp)));
    assert_eq!(
        service.activation_state(&admin, "bob@example.com").await.unwrap(),
        ActivationState::Created
    );

    // A fresh request starts over
    service.request_otp("bob@example.com").await.unwrap();
    let fresh = app.mailer.last_code("bob@example.com").unwrap();
    service
        .complete_activation("bob@example.com", &fresh, "NewPassword123!")
        .await
        .unwrap();
}

#[tokio::test]
async fn test_failed_attempts_count_from_the_stored_row() {
    let app = TestApp::new().await;
    let admin = app.admin().await;
    let service = app.enrollment();

    let records = service.parse(&admin, "email,name\ndan@example.com,Dan\n").await.unwrap();
    service.enroll(&admin, records).await.unwrap();

    // Both guesses start from the same snapshot of the pending code
    let snapshot = app.uow.activation().find("dan@example.com").await.unwrap().unwrap();
    assert_eq!(snapshot.attempts, 0);

    for expected in 1..=2 {
        let email = snapshot.email.clone();
        let attempts = with_transaction!(app.uow, |ctx| ctx
            .activation()
            .record_failure(&email)
            .await)
        .unwrap();
        assert_eq!(attempts, Some(expected));
    }

    with_transaction!(app.uow, |ctx| ctx.activation().discard("dan@example.com").await).unwrap();
    let gone = with_transaction!(app.uow, |ctx| ctx
        .activation()
        .record_failure("dan@example.com")
        .await)
    .unwrap();
    assert_eq!(gone, None);
}

#[tokio::test]
async fn test_expired_code_is_rejected() {
    let mut app = TestApp::new().await;
    app.config.otp_ttl_minutes = 0;
    let admin = app.admin().await;
    let service = app.enrollment();

    let records = service.parse(&admin, "email,name\ncid@example.com,Cid\n").await.unwrap();
    service.enroll(&admin, records).await.unwrap();
    let code = app.mailer.last_code("cid@example.com").unwrap();

    let result = service
        .complete_activation("cid@example.com", &code, "NewPassword123!")
        .await;
    assert!(matches!(result, Err(AppError::InvalidOrExpiredOtp)));
}

#[tokio::test]
async fn test_request_otp_for_unknown_email_sends_nothing() {
    let app = TestApp::new().await;

    app.enrollment().request_otp("ghost@example.com").await.unwrap();
    assert!(app.mailer.sent().is_empty());
}

#[tokio::test]
async fn test_password_column_activates_directly() {
    let app = TestApp::new().await;
    let admin = app.admin().await;
    let service = app.enrollment();

    let table = "email,name,password\ndee@example.com,Dee,DeePass123!\neve@example.com,Eve,\n";
    let records = service.parse(&admin, table).await.unwrap();
    let report = service.enroll(&admin, records).await.unwrap();

    assert_eq!(report.records[0].status, EnrollmentStatus::Activated);
    assert_eq!(report.records[1].status, EnrollmentStatus::Invalid);
    assert_eq!(report.records[1].reason.as_deref(), Some("Password is required"));
    assert!(app.mailer.sent().is_empty());

    assert_eq!(
        service.activation_state(&admin, "dee@example.com").await.unwrap(),
        ActivationState::Activated
    );
    app.auth()
        .login("dee@example.com".into(), "DeePass123!".into())
        .await
        .unwrap();
}
