//! OpenAPI documentation served through Swagger UI.

use utoipa::openapi::security::{HttpAuthScheme, HttpBuilder, SecurityScheme};
use utoipa::{Modify, OpenApi};

use crate::api::handlers::{
    activation_handler, auth_handler, enrollment_handler, form_handler, health_handler,
    submission_handler,
};
use crate::domain::{
    ActivationState, AnswerView, EnrollmentOutcome, EnrollmentRecord, EnrollmentReport,
    EnrollmentStatus, Field, FieldDraft, FieldType, FormBrief, FormDefinition, FormDraft,
    FormSummary, MySubmission, Section, SectionDraft, Submission, SubmissionSummary, UserBrief,
    UserResponse, UserRole,
};
use crate::services::TokenResponse;
use crate::types::MessageResponse;

#[derive(OpenApi)]
#[openapi(
    info(
        title = "formdesk",
        version = "0.1.0",
        description = "Dynamic forms with one submission per user, plus bulk enrollment with emailed activation codes",
        license(name = "MIT", url = "https://opensource.org/licenses/MIT")
    ),
    servers(
        (url = "http://localhost:3000", description = "Local development server")
    ),
    paths(
        health_handler::health,
        auth_handler::register,
        auth_handler::login,
        activation_handler::request_otp,
        activation_handler::complete_activation,
        form_handler::list_forms,
        form_handler::create_form,
        form_handler::get_form,
        form_handler::replace_form,
        form_handler::delete_form,
        submission_handler::submit,
        submission_handler::my_submission,
        submission_handler::list_submissions,
        enrollment_handler::parse_table,
        enrollment_handler::enroll,
        enrollment_handler::activation_status,
    ),
    components(
        schemas(
            UserRole,
            UserResponse,
            TokenResponse,
            MessageResponse,
            FieldType,
            FormDraft,
            SectionDraft,
            FieldDraft,
            FormDefinition,
            Section,
            Field,
            FormSummary,
            Submission,
            MySubmission,
            FormBrief,
            UserBrief,
            AnswerView,
            SubmissionSummary,
            EnrollmentRecord,
            EnrollmentStatus,
            EnrollmentOutcome,
            EnrollmentReport,
            ActivationState,
            auth_handler::RegisterRequest,
            auth_handler::LoginRequest,
            activation_handler::RequestOtpRequest,
            activation_handler::CompleteActivationRequest,
            submission_handler::SubmitRequest,
            enrollment_handler::EnrollRequest,
            enrollment_handler::ActivationStatusResponse,
            health_handler::HealthResponse,
            health_handler::ServiceHealth,
            health_handler::ServiceStatus,
        )
    ),
    modifiers(&SecurityAddon),
    tags(
        (name = "Health", description = "Dependency health"),
        (name = "Authentication", description = "Sign-up and login"),
        (name = "Activation", description = "One-time code handshake for enrolled accounts"),
        (name = "Forms", description = "Form definitions"),
        (name = "Submissions", description = "One submission per user"),
        (name = "Admin", description = "Submission overview and bulk enrollment")
    )
)]
pub struct ApiDoc;

/// JWT bearer security scheme
struct SecurityAddon;

impl Modify for SecurityAddon {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        if let Some(components) = openapi.components.as_mut() {
            components.add_security_scheme(
                "bearer_auth",
                SecurityScheme::Http(
                    HttpBuilder::new()
                        .scheme(HttpAuthScheme::Bearer)
                        .bearer_format("JWT")
                        .description(Some("JWT obtained from /auth/login"))
                        .build(),
                ),
            );
        }
    }
}
