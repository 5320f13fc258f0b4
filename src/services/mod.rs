//! Application services layer - Use cases and business logic.
//!
//! Services orchestrate domain logic and infrastructure to fulfill
//! application use cases. They depend on abstractions (traits) for
//! dependency inversion, and perform their own role checks.

mod auth_service;
pub mod container;
mod enrollment_service;
mod form_service;
mod submission_service;

// Service Container
pub use container::{ServiceContainer, Services};

// Service traits and implementations
pub use auth_service::{AuthService, Authenticator, Claims, TokenResponse};
pub use enrollment_service::{EnrollmentManager, EnrollmentService};
pub use form_service::{FormManager, FormService};
pub use submission_service::{SubmissionManager, SubmissionService};

#[cfg(any(test, feature = "test-utils"))]
pub use container::MockServiceContainer;
