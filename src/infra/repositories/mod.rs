//! Repository layer - Data access abstraction
//!
//! Each repository exposes a mockable trait for pool-level reads plus
//! connection-generic helpers that the transaction context reuses.

pub(crate) mod activation_repository;
pub(crate) mod entities;
pub(crate) mod form_repository;
pub(crate) mod submission_repository;
pub(crate) mod user_repository;

pub(crate) mod queries {
    //! Connection-generic statements shared by stores and transactions
    pub(crate) use super::activation_repository as activation;
    pub(crate) use super::form_repository as forms;
    pub(crate) use super::submission_repository as submissions;
    pub(crate) use super::user_repository as users;
}

pub use activation_repository::{ActivationRepository, ActivationStore};
pub use form_repository::{FormRepository, FormStore};
pub use submission_repository::{SubmissionRepository, SubmissionStore, ALREADY_SUBMITTED};
pub use user_repository::{NewAccount, UserRepository, UserStore};

// Export mocks for tests (both unit and integration)
#[cfg(any(test, feature = "test-utils"))]
pub use activation_repository::MockActivationRepository;
#[cfg(any(test, feature = "test-utils"))]
pub use form_repository::MockFormRepository;
#[cfg(any(test, feature = "test-utils"))]
pub use submission_repository::MockSubmissionRepository;
#[cfg(any(test, feature = "test-utils"))]
pub use user_repository::MockUserRepository;
