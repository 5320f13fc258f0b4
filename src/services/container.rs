//! Service Container - Centralized service access.
//!
//! Every service shares one [`Persistence`] unit of work; the mail transport
//! is built once at startup and handed in.

use std::sync::Arc;

use super::{
    AuthService, Authenticator, EnrollmentManager, EnrollmentService, FormManager, FormService,
    SubmissionManager, SubmissionService,
};
use crate::config::Config;
use crate::infra::{MailTransport, Persistence};

#[cfg(any(test, feature = "test-utils"))]
use mockall::automock;

/// Service container trait for dependency injection.
#[cfg_attr(any(test, feature = "test-utils"), automock)]
pub trait ServiceContainer: Send + Sync {
    fn auth(&self) -> Arc<dyn AuthService>;

    fn forms(&self) -> Arc<dyn FormService>;

    fn submissions(&self) -> Arc<dyn SubmissionService>;

    fn enrollment(&self) -> Arc<dyn EnrollmentService>;
}

/// Concrete implementation of ServiceContainer
#[derive(Clone)]
pub struct Services {
    auth_service: Arc<dyn AuthService>,
    form_service: Arc<dyn FormService>,
    submission_service: Arc<dyn SubmissionService>,
    enrollment_service: Arc<dyn EnrollmentService>,
}

impl Services {
    pub fn new(
        auth_service: Arc<dyn AuthService>,
        form_service: Arc<dyn FormService>,
        submission_service: Arc<dyn SubmissionService>,
        enrollment_service: Arc<dyn EnrollmentService>,
    ) -> Self {
        Self {
            auth_service,
            form_service,
            submission_service,
            enrollment_service,
        }
    }

    /// Wire every service over one database connection
    pub fn from_connection(
        db: sea_orm::DatabaseConnection,
        config: Config,
        mailer: Arc<dyn MailTransport>,
    ) -> Self {
        let uow = Arc::new(Persistence::new(db));

        Self {
            enrollment_service: Arc::new(EnrollmentManager::new(uow.clone(), mailer, &config)),
            form_service: Arc::new(FormManager::new(uow.clone())),
            submission_service: Arc::new(SubmissionManager::new(uow.clone())),
            auth_service: Arc::new(Authenticator::new(uow, config)),
        }
    }
}

impl ServiceContainer for Services {
    fn auth(&self) -> Arc<dyn AuthService> {
        self.auth_service.clone()
    }

    fn forms(&self) -> Arc<dyn FormService> {
        self.form_service.clone()
    }

    fn submissions(&self) -> Arc<dyn SubmissionService> {
        self.submission_service.clone()
    }

    fn enrollment(&self) -> Arc<dyn EnrollmentService> {
        self.enrollment_service.clone()
    }
}
