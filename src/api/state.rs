//! Application state - Dependency injection container.
//!
//! Provides handlers with the application services and the infrastructure
//! the health check reports on.

use std::sync::Arc;

use crate::config::Config;
use crate::infra::{Cache, Database, MailTransport};
use crate::services::{
    AuthService, EnrollmentService, FormService, ServiceContainer, Services, SubmissionService,
};

/// Application state containing all services (DI container).
#[derive(Clone)]
pub struct AppState {
    pub auth_service: Arc<dyn AuthService>,
    pub form_service: Arc<dyn FormService>,
    pub submission_service: Arc<dyn SubmissionService>,
    pub enrollment_service: Arc<dyn EnrollmentService>,
    /// Redis, used for rate limiting
    pub cache: Arc<Cache>,
    pub database: Arc<Database>,
    pub mailer: Arc<dyn MailTransport>,
}

impl AppState {
    /// Build every service over the shared database connection.
    pub fn from_config(
        database: Arc<Database>,
        cache: Arc<Cache>,
        mailer: Arc<dyn MailTransport>,
        config: Config,
    ) -> Self {
        let container = Services::from_connection(database.get_connection(), config, mailer.clone());
        Self::new(&container, cache, database, mailer)
    }

    /// Create application state from an existing service container.
    pub fn new(
        services: &dyn ServiceContainer,
        cache: Arc<Cache>,
        database: Arc<Database>,
        mailer: Arc<dyn MailTransport>,
    ) -> Self {
        Self {
            auth_service: services.auth(),
            form_service: services.forms(),
            submission_service: services.submissions(),
            enrollment_service: services.enrollment(),
            cache,
            database,
            mailer,
        }
    }
}
