//! Infrastructure layer - External systems integration
//!
//! - Database connections, migrations and repositories
//! - Redis for rate limiting
//! - Outbound mail
//! - Unit of Work for transaction management

pub mod cache;
pub mod db;
pub mod mailer;
pub mod repositories;
pub mod unit_of_work;

pub use cache::Cache;
pub use db::{Database, Migrator};
pub use mailer::{build_mailer, LogMailer, MailTransport, OutgoingMail, SmtpMailer};
pub use repositories::{
    ActivationRepository, FormRepository, NewAccount, SubmissionRepository, UserRepository,
    ALREADY_SUBMITTED,
};
pub use unit_of_work::{Persistence, TransactionContext, UnitOfWork};

#[cfg(any(test, feature = "test-utils"))]
pub use mailer::MockMailTransport;
#[cfg(any(test, feature = "test-utils"))]
pub use repositories::{
    MockActivationRepository, MockFormRepository, MockSubmissionRepository, MockUserRepository,
};
