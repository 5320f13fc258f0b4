//! formdesk - dynamic form builder with single-submission intake and bulk
//! user enrollment.
//!
//! Administrators define forms as ordered sections of typed fields; users
//! submit one typed answer set each; enrolled users activate their accounts
//! through an emailed one-time code.
//!
//! # Architecture Layers
//!
//! - **cli**: Command-line interface
//! - **commands**: CLI command implementations
//! - **config**: Application configuration and constants
//! - **domain**: Forms, answers, submissions, users and enrollment records
//! - **services**: Application use cases and role checks
//! - **infra**: Database, Redis, mail transport and the Unit of Work
//! - **api**: HTTP handlers, middleware, and routes
//! - **types**: Shared response types
//! - **errors**: Centralized error handling
//!
//! # CLI Usage
//!
//! ```bash
//! formdesk serve
//! formdesk migrate up
//! formdesk admin create --email root@example.com --name Root
//! ```

pub mod api;
pub mod cli;
pub mod commands;
pub mod config;
pub mod domain;
pub mod errors;
pub mod infra;
pub mod services;
pub mod types;

// Re-export commonly used types at crate root
pub use api::AppState;
pub use config::Config;
pub use domain::{FormDefinition, Password, Session, User, UserRole};
pub use errors::{AppError, AppResult};
