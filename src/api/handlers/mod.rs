//! HTTP request handlers.

pub mod activation_handler;
pub mod auth_handler;
pub mod enrollment_handler;
pub mod form_handler;
pub mod health_handler;
pub mod submission_handler;

pub use activation_handler::activation_routes;
pub use auth_handler::auth_routes;
pub use enrollment_handler::enrollment_routes;
pub use form_handler::form_routes;
pub use submission_handler::{admin_submission_routes, submission_routes};
