//! CLI module - Command-line interface for the application.
//!
//! - `serve` - Start the HTTP server
//! - `migrate` - Database migrations
//! - `admin create` - Bootstrap an administrator account

pub mod args;

pub use args::{Cli, Commands};
