//! SeaORM entity definitions
//!
//! These are database-specific entities separate from domain models.

pub mod activation_otp;
pub mod form;
pub mod form_field;
pub mod form_section;
pub mod submission;
pub mod submission_answer;
pub mod user;
