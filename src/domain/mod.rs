//! Domain layer - Core business entities and logic
//!
//! Forms, answers, submissions, users and enrollment records, independent of
//! storage and transport.

pub mod answer;
pub mod enrollment;
pub mod form;
pub mod otp;
pub mod password;
pub mod submission;
pub mod user;

pub use answer::{AnswerError, AnswerValue};
pub use enrollment::{
    is_valid_email, parse_enrollment_table, ActivationState, EnrollmentOutcome,
    EnrollmentRecord, EnrollmentReport, EnrollmentStatus,
};
pub use form::{
    Field, FieldDraft, FieldType, FormDefinition, FormDraft, FormSummary, NewField, NewForm,
    NewSection, Section, SectionDraft,
};
pub use otp::{OneTimePassword, PendingOtp};
pub use password::Password;
pub use submission::{
    AnswerView, FormBrief, MySubmission, StoredAnswer, Submission, SubmissionSummary, UserBrief,
};
pub use user::{normalize_email, Session, User, UserResponse, UserRole};
