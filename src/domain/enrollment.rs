//! Bulk enrollment records and reports.

use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use super::password::Password;
use super::user::normalize_email;
use crate::config::EMAIL_PATTERN;
use crate::errors::{AppError, AppResult};

static EMAIL_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(EMAIL_PATTERN).expect("email pattern must compile"));

/// Whether `email` has the accepted address shape
pub fn is_valid_email(email: &str) -> bool {
    EMAIL_RE.is_match(email)
}

/// One parsed row of an enrollment table
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct EnrollmentRecord {
    /// 1-based data row
    #[serde(default)]
    pub row: usize,
    pub email: String,
    pub name: String,
    /// Only present when the table has a password column
    #[serde(default, skip_serializing)]
    pub password: Option<String>,
    #[serde(default)]
    pub valid: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reason: Option<String>,
}

impl EnrollmentRecord {
    /// Build a normalized record and derive its validity.
    pub fn new(row: usize, email: &str, name: &str, password: Option<&str>) -> Self {
        let mut record = Self {
            row,
            email: normalize_email(email),
            name: name.trim().to_string(),
            password: password.map(|p| p.trim().to_string()),
            valid: false,
            reason: None,
        };
        record.revalidate();
        record
    }

    /// Recompute `valid` and `reason` from the normalized cells.
    ///
    /// Records arrive back from clients, so their flags are never trusted.
    pub fn revalidate(&mut self) {
        self.email = normalize_email(&self.email);
        self.name = self.name.trim().to_string();

        let reason = if !is_valid_email(&self.email) {
            Some("Invalid email address".to_string())
        } else if self.name.is_empty() {
            Some("Name is required".to_string())
        } else {
            match self.password.as_deref().map(str::trim) {
                Some("") => Some("Password is required".to_string()),
                Some(p) => Password::check_policy(p).err().map(|e| e.to_string()),
                None => None,
            }
        };

        self.valid = reason.is_none();
        self.reason = reason;
    }
}

/// Parse a CSV enrollment table.
///
/// The header must name an `email` and a `name` column (any case); a
/// `password` column is optional. Blank rows are skipped, invalid rows are kept.
pub fn parse_enrollment_table(text: &str) -> AppResult<Vec<EnrollmentRecord>> {
    let mut reader = csv::ReaderBuilder::new()
        .trim(csv::Trim::All)
        .flexible(true)
        .from_reader(text.as_bytes());

    let headers = reader
        .headers()
        .map_err(|e| AppError::bad_request(format!("Unreadable header row: {}", e)))?
        .clone();
    let column = |name: &str| headers.iter().position(|h| h.eq_ignore_ascii_case(name));

    let (Some(email_col), Some(name_col)) = (column("email"), column("name")) else {
        return Err(AppError::bad_request(
            "The header row must contain 'email' and 'name' columns",
        ));
    };
    let password_col = column("password");

    let mut records = Vec::new();
    for result in reader.records() {
        let row = result.map_err(|e| AppError::bad_request(format!("Malformed table: {}", e)))?;
        if row.iter().all(str::is_empty) {
            continue;
        }

        let cell = |idx: usize| row.get(idx).unwrap_or("");
        records.push(EnrollmentRecord::new(
            records.len() + 1,
            cell(email_col),
            cell(name_col),
            password_col.map(cell),
        ));
    }

    Ok(records)
}

/// Activation progress of one enrollee
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, ToSchema)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ActivationState {
    Created,
    OtpRequested,
    Activated,
}

/// What happened to one record during enrollment
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, ToSchema)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum EnrollmentStatus {
    /// Account created and an activation code mailed
    OtpSent,
    /// Account created with the supplied password
    Activated,
    /// Account created but the activation mail failed
    DeliveryFailed,
    /// Email already registered or repeated in the batch
    Skipped,
    Invalid,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, ToSchema)]
pub struct EnrollmentOutcome {
    pub row: usize,
    pub email: String,
    pub status: EnrollmentStatus,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reason: Option<String>,
}

impl EnrollmentOutcome {
    pub fn new(record: &EnrollmentRecord, status: EnrollmentStatus, reason: Option<String>) -> Self {
        Self {
            row: record.row,
            email: record.email.clone(),
            status,
            reason,
        }
    }
}

/// Batch result
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, ToSchema)]
pub struct EnrollmentReport {
    /// Accounts created, whether or not their activation mail went out
    pub created: usize,
    pub skipped: usize,
    /// Invalid records plus failed deliveries
    pub failed: usize,
    pub records: Vec<EnrollmentOutcome>,
}

impl EnrollmentReport {
    /// Tally outcomes, keeping them in row order.
    pub fn from_outcomes(mut records: Vec<EnrollmentOutcome>) -> Self {
        records.sort_by_key(|o| o.row);
        let count = |f: fn(EnrollmentStatus) -> bool| records.iter().filter(|o| f(o.status)).count();

        Self {
            created: count(|s| {
                matches!(
                    s,
                    EnrollmentStatus::OtpSent
                        | EnrollmentStatus::Activated
                        | EnrollmentStatus::DeliveryFailed
                )
            }),
            skipped: count(|s| s == EnrollmentStatus::Skipped),
            failed: count(|s| {
                matches!(s, EnrollmentStatus::Invalid | EnrollmentStatus::DeliveryFailed)
            }),
            records,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rows_are_normalized_and_kept() {
        let records = parse_enrollment_table("Email,Name\n A@x.com ,Bob\nbad,\n").unwrap();

        assert_eq!(records.len(), 2);
        assert_eq!(records[0].email, "a@x.com");
        assert_eq!(records[0].name, "Bob");
        assert!(records[0].valid);
        assert!(!records[1].valid);
        assert_eq!(records[1].row, 2);
        assert_eq!(records[1].reason.as_deref(), Some("Invalid email address"));
    }

    #[test]
    fn test_parse_is_deterministic() {
        let input = "name,email\nAda,ada@example.com\n\n,x@y.z\nGrace,grace@\n";
        assert_eq!(
            parse_enrollment_table(input).unwrap(),
            parse_enrollment_table(input).unwrap()
        );
    }

    #[test]
    fn test_blank_lines_skipped() {
        let records = parse_enrollment_table("email,name\n\n , \nada@example.com,Ada\n").unwrap();
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].row, 1);
    }

    #[test]
    fn test_missing_columns_rejected() {
        assert!(matches!(
            parse_enrollment_table("mail,name\na@x.com,A\n"),
            Err(AppError::BadRequest(_))
        ));
    }

    #[test]
    fn test_password_column_must_be_filled() {
        let records =
            parse_enrollment_table("email,name,password\na@x.com,A,\nb@x.com,B,longenough\n")
                .unwrap();
        assert_eq!(records[0].reason.as_deref(), Some("Password is required"));
        assert!(records[1].valid);
        assert_eq!(records[1].password.as_deref(), Some("longenough"));
    }

    #[test]
    fn test_password_never_serialized() {
        let record = EnrollmentRecord::new(1, "a@x.com", "A", Some("longenough"));
        let json = serde_json::to_value(&record).unwrap();
        assert!(json.get("password").is_none());
    }

    #[test]
    fn test_revalidate_ignores_client_flags() {
        let mut record = EnrollmentRecord {
            row: 1,
            email: "nope".into(),
            name: "A".into(),
            password: None,
            valid: true,
            reason: None,
        };
        record.revalidate();
        assert!(!record.valid);
    }

    #[test]
    fn test_report_counts() {
        let record = EnrollmentRecord::new(1, "a@x.com", "A", None);
        let report = EnrollmentReport::from_outcomes(vec![
            EnrollmentOutcome::new(&record, EnrollmentStatus::DeliveryFailed, None),
            EnrollmentOutcome::new(&record, EnrollmentStatus::Skipped, None),
            EnrollmentOutcome::new(&record, EnrollmentStatus::OtpSent, None),
        ]);
        assert_eq!((report.created, report.skipped, report.failed), (2, 1, 1));
    }
}
