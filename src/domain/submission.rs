//! Submissions and their answers.

use chrono::{DateTime, Utc};
use serde::Serialize;
use serde_json::Value;
use utoipa::ToSchema;
use uuid::Uuid;

use super::answer::AnswerValue;
use super::form::{FieldType, FormDefinition};
use crate::errors::{AppError, AppResult};

/// One completed form, at most one per user
#[derive(Debug, Clone, PartialEq, Serialize, ToSchema)]
pub struct Submission {
    pub id: Uuid,
    pub user_id: Uuid,
    pub form_id: Uuid,
    pub submitted_at: DateTime<Utc>,
}

/// Stored answer as loaded back from the store
#[derive(Debug, Clone, PartialEq)]
pub struct StoredAnswer {
    pub field_id: Uuid,
    pub value: AnswerValue,
}

/// Answer rendered for the submitting user
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct AnswerView {
    pub field_id: Uuid,
    /// `None` once the field has been replaced away
    pub label: Option<String>,
    #[serde(rename = "type")]
    pub field_type: FieldType,
    #[schema(value_type = Object)]
    pub value: Value,
    pub display: String,
}

#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct FormBrief {
    pub id: Uuid,
    pub title: String,
    pub description: Option<String>,
    pub version: i32,
}

#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct UserBrief {
    pub id: Uuid,
    pub name: String,
    pub email: String,
    pub created_at: DateTime<Utc>,
}

/// The caller's own submission with everything needed to render it
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct MySubmission {
    pub id: Uuid,
    pub submitted_at: DateTime<Utc>,
    pub form: FormBrief,
    pub user: UserBrief,
    pub answers: Vec<AnswerView>,
}

/// Admin listing row
#[derive(Debug, Clone, PartialEq, Serialize, ToSchema)]
pub struct SubmissionSummary {
    pub submission_id: Uuid,
    pub user_email: String,
    pub user_id: Uuid,
    pub form_title: String,
    pub submitted_at: DateTime<Utc>,
}

/// Decode raw answers against `form` and enforce required fields.
///
/// `answers` must be a non-empty JSON object keyed by field id. Every problem
/// is reported in a single `BadRequest`. Absent answers are dropped, and at
/// least one answer must remain.
pub fn decode_answers(form: &FormDefinition, answers: &Value) -> AppResult<Vec<StoredAnswer>> {
    let entries = match answers.as_object() {
        Some(map) if !map.is_empty() => map,
        Some(_) => return Err(AppError::bad_request("No answers were provided")),
        None => {
            return Err(AppError::bad_request(
                "Answers must be an object keyed by field id",
            ))
        }
    };

    let mut problems = Vec::new();
    let mut decoded = Vec::with_capacity(entries.len());

    for (key, raw) in entries {
        let Some(field) = Uuid::parse_str(key).ok().and_then(|id| form.field(id)) else {
            problems.push(format!("Unknown field '{}'", key));
            continue;
        };
        match AnswerValue::decode(field, raw) {
            Ok(Some(value)) => decoded.push(StoredAnswer {
                field_id: field.id,
                value,
            }),
            Ok(None) => {}
            Err(e) => problems.push(e.to_string()),
        }
    }

    let missing: Vec<&str> = form
        .fields()
        .filter(|f| f.required && !decoded.iter().any(|a| a.field_id == f.id))
        .map(|f| f.label.as_str())
        .collect();
    if !missing.is_empty() {
        problems.push(format!("Required fields missing: {}", missing.join(", ")));
    }

    if !problems.is_empty() {
        return Err(AppError::bad_request(problems.join("; ")));
    }
    if decoded.is_empty() {
        return Err(AppError::bad_request("No answers were provided"));
    }

    Ok(decoded)
}

/// Render stored answers in form order; answers whose field is gone come last.
pub fn render_answers(form: &FormDefinition, answers: Vec<StoredAnswer>) -> Vec<AnswerView> {
    let position = |field_id: Uuid| form.fields().position(|f| f.id == field_id);

    let mut keyed: Vec<(Option<usize>, AnswerView)> = answers
        .into_iter()
        .map(|answer| {
            let label = form.field(answer.field_id).map(|f| f.label.clone());
            let view = AnswerView {
                field_id: answer.field_id,
                label,
                field_type: answer.value.field_type(),
                value: answer.value.raw(),
                display: answer.value.display(),
            };
            (position(answer.field_id), view)
        })
        .collect();

    keyed.sort_by_key(|(pos, _)| pos.unwrap_or(usize::MAX));
    keyed.into_iter().map(|(_, view)| view).collect()
}
