//! Submission repository.

use std::collections::HashMap;

use async_trait::async_trait;
use chrono::Utc;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, ConnectionTrait, DatabaseConnection, EntityTrait,
    PaginatorTrait, QueryFilter, QueryOrder, Set,
};
use uuid::Uuid;

use super::entities::{
    form::{self, Entity as FormEntity},
    submission::{self, Entity as SubmissionEntity},
    submission_answer::{self, Entity as AnswerEntity},
    user::{self, Entity as UserEntity},
};
use crate::domain::{StoredAnswer, Submission, SubmissionSummary};
use crate::errors::{AppError, AppResult};

#[cfg(any(test, feature = "test-utils"))]
use mockall::automock;

/// Message surfaced when a user tries to submit twice
pub const ALREADY_SUBMITTED: &str = "You have already submitted a form";

#[cfg_attr(any(test, feature = "test-utils"), automock)]
#[async_trait]
pub trait SubmissionRepository: Send + Sync {
    /// The user's submission, if any
    async fn find_by_user(&self, user_id: Uuid) -> AppResult<Option<Submission>>;

    /// Stored answers of a submission
    async fn answers(&self, submission_id: Uuid) -> AppResult<Vec<StoredAnswer>>;

    /// Every submission with user and form labels, newest first
    async fn list_summaries(&self) -> AppResult<Vec<SubmissionSummary>>;
}

pub struct SubmissionStore {
    db: DatabaseConnection,
}

impl SubmissionStore {
    pub fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }
}

#[async_trait]
impl SubmissionRepository for SubmissionStore {
    async fn find_by_user(&self, user_id: Uuid) -> AppResult<Option<Submission>> {
        let result = SubmissionEntity::find()
            .filter(submission::Column::UserId.eq(user_id))
            .one(&self.db)
            .await
            .map_err(AppError::from)?;

        Ok(result.map(Submission::from))
    }

    async fn answers(&self, submission_id: Uuid) -> AppResult<Vec<StoredAnswer>> {
        let models = AnswerEntity::find()
            .filter(submission_answer::Column::SubmissionId.eq(submission_id))
            .all(&self.db)
            .await
            .map_err(AppError::from)?;

        models
            .into_iter()
            .map(|m| {
                let value = serde_json::from_value(m.value).map_err(|e| {
                    AppError::internal(format!("Malformed stored answer {}: {}", m.id, e))
                })?;
                Ok(StoredAnswer {
                    field_id: m.field_id,
                    value,
                })
            })
            .collect()
    }

    async fn list_summaries(&self) -> AppResult<Vec<SubmissionSummary>> {
        let submissions = SubmissionEntity::find()
            .order_by_desc(submission::Column::SubmittedAt)
            .all(&self.db)
            .await
            .map_err(AppError::from)?;

        if submissions.is_empty() {
            return Ok(Vec::new());
        }

        let user_ids: Vec<Uuid> = submissions.iter().map(|s| s.user_id).collect();
        let form_ids: Vec<Uuid> = submissions.iter().map(|s| s.form_id).collect();

        let emails: HashMap<Uuid, String> = UserEntity::find()
            .filter(user::Column::Id.is_in(user_ids))
            .all(&self.db)
            .await?
            .into_iter()
            .map(|u| (u.id, u.email))
            .collect();
        let titles: HashMap<Uuid, String> = FormEntity::find()
            .filter(form::Column::Id.is_in(form_ids))
            .all(&self.db)
            .await?
            .into_iter()
            .map(|f| (f.id, f.title))
            .collect();

        Ok(submissions
            .into_iter()
            .map(|s| SubmissionSummary {
                submission_id: s.id,
                user_email: emails.get(&s.user_id).cloned().unwrap_or_default(),
                user_id: s.user_id,
                form_title: titles.get(&s.form_id).cloned().unwrap_or_default(),
                submitted_at: s.submitted_at,
            })
            .collect())
    }
}

/// Whether any submission references the form.
pub(crate) async fn exists_for_form<C: ConnectionTrait>(db: &C, form_id: Uuid) -> AppResult<bool> {
    let count = SubmissionEntity::find()
        .filter(submission::Column::FormId.eq(form_id))
        .count(db)
        .await?;
    Ok(count > 0)
}

/// Insert a submission with its answers.
///
/// The unique index on `user_id` turns a lost race into `Conflict`.
pub(crate) async fn insert<C: ConnectionTrait>(
    db: &C,
    user_id: Uuid,
    form_id: Uuid,
    answers: Vec<StoredAnswer>,
) -> AppResult<Submission> {
    let model = submission::ActiveModel {
        id: Set(Uuid::new_v4()),
        user_id: Set(user_id),
        form_id: Set(form_id),
        submitted_at: Set(Utc::now()),
    }
    .insert(db)
    .await
    .map_err(|e| AppError::from_constraint(e, ALREADY_SUBMITTED))?;

    let rows = answers
        .into_iter()
        .map(|answer| {
            let value = serde_json::to_value(&answer.value)
                .map_err(|e| AppError::internal(format!("Answer encoding failed: {}", e)))?;
            Ok(submission_answer::ActiveModel {
                id: Set(Uuid::new_v4()),
                submission_id: Set(model.id),
                field_id: Set(answer.field_id),
                value: Set(value),
            })
        })
        .collect::<AppResult<Vec<_>>>()?;

    if !rows.is_empty() {
        AnswerEntity::insert_many(rows)
            .exec_without_returning(db)
            .await?;
    }

    Ok(Submission::from(model))
}
