//! Submission service - one submission per user.

use async_trait::async_trait;
use serde_json::Value;
use std::sync::Arc;
use uuid::Uuid;

use crate::domain::submission::{decode_answers, render_answers};
use crate::domain::{FormBrief, MySubmission, Session, Submission, SubmissionSummary, UserBrief};
use crate::errors::{AppError, AppResult, OptionExt};
use crate::infra::{UnitOfWork, ALREADY_SUBMITTED};

#[async_trait]
pub trait SubmissionService: Send + Sync {
    /// Record the caller's answers for a form
    async fn submit(&self, session: &Session, form_id: Uuid, answers: Value)
        -> AppResult<Submission>;

    /// The caller's submission with labelled answers
    async fn get_mine(&self, session: &Session) -> AppResult<MySubmission>;

    /// Every submission (admin only)
    async fn list_all(&self, session: &Session) -> AppResult<Vec<SubmissionSummary>>;
}

pub struct SubmissionManager<U: UnitOfWork> {
    uow: Arc<U>,
}

impl<U: UnitOfWork> SubmissionManager<U> {
    pub fn new(uow: Arc<U>) -> Self {
        Self { uow }
    }
}

#[async_trait]
impl<U: UnitOfWork> SubmissionService for SubmissionManager<U> {
    async fn submit(
        &self,
        session: &Session,
        form_id: Uuid,
        answers: Value,
    ) -> AppResult<Submission> {
        if answers.as_object().map_or(true, |m| m.is_empty()) {
            return Err(AppError::bad_request("No answers were provided"));
        }

        let form = self.uow.forms().find(form_id).await?.ok_or_not_found()?;
        if !form.is_active {
            return Err(AppError::bad_request("This form is not accepting submissions"));
        }

        let user_id = session.user_id;
        if self.uow.submissions().find_by_user(user_id).await?.is_some() {
            return Err(AppError::conflict(ALREADY_SUBMITTED));
        }

        let decoded = decode_answers(&form, &answers)?;
        let version = form.version;

        let submission = self
            .uow
            .transaction(move |ctx| {
                Box::pin(async move {
                    // The structure the answers were checked against must still be current
                    let (current, is_active) =
                        ctx.forms().lock_header(form_id).await?.ok_or_not_found()?;
                    if !is_active {
                        return Err(AppError::bad_request(
                            "This form is not accepting submissions",
                        ));
                    }
                    if current != version {
                        return Err(AppError::conflict(
                            "The form changed while you were answering, please reload it",
                        ));
                    }
                    ctx.submissions().insert(user_id, form_id, decoded).await
                })
            })
            .await?;

        tracing::info!(
            submission_id = %submission.id,
            form_id = %form_id,
            user_id = %user_id,
            "Submission recorded"
        );
        Ok(submission)
    }

    async fn get_mine(&self, session: &Session) -> AppResult<MySubmission> {
        let submission = self
            .uow
            .submissions()
            .find_by_user(session.user_id)
            .await?
            .ok_or_not_found()?;

        let user = self
            .uow
            .users()
            .find_by_id(session.user_id)
            .await?
            .ok_or_not_found()?;
        let form = self
            .uow
            .forms()
            .find(submission.form_id)
            .await?
            .ok_or_not_found()?;
        let answers = self.uow.submissions().answers(submission.id).await?;

        Ok(MySubmission {
            id: submission.id,
            submitted_at: submission.submitted_at,
            answers: render_answers(&form, answers),
            form: FormBrief {
                id: form.id,
                title: form.title,
                description: form.description,
                version: form.version,
            },
            user: UserBrief {
                id: user.id,
                name: user.name,
                email: user.email,
                created_at: user.created_at,
            },
        })
    }

    async fn list_all(&self, session: &Session) -> AppResult<Vec<SubmissionSummary>> {
        session.require_admin()?;
        self.uow.submissions().list_summaries().await
    }
}
