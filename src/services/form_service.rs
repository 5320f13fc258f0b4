//! Form definition service.
//!
//! Drafts are validated and normalized before any write; every write runs in
//! one transaction so a form is never left half replaced.

use async_trait::async_trait;
use std::sync::Arc;
use uuid::Uuid;

use crate::domain::{FormDefinition, FormDraft, FormSummary, Session};
use crate::errors::{AppError, AppResult, OptionExt};
use crate::infra::UnitOfWork;
use crate::with_transaction;

#[async_trait]
pub trait FormService: Send + Sync {
    /// Create a form (admin only)
    async fn create(&self, session: &Session, draft: FormDraft) -> AppResult<FormDefinition>;

    /// Replace a form's content and structure (admin only)
    async fn replace(&self, session: &Session, id: Uuid, draft: FormDraft) -> AppResult<()>;

    /// Delete a form nobody has submitted (admin only)
    async fn delete(&self, session: &Session, id: Uuid) -> AppResult<()>;

    async fn get(&self, id: Uuid) -> AppResult<FormDefinition>;

    /// Active forms, newest first
    async fn list_active(&self) -> AppResult<Vec<FormSummary>>;
}

pub struct FormManager<U: UnitOfWork> {
    uow: Arc<U>,
}

impl<U: UnitOfWork> FormManager<U> {
    pub fn new(uow: Arc<U>) -> Self {
        Self { uow }
    }
}

#[async_trait]
impl<U: UnitOfWork> FormService for FormManager<U> {
    async fn create(&self, session: &Session, draft: FormDraft) -> AppResult<FormDefinition> {
        session.require_admin()?;
        let form = draft.into_new_form()?;
        let created_by = session.user_id;

        let created = self
            .uow
            .transaction(move |ctx| {
                Box::pin(async move {
                    let id = ctx.forms().insert(form, created_by).await?;
                    ctx.forms().find(id).await?.ok_or_not_found()
                })
            })
            .await?;

        tracing::info!(form_id = %created.id, admin = %session.user_id, "Form created");
        Ok(created)
    }

    async fn replace(&self, session: &Session, id: Uuid, draft: FormDraft) -> AppResult<()> {
        session.require_admin()?;
        let form = draft.into_new_form()?;

        let version = with_transaction!(self.uow, |ctx| ctx.forms().replace(id, form).await)?;

        tracing::info!(form_id = %id, version, "Form replaced");
        Ok(())
    }

    async fn delete(&self, session: &Session, id: Uuid) -> AppResult<()> {
        session.require_admin()?;

        self.uow
            .transaction(move |ctx| {
                Box::pin(async move {
                    if ctx.forms().find(id).await?.is_none() {
                        return Err(AppError::NotFound);
                    }
                    if ctx.submissions().exists_for_form(id).await? {
                        return Err(AppError::conflict(
                            "Form has submissions and cannot be deleted",
                        ));
                    }
                    ctx.forms().delete(id).await
                })
            })
            .await?;

        tracing::info!(form_id = %id, "Form deleted");
        Ok(())
    }

    async fn get(&self, id: Uuid) -> AppResult<FormDefinition> {
        self.uow.forms().find(id).await?.ok_or_not_found()
    }

    async fn list_active(&self) -> AppResult<Vec<FormSummary>> {
        self.uow.forms().list_active().await
    }
}
