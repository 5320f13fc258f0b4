//! Unit of Work pattern implementation.
//!
//! Centralizes repository access and owns transaction lifecycle. Everything
//! done through a [`TransactionContext`] commits or rolls back together.

use async_trait::async_trait;
use sea_orm::{
    AccessMode, ConnectionTrait, DatabaseConnection, DatabaseTransaction, DbBackend,
    IsolationLevel, TransactionTrait,
};
use std::sync::Arc;
use uuid::Uuid;

use super::repositories::queries;
use super::repositories::{
    ActivationRepository, ActivationStore, FormRepository, FormStore,
    SubmissionRepository, SubmissionStore, UserRepository, UserStore,
};
use crate::domain::{FormDefinition, NewForm, PendingOtp, StoredAnswer, Submission, User};
use crate::errors::{AppError, AppResult};

/// Unit of Work trait for dependency injection.
///
/// Note: This trait is not mockable directly due to generic methods.
/// Services are exercised against SQLite instead.
#[async_trait]
pub trait UnitOfWork: Send + Sync {
    fn users(&self) -> Arc<dyn UserRepository>;

    fn forms(&self) -> Arc<dyn FormRepository>;

    fn submissions(&self) -> Arc<dyn SubmissionRepository>;

    fn activation(&self) -> Arc<dyn ActivationRepository>;

    /// Execute a closure within a transaction.
    ///
    /// The transaction is committed when the closure returns `Ok` and rolled
    /// back otherwise. The closure must only touch the store through `ctx`.
    async fn transaction<F, T>(&self, f: F) -> AppResult<T>
    where
        F: for<'a> FnOnce(TransactionContext<'a>) -> std::pin::Pin<
                Box<dyn std::future::Future<Output = AppResult<T>> + Send + 'a>,
            > + Send,
        T: Send;
}

/// Transaction context providing repository access within a transaction.
pub struct TransactionContext<'a> {
    txn: &'a DatabaseTransaction,
}

impl<'a> TransactionContext<'a> {
    fn new(txn: &'a DatabaseTransaction) -> Self {
        Self { txn }
    }

    pub fn users(&self) -> TxUserRepository<'_> {
        TxUserRepository { txn: self.txn }
    }

    pub fn forms(&self) -> TxFormRepository<'_> {
        TxFormRepository { txn: self.txn }
    }

    pub fn submissions(&self) -> TxSubmissionRepository<'_> {
        TxSubmissionRepository { txn: self.txn }
    }

    pub fn activation(&self) -> TxActivationRepository<'_> {
        TxActivationRepository { txn: self.txn }
    }
}

/// Concrete implementation of UnitOfWork
pub struct Persistence {
    db: DatabaseConnection,
    user_repo: Arc<UserStore>,
    form_repo: Arc<FormStore>,
    submission_repo: Arc<SubmissionStore>,
    activation_repo: Arc<ActivationStore>,
}

impl Persistence {
    pub fn new(db: DatabaseConnection) -> Self {
        Self {
            user_repo: Arc::new(UserStore::new(db.clone())),
            form_repo: Arc::new(FormStore::new(db.clone())),
            submission_repo: Arc::new(SubmissionStore::new(db.clone())),
            activation_repo: Arc::new(ActivationStore::new(db.clone())),
            db,
        }
    }

    async fn begin(&self) -> AppResult<DatabaseTransaction> {
        // SQLite only knows one isolation mode
        let txn = match self.db.get_database_backend() {
            DbBackend::Sqlite => self.db.begin().await,
            _ => {
                self.db
                    .begin_with_config(
                        Some(IsolationLevel::ReadCommitted),
                        Some(AccessMode::ReadWrite),
                    )
                    .await
            }
        };
        txn.map_err(AppError::from)
    }
}

#[async_trait]
impl UnitOfWork for Persistence {
    fn users(&self) -> Arc<dyn UserRepository> {
        self.user_repo.clone()
    }

    fn forms(&self) -> Arc<dyn FormRepository> {
        self.form_repo.clone()
    }

    fn submissions(&self) -> Arc<dyn SubmissionRepository> {
        self.submission_repo.clone()
    }

    fn activation(&self) -> Arc<dyn ActivationRepository> {
        self.activation_repo.clone()
    }

    async fn transaction<F, T>(&self, f: F) -> AppResult<T>
    where
        F: for<'a> FnOnce(TransactionContext<'a>) -> std::pin::Pin<
                Box<dyn std::future::Future<Output = AppResult<T>> + Send + 'a>,
            > + Send,
        T: Send,
    {
        let txn = self.begin().await?;
        let ctx = TransactionContext::new(&txn);

        match f(ctx).await {
            Ok(result) => {
                txn.commit().await.map_err(AppError::from)?;
                Ok(result)
            }
            Err(e) => {
                if let Err(rollback_err) = txn.rollback().await {
                    tracing::error!("Transaction rollback failed: {}", rollback_err);
                }
                Err(e)
            }
        }
    }
}

/// Transaction-aware user repository.
pub struct TxUserRepository<'a> {
    txn: &'a DatabaseTransaction,
}

impl<'a> TxUserRepository<'a> {
    pub async fn find_by_email(&self, email: &str) -> AppResult<Option<User>> {
        queries::users::find_by_email(self.txn, email).await
    }

    /// Set a password and mark the email verified
    pub async fn activate(&self, id: Uuid, password_hash: String) -> AppResult<User> {
        queries::users::activate(self.txn, id, password_hash).await
    }
}

/// Transaction-aware form repository.
pub struct TxFormRepository<'a> {
    txn: &'a DatabaseTransaction,
}

impl<'a> TxFormRepository<'a> {
    pub async fn find(&self, id: Uuid) -> AppResult<Option<FormDefinition>> {
        queries::forms::load(self.txn, id).await
    }

    /// Version and active flag, holding off replaces until commit
    pub async fn lock_header(&self, id: Uuid) -> AppResult<Option<(i32, bool)>> {
        queries::forms::lock_header(self.txn, id).await
    }

    /// Insert a form and its structure, returning the new id
    pub async fn insert(&self, form: NewForm, created_by: Uuid) -> AppResult<Uuid> {
        queries::forms::insert(self.txn, form, created_by).await
    }

    /// Replace the structure, returning the new version
    pub async fn replace(&self, id: Uuid, form: NewForm) -> AppResult<i32> {
        queries::forms::replace(self.txn, id, form).await
    }

    pub async fn delete(&self, id: Uuid) -> AppResult<()> {
        queries::forms::delete(self.txn, id).await
    }
}

/// Transaction-aware submission repository.
pub struct TxSubmissionRepository<'a> {
    txn: &'a DatabaseTransaction,
}

impl<'a> TxSubmissionRepository<'a> {
    pub async fn exists_for_form(&self, form_id: Uuid) -> AppResult<bool> {
        queries::submissions::exists_for_form(self.txn, form_id).await
    }

    pub async fn insert(
        &self,
        user_id: Uuid,
        form_id: Uuid,
        answers: Vec<StoredAnswer>,
    ) -> AppResult<Submission> {
        queries::submissions::insert(self.txn, user_id, form_id, answers).await
    }
}

/// Transaction-aware activation code repository.
pub struct TxActivationRepository<'a> {
    txn: &'a DatabaseTransaction,
}

impl<'a> TxActivationRepository<'a> {
    /// Pending code, locked against concurrent guesses until commit
    pub async fn find(&self, email: &str) -> AppResult<Option<PendingOtp>> {
        queries::activation::find_for_update(self.txn, email).await
    }

    /// Count a wrong guess, returning the stored total (`None` once discarded)
    pub async fn record_failure(&self, email: &str) -> AppResult<Option<i32>> {
        queries::activation::record_failure(self.txn, email).await
    }

    pub async fn discard(&self, email: &str) -> AppResult<()> {
        queries::activation::discard(self.txn, email).await
    }
}

/// Simpler API for executing transactional operations.
///
/// This helper macro reduces boilerplate when using transactions.
#[macro_export]
macro_rules! with_transaction {
    ($uow:expr, |$ctx:ident| $body:expr) => {
        $uow.transaction(|$ctx| Box::pin(async move { $body })).await
    };
}
