//! Pending activation codes.

use async_trait::async_trait;
use chrono::Utc;
use sea_orm::{
    sea_query::{Expr, OnConflict},
    ColumnTrait, ConnectionTrait, DatabaseConnection, EntityTrait, QueryFilter, QuerySelect, Set,
};

use super::entities::activation_otp::{self, ActiveModel, Entity as OtpEntity};
use crate::domain::PendingOtp;
use crate::errors::{AppError, AppResult};

#[cfg(any(test, feature = "test-utils"))]
use mockall::automock;

#[cfg_attr(any(test, feature = "test-utils"), automock)]
#[async_trait]
pub trait ActivationRepository: Send + Sync {
    /// Pending code for an email
    async fn find(&self, email: &str) -> AppResult<Option<PendingOtp>>;

    /// Store a code, replacing any pending one for the same email
    async fn save(&self, otp: PendingOtp) -> AppResult<()>;
}

pub struct ActivationStore {
    db: DatabaseConnection,
}

impl ActivationStore {
    pub fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }
}

#[async_trait]
impl ActivationRepository for ActivationStore {
    async fn find(&self, email: &str) -> AppResult<Option<PendingOtp>> {
        find(&self.db, email).await
    }

    async fn save(&self, otp: PendingOtp) -> AppResult<()> {
        let model = ActiveModel {
            email: Set(otp.email),
            code_hash: Set(otp.code_hash),
            expires_at: Set(otp.expires_at),
            attempts: Set(otp.attempts),
            created_at: Set(Utc::now()),
        };

        OtpEntity::insert(model)
            .on_conflict(
                OnConflict::column(activation_otp::Column::Email)
                    .update_columns([
                        activation_otp::Column::CodeHash,
                        activation_otp::Column::ExpiresAt,
                        activation_otp::Column::Attempts,
                        activation_otp::Column::CreatedAt,
                    ])
                    .to_owned(),
            )
            .exec_without_returning(&self.db)
            .await
            .map_err(AppError::from)?;

        Ok(())
    }
}

pub(crate) async fn find<C: ConnectionTrait>(db: &C, email: &str) -> AppResult<Option<PendingOtp>> {
    let result = OtpEntity::find_by_id(email.to_string())
        .one(db)
        .await
        .map_err(AppError::from)?;

    Ok(result.map(PendingOtp::from))
}

/// Pending code, row-locked until the enclosing transaction ends.
pub(crate) async fn find_for_update<C: ConnectionTrait>(
    db: &C,
    email: &str,
) -> AppResult<Option<PendingOtp>> {
    let result = OtpEntity::find_by_id(email.to_string())
        .lock_exclusive()
        .one(db)
        .await
        .map_err(AppError::from)?;

    Ok(result.map(PendingOtp::from))
}

/// Count a wrong guess and return the stored total.
///
/// The increment happens in the store, so concurrent guesses never overwrite
/// each other. `None` when the code is already gone.
pub(crate) async fn record_failure<C: ConnectionTrait>(db: &C, email: &str) -> AppResult<Option<i32>> {
    OtpEntity::update_many()
        .col_expr(
            activation_otp::Column::Attempts,
            Expr::col(activation_otp::Column::Attempts).add(1),
        )
        .filter(activation_otp::Column::Email.eq(email))
        .exec(db)
        .await
        .map_err(AppError::from)?;

    Ok(find(db, email).await?.map(|otp| otp.attempts))
}

pub(crate) async fn discard<C: ConnectionTrait>(db: &C, email: &str) -> AppResult<()> {
    OtpEntity::delete_by_id(email.to_string())
        .exec(db)
        .await
        .map_err(AppError::from)?;
    Ok(())
}
