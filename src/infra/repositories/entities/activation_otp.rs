//! Pending activation code, at most one per email.

use sea_orm::entity::prelude::*;

use crate::domain::otp::PendingOtp;

#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel)]
#[sea_orm(table_name = "activation_otps")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub email: String,
    /// Hex SHA-256 of the code
    pub code_hash: String,
    pub expires_at: DateTimeUtc,
    pub attempts: i32,
    pub created_at: DateTimeUtc,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}

impl From<Model> for PendingOtp {
    fn from(model: Model) -> Self {
        PendingOtp {
            email: model.email,
            code_hash: model.code_hash,
            expires_at: model.expires_at,
            attempts: model.attempts,
        }
    }
}
