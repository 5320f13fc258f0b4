use sea_orm::entity::prelude::*;

use crate::domain::Submission;

#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel)]
#[sea_orm(table_name = "submissions")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    /// One submission per user, across all forms
    #[sea_orm(unique)]
    pub user_id: Uuid,
    pub form_id: Uuid,
    pub submitted_at: DateTimeUtc,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}

impl From<Model> for Submission {
    fn from(model: Model) -> Self {
        Submission {
            id: model.id,
            user_id: model.user_id,
            form_id: model.form_id,
            submitted_at: model.submitted_at,
        }
    }
}
