use sea_orm::entity::prelude::*;

#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel)]
#[sea_orm(table_name = "form_fields")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    pub section_id: Uuid,
    /// Denormalized so a replace can clear a form's fields in one statement
    pub form_id: Uuid,
    pub label: String,
    pub field_type: String,
    pub required: bool,
    pub sort_order: i32,
    pub placeholder: Option<String>,
    /// JSON array of option labels, empty for non-choice types
    pub options: Json,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}
