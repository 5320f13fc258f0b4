//! Form definition repository.
//!
//! Forms are stored as a header row plus section and field rows. Readers
//! always get the assembled [`FormDefinition`] with siblings in display order.

use async_trait::async_trait;
use chrono::Utc;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, ConnectionTrait, DatabaseConnection, EntityTrait, QueryFilter,
    QueryOrder, QuerySelect, Set,
};
use uuid::Uuid;

use super::entities::{
    form::{self, Entity as FormEntity},
    form_field::{self, Entity as FieldEntity},
    form_section::{self, Entity as SectionEntity},
};
use crate::domain::{Field, FieldType, FormDefinition, FormSummary, NewForm, NewSection, Section};
use crate::errors::{AppError, AppResult};

#[cfg(any(test, feature = "test-utils"))]
use mockall::automock;

/// Read access to form definitions
#[cfg_attr(any(test, feature = "test-utils"), automock)]
#[async_trait]
pub trait FormRepository: Send + Sync {
    /// Full definition with ordered sections and fields
    async fn find(&self, id: Uuid) -> AppResult<Option<FormDefinition>>;

    /// Active forms, newest first
    async fn list_active(&self) -> AppResult<Vec<FormSummary>>;
}

pub struct FormStore {
    db: DatabaseConnection,
}

impl FormStore {
    pub fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }
}

#[async_trait]
impl FormRepository for FormStore {
    async fn find(&self, id: Uuid) -> AppResult<Option<FormDefinition>> {
        load(&self.db, id).await
    }

    async fn list_active(&self) -> AppResult<Vec<FormSummary>> {
        let models = FormEntity::find()
            .filter(form::Column::IsActive.eq(true))
            .order_by_desc(form::Column::CreatedAt)
            .all(&self.db)
            .await
            .map_err(AppError::from)?;

        Ok(models.into_iter().map(summary).collect())
    }
}

fn summary(model: form::Model) -> FormSummary {
    FormSummary {
        id: model.id,
        title: model.title,
        description: model.description,
        is_active: model.is_active,
        version: model.version,
        created_at: model.created_at,
    }
}

/// Load and assemble a form definition.
pub(crate) async fn load<C: ConnectionTrait>(
    db: &C,
    id: Uuid,
) -> AppResult<Option<FormDefinition>> {
    let Some(header) = FormEntity::find_by_id(id).one(db).await? else {
        return Ok(None);
    };

    let sections = SectionEntity::find()
        .filter(form_section::Column::FormId.eq(id))
        .order_by_asc(form_section::Column::SortOrder)
        .all(db)
        .await?;

    let mut fields = FieldEntity::find()
        .filter(form_field::Column::FormId.eq(id))
        .order_by_asc(form_field::Column::SortOrder)
        .all(db)
        .await?;

    let sections = sections
        .into_iter()
        .map(|section| {
            let (mine, rest): (Vec<_>, Vec<_>) = std::mem::take(&mut fields)
                .into_iter()
                .partition(|f| f.section_id == section.id);
            fields = rest;

            Ok(Section {
                id: section.id,
                title: section.title,
                order: section.sort_order,
                fields: mine.into_iter().map(field).collect::<AppResult<_>>()?,
            })
        })
        .collect::<AppResult<Vec<_>>>()?;

    Ok(Some(FormDefinition {
        id: header.id,
        title: header.title,
        description: header.description,
        is_active: header.is_active,
        version: header.version,
        created_by: header.created_by,
        created_at: header.created_at,
        updated_at: header.updated_at,
        sections,
    }))
}

/// Current version and active flag, share-locked so a concurrent replace
/// waits for the enclosing transaction.
pub(crate) async fn lock_header<C: ConnectionTrait>(
    db: &C,
    id: Uuid,
) -> AppResult<Option<(i32, bool)>> {
    let header = FormEntity::find_by_id(id).lock_shared().one(db).await?;
    Ok(header.map(|h| (h.version, h.is_active)))
}

fn field(model: form_field::Model) -> AppResult<Field> {
    let field_type = FieldType::parse(&model.field_type).ok_or_else(|| {
        AppError::internal(format!("Unknown stored field type '{}'", model.field_type))
    })?;
    let options: Vec<String> = serde_json::from_value(model.options)
        .map_err(|e| AppError::internal(format!("Malformed field options: {}", e)))?;

    Ok(Field {
        id: model.id,
        label: model.label,
        field_type,
        required: model.required,
        order: model.sort_order,
        placeholder: model.placeholder,
        options,
    })
}

/// Insert a new form header and its structure.
pub(crate) async fn insert<C: ConnectionTrait>(
    db: &C,
    form: NewForm,
    created_by: Uuid,
) -> AppResult<Uuid> {
    let now = Utc::now();
    let id = Uuid::new_v4();

    form::ActiveModel {
        id: Set(id),
        title: Set(form.title),
        description: Set(form.description),
        is_active: Set(form.is_active.unwrap_or(true)),
        version: Set(1),
        created_by: Set(created_by),
        created_at: Set(now),
        updated_at: Set(now),
    }
    .insert(db)
    .await
    .map_err(AppError::from)?;

    insert_structure(db, id, form.sections).await?;
    Ok(id)
}

/// Swap a form's structure for a new one and bump its version.
///
/// Returns `NotFound` for an unknown form.
pub(crate) async fn replace<C: ConnectionTrait>(
    db: &C,
    id: Uuid,
    form: NewForm,
) -> AppResult<i32> {
    let header = FormEntity::find_by_id(id)
        .lock_exclusive()
        .one(db)
        .await?
        .ok_or(AppError::NotFound)?;

    delete_structure(db, id).await?;

    let version = header.version + 1;
    let mut active: form::ActiveModel = header.into();
    active.title = Set(form.title);
    active.description = Set(form.description);
    if let Some(is_active) = form.is_active {
        active.is_active = Set(is_active);
    }
    active.version = Set(version);
    active.updated_at = Set(Utc::now());
    active.update(db).await.map_err(AppError::from)?;

    insert_structure(db, id, form.sections).await?;
    Ok(version)
}

/// Remove a form with its structure.
pub(crate) async fn delete<C: ConnectionTrait>(db: &C, id: Uuid) -> AppResult<()> {
    delete_structure(db, id).await?;

    let result = FormEntity::delete_by_id(id)
        .exec(db)
        .await
        .map_err(|e| AppError::from_constraint(e, "Form has submissions and cannot be deleted"))?;

    if result.rows_affected == 0 {
        return Err(AppError::NotFound);
    }
    Ok(())
}

async fn delete_structure<C: ConnectionTrait>(db: &C, form_id: Uuid) -> AppResult<()> {
    FieldEntity::delete_many()
        .filter(form_field::Column::FormId.eq(form_id))
        .exec(db)
        .await?;
    SectionEntity::delete_many()
        .filter(form_section::Column::FormId.eq(form_id))
        .exec(db)
        .await?;
    Ok(())
}

async fn insert_structure<C: ConnectionTrait>(
    db: &C,
    form_id: Uuid,
    sections: Vec<NewSection>,
) -> AppResult<()> {
    let mut section_rows = Vec::with_capacity(sections.len());
    let mut field_rows = Vec::new();

    for section in sections {
        let section_id = Uuid::new_v4();
        for field in section.fields {
            field_rows.push(form_field::ActiveModel {
                id: Set(Uuid::new_v4()),
                section_id: Set(section_id),
                form_id: Set(form_id),
                label: Set(field.label),
                field_type: Set(field.field_type.as_str().to_string()),
                required: Set(field.required),
                sort_order: Set(field.order),
                placeholder: Set(field.placeholder),
                options: Set(serde_json::json!(field.options)),
            });
        }
        section_rows.push(form_section::ActiveModel {
            id: Set(section_id),
            form_id: Set(form_id),
            title: Set(section.title),
            sort_order: Set(section.order),
        });
    }

    if !section_rows.is_empty() {
        SectionEntity::insert_many(section_rows)
            .exec_without_returning(db)
            .await?;
    }
    if !field_rows.is_empty() {
        FieldEntity::insert_many(field_rows)
            .exec_without_returning(db)
            .await?;
    }
    Ok(())
}
