//! Form definitions: sections of typed fields.
//!
//! Drafts come from the builder as loosely typed input. [`FormDraft::into_new_form`]
//! turns a draft into a [`NewForm`] whose sections and fields carry a parsed
//! [`FieldType`] and contiguous `order` values, or reports every problem at once.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

use crate::errors::{AppError, AppResult};

/// Closed set of answerable field types
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "UPPERCASE")]
pub enum FieldType {
    Text,
    Textarea,
    Number,
    Boolean,
    Date,
    Select,
    Radio,
    Checkbox,
}

impl FieldType {
    pub const ALL: [FieldType; 8] = [
        FieldType::Text,
        FieldType::Textarea,
        FieldType::Number,
        FieldType::Boolean,
        FieldType::Date,
        FieldType::Select,
        FieldType::Radio,
        FieldType::Checkbox,
    ];

    /// Stored and wire name
    pub fn as_str(&self) -> &'static str {
        match self {
            FieldType::Text => "TEXT",
            FieldType::Textarea => "TEXTAREA",
            FieldType::Number => "NUMBER",
            FieldType::Boolean => "BOOLEAN",
            FieldType::Date => "DATE",
            FieldType::Select => "SELECT",
            FieldType::Radio => "RADIO",
            FieldType::Checkbox => "CHECKBOX",
        }
    }

    /// Choice types answer from a fixed list of options
    pub fn requires_options(&self) -> bool {
        matches!(
            self,
            FieldType::Select | FieldType::Radio | FieldType::Checkbox
        )
    }

    /// Parse a type name, case-insensitively.
    pub fn parse(name: &str) -> Option<Self> {
        let name = name.trim();
        Self::ALL
            .into_iter()
            .find(|t| t.as_str().eq_ignore_ascii_case(name))
    }
}

impl std::fmt::Display for FieldType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

// =============================================================================
// Builder input
// =============================================================================

/// Form as submitted by the builder (create and replace share it)
#[derive(Debug, Clone, Default, Deserialize, ToSchema)]
pub struct FormDraft {
    #[schema(example = "Onboarding survey")]
    pub title: String,
    #[serde(default)]
    pub description: Option<String>,
    /// Leave unset to keep the current flag (new forms start active)
    #[serde(default)]
    pub is_active: Option<bool>,
    #[serde(default, alias = "field_headers")]
    pub sections: Vec<SectionDraft>,
}

#[derive(Debug, Clone, Default, Deserialize, ToSchema)]
pub struct SectionDraft {
    #[serde(default)]
    pub title: String,
    /// 1-based position; missing values fall back to the input position
    #[serde(default)]
    pub order: Option<i32>,
    #[serde(default)]
    pub fields: Vec<FieldDraft>,
}

#[derive(Debug, Clone, Default, Deserialize, ToSchema)]
pub struct FieldDraft {
    pub label: String,
    #[serde(rename = "type")]
    #[schema(example = "TEXT")]
    pub field_type: String,
    #[serde(default)]
    pub required: bool,
    #[serde(default)]
    pub order: Option<i32>,
    #[serde(default)]
    pub placeholder: Option<String>,
    #[serde(default)]
    pub options: Option<Vec<String>>,
}

/// Validated form ready to be written
#[derive(Debug, Clone, PartialEq)]
pub struct NewForm {
    pub title: String,
    pub description: Option<String>,
    pub is_active: Option<bool>,
    pub sections: Vec<NewSection>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct NewSection {
    pub title: String,
    pub order: i32,
    pub fields: Vec<NewField>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct NewField {
    pub label: String,
    pub field_type: FieldType,
    pub required: bool,
    pub order: i32,
    pub placeholder: Option<String>,
    pub options: Vec<String>,
}

impl FormDraft {
    /// Validate the draft and normalize sibling ordering.
    ///
    /// All problems are collected into a single `BadRequest`.
    pub fn into_new_form(self) -> AppResult<NewForm> {
        let mut problems = Vec::new();

        let title = self.title.trim().to_string();
        if title.is_empty() {
            problems.push("Form title is required".to_string());
        }

        let sections = reorder(self.sections, |s| s.order)
            .into_iter()
            .enumerate()
            .map(|(s_idx, (input_pos, section))| {
                let fields = reorder(section.fields, |f| f.order)
                    .into_iter()
                    .enumerate()
                    .filter_map(|(f_idx, (field_pos, field))| {
                        let location = format!("Section {} field {}", input_pos + 1, field_pos + 1);
                        validate_field(field, f_idx as i32 + 1, &location, &mut problems)
                    })
                    .collect();

                NewSection {
                    title: section.title.trim().to_string(),
                    order: s_idx as i32 + 1,
                    fields,
                }
            })
            .collect();

        if !problems.is_empty() {
            return Err(AppError::bad_request(problems.join("; ")));
        }

        Ok(NewForm {
            title,
            description: non_blank(self.description),
            is_active: self.is_active,
            sections,
        })
    }
}

/// Stable sort by the supplied order, keeping the input position for diagnostics.
fn reorder<T>(items: Vec<T>, order: impl Fn(&T) -> Option<i32>) -> Vec<(usize, T)> {
    let mut keyed: Vec<(i64, usize, T)> = items
        .into_iter()
        .enumerate()
        .map(|(pos, item)| {
            let key = order(&item).map(i64::from).unwrap_or(pos as i64 + 1);
            (key, pos, item)
        })
        .collect();
    keyed.sort_by_key(|(key, pos, _)| (*key, *pos));
    keyed.into_iter().map(|(_, pos, item)| (pos, item)).collect()
}

fn validate_field(
    field: FieldDraft,
    order: i32,
    location: &str,
    problems: &mut Vec<String>,
) -> Option<NewField> {
    let label = field.label.trim().to_string();
    if label.is_empty() {
        problems.push(format!("{}: label is required", location));
    }

    let Some(field_type) = FieldType::parse(&field.field_type) else {
        problems.push(format!(
            "{}: unknown field type '{}'",
            location, field.field_type
        ));
        return None;
    };

    let mut options: Vec<String> = Vec::new();
    if field_type.requires_options() {
        for option in field.options.unwrap_or_default() {
            let option = option.trim().to_string();
            if option.is_empty() {
                continue;
            }
            if options.contains(&option) {
                problems.push(format!("{}: duplicate option '{}'", location, option));
                continue;
            }
            options.push(option);
        }
        if options.is_empty() {
            problems.push(format!(
                "{}: {} fields need at least one option",
                location, field_type
            ));
        }
    }

    Some(NewField {
        label,
        field_type,
        required: field.required,
        order,
        placeholder: non_blank(field.placeholder),
        options,
    })
}

fn non_blank(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

// =============================================================================
// Stored definitions
// =============================================================================

/// Full form definition with ordered sections and fields
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct FormDefinition {
    pub id: Uuid,
    pub title: String,
    pub description: Option<String>,
    pub is_active: bool,
    pub version: i32,
    pub created_by: Uuid,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub sections: Vec<Section>,
}

#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct Section {
    pub id: Uuid,
    pub title: String,
    pub order: i32,
    pub fields: Vec<Field>,
}

#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct Field {
    pub id: Uuid,
    pub label: String,
    #[serde(rename = "type")]
    pub field_type: FieldType,
    pub required: bool,
    pub order: i32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub placeholder: Option<String>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub options: Vec<String>,
}

impl FormDefinition {
    /// Every field in display order
    pub fn fields(&self) -> impl Iterator<Item = &Field> {
        self.sections.iter().flat_map(|s| s.fields.iter())
    }

    /// Look up a field by id
    pub fn field(&self, id: Uuid) -> Option<&Field> {
        self.fields().find(|f| f.id == id)
    }

    /// Every section and field identifier
    pub fn structure_ids(&self) -> Vec<Uuid> {
        self.sections
            .iter()
            .flat_map(|s| std::iter::once(s.id).chain(s.fields.iter().map(|f| f.id)))
            .collect()
    }

    pub fn summary(&self) -> FormSummary {
        FormSummary {
            id: self.id,
            title: self.title.clone(),
            description: self.description.clone(),
            is_active: self.is_active,
            version: self.version,
            created_at: self.created_at,
        }
    }
}

/// Listing entry without nested structure
#[derive(Debug, Clone, PartialEq, Serialize, ToSchema)]
pub struct FormSummary {
    pub id: Uuid,
    pub title: String,
    pub description: Option<String>,
    pub is_active: bool,
    pub version: i32,
    pub created_at: DateTime<Utc>,
}
