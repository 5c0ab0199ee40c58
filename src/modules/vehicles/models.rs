use std::borrow::Cow;

use serde::{Deserialize, Serialize};
use time::{format_description::well_known::Rfc3339, OffsetDateTime};
use validator::{Validate, ValidationError};

pub type MakeId = i64;
pub type ModelId = i64;

pub const DEFAULT_PAGE_SIZE: u32 = 10;
pub const MAX_PAGE_SIZE: u32 = 100;

/// Vehicle manufacturer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, sqlx::FromRow)]
#[serde(rename_all = "camelCase")]
pub struct Make {
    pub id: MakeId,
    pub name: String,
    pub abrv: String,
    pub created_at: String,
}

/// Stored model row; `make_id` always references an existing make.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Model {
    pub id: ModelId,
    pub make_id: MakeId,
    pub name: String,
    pub abrv: String,
    pub created_at: String,
}

/// A model with its parent make joined in. Rebuilt on every read, never stored.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ModelWithMake {
    pub id: ModelId,
    pub make_id: MakeId,
    pub name: String,
    pub abrv: String,
    pub created_at: String,
    pub make: Make,
}

impl ModelWithMake {
    pub fn join(model: &Model, make: &Make) -> Self {
        Self {
            id: model.id,
            make_id: model.make_id,
            name: model.name.clone(),
            abrv: model.abrv.clone(),
            created_at: model.created_at.clone(),
            make: make.clone(),
        }
    }
}

/// Payload for creating a make.
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct MakeInput {
    #[validate(custom(function = "validate_make_name"))]
    pub name: String,
    #[validate(custom(function = "validate_abrv"))]
    pub abrv: String,
}

impl MakeInput {
    pub fn new(name: impl Into<String>, abrv: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            abrv: abrv.into(),
        }
    }

    /// Copy with surrounding whitespace removed, as stored.
    pub fn trimmed(&self) -> Self {
        Self::new(self.name.trim(), self.abrv.trim())
    }
}

/// The three mutable model fields; used for both create and full-replace update.
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct ModelInput {
    #[validate(range(min = 1, message = "Please select a valid make"))]
    pub make_id: MakeId,
    #[validate(custom(function = "validate_model_name"))]
    pub name: String,
    #[validate(custom(function = "validate_abrv"))]
    pub abrv: String,
}

impl ModelInput {
    pub fn new(make_id: MakeId, name: impl Into<String>, abrv: impl Into<String>) -> Self {
        Self {
            make_id,
            name: name.into(),
            abrv: abrv.into(),
        }
    }

    pub fn trimmed(&self) -> Self {
        Self::new(self.make_id, self.name.trim(), self.abrv.trim())
    }
}

fn trimmed_length(
    value: &str,
    min: usize,
    max: usize,
    message: &'static str,
) -> Result<(), ValidationError> {
    let length = value.trim().chars().count();
    if length < min || length > max {
        return Err(ValidationError::new("length").with_message(Cow::Borrowed(message)));
    }
    Ok(())
}

fn validate_model_name(value: &str) -> Result<(), ValidationError> {
    trimmed_length(value, 2, 50, "Model name must be between 2 and 50 characters")
}

fn validate_make_name(value: &str) -> Result<(), ValidationError> {
    trimmed_length(value, 1, 100, "Make name must be between 1 and 100 characters")
}

fn validate_abrv(value: &str) -> Result<(), ValidationError> {
    trimmed_length(value, 1, 10, "Abbreviation must be between 1 and 10 characters")
}

/// Column a model list can be ordered by.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum SortField {
    #[serde(rename = "id")]
    Id,
    #[default]
    #[serde(rename = "name")]
    Name,
    #[serde(rename = "abrv")]
    Abrv,
    /// The joined parent's name, not the model's own.
    #[serde(rename = "make.name")]
    MakeName,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SortDirection {
    #[default]
    Asc,
    Desc,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct SortSpec {
    pub field: SortField,
    pub direction: SortDirection,
}

impl SortSpec {
    pub const fn new(field: SortField, direction: SortDirection) -> Self {
        Self { field, direction }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FilterSpec {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub search: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub make_id: Option<MakeId>,
}

/// Request for one page of models.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Validate)]
pub struct ListParams {
    /// 1-based.
    #[validate(range(min = 1, message = "page must be at least 1"))]
    pub page: u32,
    #[validate(range(min = 1, max = 100, message = "limit must be between 1 and 100"))]
    pub limit: u32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sort: Option<SortSpec>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub filter: Option<FilterSpec>,
}

impl ListParams {
    pub fn new(page: u32, limit: u32) -> Self {
        Self {
            page,
            limit,
            sort: None,
            filter: None,
        }
    }

    pub fn sorted(mut self, field: SortField, direction: SortDirection) -> Self {
        self.sort = Some(SortSpec::new(field, direction));
        self
    }

    pub fn searching(mut self, search: impl Into<String>) -> Self {
        self.filter.get_or_insert_with(FilterSpec::default).search = Some(search.into());
        self
    }

    pub fn for_make(mut self, make_id: MakeId) -> Self {
        self.filter.get_or_insert_with(FilterSpec::default).make_id = Some(make_id);
        self
    }
}

impl Default for ListParams {
    fn default() -> Self {
        Self::new(1, DEFAULT_PAGE_SIZE)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PaginatedResponse<T> {
    pub data: Vec<T>,
    pub total: u64,
    pub page: u32,
    pub limit: u32,
    pub total_pages: u32,
}

/// Uniform error shape handed to callers of the catalog.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ApiError {
    pub message: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub code: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeleteOutcome {
    pub success: bool,
}

pub(crate) fn timestamp_now() -> String {
    OffsetDateTime::now_utc()
        .format(&Rfc3339)
        .unwrap_or_default()
}
