use motorpool_http::error::AppError;
use thiserror::Error;
use validator::ValidationErrors;

use super::models::ApiError;

/// Failures surfaced by the vehicle catalog.
#[derive(Debug, Clone, Error)]
pub enum CatalogError {
    /// Bad or missing field, or a make id that does not resolve.
    #[error("{message}")]
    Validation {
        message: String,
        details: Vec<serde_json::Value>,
    },

    #[error("{entity} {id} not found")]
    NotFound { entity: &'static str, id: i64 },

    /// The backing store failed; its message is passed through untouched.
    #[error("{message}")]
    Store { message: String },
}

pub type CatalogResult<T> = Result<T, CatalogError>;

impl CatalogError {
    pub fn validation(message: impl Into<String>) -> Self {
        Self::Validation {
            message: message.into(),
            details: Vec::new(),
        }
    }

    pub fn unknown_make(make_id: i64) -> Self {
        Self::Validation {
            message: format!("make {make_id} does not exist"),
            details: vec![serde_json::json!({ "field": "makeId", "error": "unknown_make" })],
        }
    }

    pub fn not_found(entity: &'static str, id: i64) -> Self {
        Self::NotFound { entity, id }
    }

    pub fn store(message: impl Into<String>) -> Self {
        Self::Store {
            message: message.into(),
        }
    }

    pub fn code(&self) -> &'static str {
        match self {
            CatalogError::Validation { .. } => "validation_error",
            CatalogError::NotFound { .. } => "not_found",
            CatalogError::Store { .. } => "store_error",
        }
    }
}

impl From<ValidationErrors> for CatalogError {
    fn from(errors: ValidationErrors) -> Self {
        let mut details: Vec<serde_json::Value> = errors
            .field_errors()
            .into_iter()
            .flat_map(|(field, field_errors)| {
                field_errors.iter().map(move |error| {
                    serde_json::json!({
                        "field": wire_field(&field),
                        "error": error.code,
                        "message": error.message,
                    })
                })
            })
            .collect();
        details.sort_by(|a, b| a["field"].as_str().cmp(&b["field"].as_str()));

        let message = details
            .iter()
            .filter_map(|detail| detail["message"].as_str())
            .collect::<Vec<_>>()
            .join("; ");

        Self::Validation {
            message: if message.is_empty() {
                "invalid input".to_string()
            } else {
                message
            },
            details,
        }
    }
}

/// Struct field name as it appears in camelCase JSON payloads.
fn wire_field(field: &str) -> String {
    let mut name = String::with_capacity(field.len());
    let mut upper = false;
    for ch in field.chars() {
        if ch == '_' {
            upper = !name.is_empty();
        } else if upper {
            name.extend(ch.to_uppercase());
            upper = false;
        } else {
            name.push(ch);
        }
    }
    name
}

impl From<sqlx::Error> for CatalogError {
    fn from(err: sqlx::Error) -> Self {
        Self::store(err.to_string())
    }
}

impl From<&CatalogError> for ApiError {
    fn from(err: &CatalogError) -> Self {
        ApiError {
            message: err.to_string(),
            code: Some(err.code().to_string()),
        }
    }
}

impl From<CatalogError> for AppError {
    fn from(err: CatalogError) -> Self {
        match err {
            CatalogError::Validation { message, details } => AppError::validation(details, message),
            not_found @ CatalogError::NotFound { .. } => AppError::not_found(not_found.to_string()),
            CatalogError::Store { message } => AppError::store(message),
        }
    }
}
