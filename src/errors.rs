// errors.rs
use thiserror::Error;

/// Errors originating from either the pipeline logic
/// (validation, missing leads, etc.) or downstream layers (DB, CSV, XLSX).
#[derive(Debug, Error)]
pub enum ServerError {
    #[error("Not Found")]
    NotFound,

    #[error("Lead not found: {0}")]
    LeadNotFound(String),

    #[error("Validation failed: {0}")]
    Validation(String),

    #[error("Conflict: {0}")]
    Conflict(String),

    #[error("Bad Request: {0}")]
    BadRequest(String),

    #[error("Payload too large: {size} bytes exceeds limit of {limit}")]
    PayloadTooLarge { size: usize, limit: usize },

    #[error("Database Error: {0}")]
    DbError(String),

    #[error("CSV Error: {0}")]
    CsvError(String),

    #[error("Spreadsheet Error: {0}")]
    XlsxError(String),

    #[error("Insight service error: {0}")]
    InsightError(String),

    #[error("Internal Server Error")]
    InternalError,
}

impl ServerError {
    /// HTTP status used when this error reaches the router.
    pub fn status(&self) -> u16 {
        match self {
            ServerError::NotFound | ServerError::LeadNotFound(_) => 404,
            ServerError::Validation(_) | ServerError::BadRequest(_) => 400,
            ServerError::Conflict(_) => 409,
            ServerError::PayloadTooLarge { .. } => 413,
            ServerError::InsightError(_) => 502,
            ServerError::DbError(_)
            | ServerError::CsvError(_)
            | ServerError::XlsxError(_)
            | ServerError::InternalError => 500,
        }
    }
}

impl From<rusqlite::Error> for ServerError {
    fn from(e: rusqlite::Error) -> Self {
        ServerError::DbError(e.to_string())
    }
}

impl From<csv::Error> for ServerError {
    fn from(e: csv::Error) -> Self {
        ServerError::CsvError(e.to_string())
    }
}

impl From<rust_xlsxwriter::XlsxError> for ServerError {
    fn from(e: rust_xlsxwriter::XlsxError) -> Self {
        ServerError::XlsxError(e.to_string())
    }
}

impl From<serde_json::Error> for ServerError {
    fn from(e: serde_json::Error) -> Self {
        ServerError::BadRequest(format!("invalid JSON: {e}"))
    }
}
