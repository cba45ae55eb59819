//! Typed error handling for the invoice service
//!
//! Ports (storage, blob store, email API) return `anyhow::Result`. The
//! services convert those failures into the typed categories below so the
//! HTTP layer can map every failure to a status code and a stable error code.
//!
//! # Error Categories
//!
//! - [`EntityError`]: a referenced row is missing or in the wrong state
//! - [`ValidationError`]: the request body is malformed
//! - [`StorageError`]: database queries and blob uploads/downloads
//! - [`RenderError`]: logo decoding and PDF assembly
//! - [`DeliveryError`]: the transactional email API
//!
//! # Example
//!
//! ```rust,ignore
//! match service.generate(request).await {
//!     Ok(invoice) => println!("stored at {}", invoice.pdf_url),
//!     Err(InvoiceError::Entity(EntityError::NotFound { id, .. })) => {
//!         println!("order {} does not exist", id);
//!     }
//!     Err(e) => eprintln!("generation failed: {}", e),
//! }
//! ```

use axum::Json;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde::Serialize;
use thiserror::Error;
use uuid::Uuid;

/// The main error type of the service
#[derive(Debug, Error)]
pub enum InvoiceError {
    /// Missing rows or rows in the wrong workflow state
    #[error(transparent)]
    Entity(#[from] EntityError),

    /// Malformed input
    #[error(transparent)]
    Validation(#[from] ValidationError),

    /// Database or blob storage failures
    #[error(transparent)]
    Storage(#[from] StorageError),

    /// Logo or PDF failures
    #[error(transparent)]
    Render(#[from] RenderError),

    /// Email API failures
    #[error(transparent)]
    Delivery(#[from] DeliveryError),

    /// Should not happen in normal operation
    #[error("Internal error: {0}")]
    Internal(String),
}

/// Error response structure for HTTP responses
#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    /// Error code for programmatic handling
    pub code: String,
    /// Human-readable error message
    pub message: String,
    /// Optional additional details
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<serde_json::Value>,
}

impl InvoiceError {
    /// Get the HTTP status code for this error
    pub fn status_code(&self) -> StatusCode {
        match self {
            InvoiceError::Entity(e) => e.status_code(),
            InvoiceError::Validation(_) => StatusCode::BAD_REQUEST,
            InvoiceError::Storage(_) => StatusCode::INTERNAL_SERVER_ERROR,
            InvoiceError::Render(_) => StatusCode::INTERNAL_SERVER_ERROR,
            InvoiceError::Delivery(_) => StatusCode::BAD_GATEWAY,
            InvoiceError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Get the error code for this error
    pub fn error_code(&self) -> &'static str {
        match self {
            InvoiceError::Entity(e) => e.error_code(),
            InvoiceError::Validation(e) => e.error_code(),
            InvoiceError::Storage(e) => e.error_code(),
            InvoiceError::Render(e) => e.error_code(),
            InvoiceError::Delivery(_) => "EMAIL_DELIVERY_FAILED",
            InvoiceError::Internal(_) => "INTERNAL_ERROR",
        }
    }

    /// Convert to an error response
    pub fn to_response(&self) -> ErrorResponse {
        ErrorResponse {
            code: self.error_code().to_string(),
            message: self.to_string(),
            details: self.details(),
        }
    }

    fn details(&self) -> Option<serde_json::Value> {
        match self {
            InvoiceError::Entity(EntityError::NotFound { entity_type, id }) => {
                Some(serde_json::json!({
                    "entity_type": entity_type,
                    "id": id.to_string()
                }))
            }
            InvoiceError::Validation(ValidationError::FieldErrors(errors)) => {
                Some(serde_json::json!({ "fields": errors }))
            }
            _ => None,
        }
    }
}

impl IntoResponse for InvoiceError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        if status.is_server_error() {
            tracing::error!(code = self.error_code(), error = %self, "request failed");
        }
        let body = Json(self.to_response());
        (status, body).into_response()
    }
}

// =============================================================================
// Entity Errors
// =============================================================================

/// Errors about the rows an operation works on
#[derive(Debug, Error)]
pub enum EntityError {
    /// Row was not found
    #[error("{entity_type} with id '{id}' not found")]
    NotFound { entity_type: String, id: Uuid },

    /// The order has no stored invoice yet
    #[error("order '{order_id}' has no generated invoice")]
    InvoiceNotGenerated { order_id: Uuid },
}

impl EntityError {
    pub fn not_found(entity_type: &str, id: Uuid) -> Self {
        EntityError::NotFound {
            entity_type: entity_type.to_string(),
            id,
        }
    }

    pub fn status_code(&self) -> StatusCode {
        match self {
            EntityError::NotFound { .. } => StatusCode::NOT_FOUND,
            EntityError::InvoiceNotGenerated { .. } => StatusCode::CONFLICT,
        }
    }

    pub fn error_code(&self) -> &'static str {
        match self {
            EntityError::NotFound { .. } => "ENTITY_NOT_FOUND",
            EntityError::InvoiceNotGenerated { .. } => "INVOICE_NOT_GENERATED",
        }
    }
}

// =============================================================================
// Validation Errors
// =============================================================================

/// Detail of a single failed field
#[derive(Debug, Clone, Serialize)]
pub struct FieldErrorDetail {
    pub field: String,
    pub message: String,
}

/// Errors about malformed input
#[derive(Debug, Error)]
pub enum ValidationError {
    /// One field is invalid
    #[error("Validation failed for field '{field}': {message}")]
    FieldError { field: String, message: String },

    /// Several fields are invalid
    #[error("Validation failed for {} field(s)", .0.len())]
    FieldErrors(Vec<FieldErrorDetail>),

    /// The requested invoice language is not supported
    #[error("Unsupported language: {code}")]
    UnsupportedLanguage { code: String },
}

impl ValidationError {
    pub fn field(field: &str, message: impl Into<String>) -> Self {
        ValidationError::FieldError {
            field: field.to_string(),
            message: message.into(),
        }
    }

    pub fn error_code(&self) -> &'static str {
        match self {
            ValidationError::UnsupportedLanguage { .. } => "UNSUPPORTED_LANGUAGE",
            _ => "VALIDATION_ERROR",
        }
    }
}

impl From<validator::ValidationErrors> for ValidationError {
    fn from(errors: validator::ValidationErrors) -> Self {
        let mut details: Vec<FieldErrorDetail> = errors
            .field_errors()
            .into_iter()
            .flat_map(|(field, errs)| {
                errs.iter().map(move |err| FieldErrorDetail {
                    field: field.to_string(),
                    message: err
                        .message
                        .as_ref()
                        .map(|m| m.to_string())
                        .unwrap_or_else(|| err.code.to_string()),
                })
            })
            .collect();
        details.sort_by(|a, b| a.field.cmp(&b.field));
        ValidationError::FieldErrors(details)
    }
}

impl From<validator::ValidationErrors> for InvoiceError {
    fn from(errors: validator::ValidationErrors) -> Self {
        InvoiceError::Validation(errors.into())
    }
}

// =============================================================================
// Storage Errors
// =============================================================================

/// Errors raised by the database and blob storage ports
#[derive(Debug, Error)]
pub enum StorageError {
    /// A query against the database failed
    #[error("Failed to {operation}: {message}")]
    Query { operation: String, message: String },

    /// Uploading an object failed
    #[error("Failed to upload '{key}': {message}")]
    Upload { key: String, message: String },

    /// Downloading an object failed or it is gone
    #[error("Failed to download '{url}': {message}")]
    Download { url: String, message: String },
}

impl StorageError {
    pub fn query(operation: &str, err: anyhow::Error) -> Self {
        StorageError::Query {
            operation: operation.to_string(),
            message: format!("{:#}", err),
        }
    }

    pub fn error_code(&self) -> &'static str {
        match self {
            StorageError::Query { .. } => "STORAGE_QUERY_FAILED",
            StorageError::Upload { .. } => "UPLOAD_FAILED",
            StorageError::Download { .. } => "DOWNLOAD_FAILED",
        }
    }
}

// =============================================================================
// Render Errors
// =============================================================================

/// Errors raised while building the document
#[derive(Debug, Error)]
pub enum RenderError {
    /// Fetching or decoding the shop logo failed
    #[error("Failed to load logo from '{url}': {message}")]
    Logo { url: String, message: String },

    /// The PDF library rejected the document
    #[error("Failed to assemble PDF: {0}")]
    Pdf(String),

    /// The email template could not be rendered
    #[error("Failed to render template: {0}")]
    Template(String),
}

impl RenderError {
    pub fn error_code(&self) -> &'static str {
        match self {
            RenderError::Logo { .. } => "LOGO_FETCH_FAILED",
            RenderError::Pdf(_) => "PDF_GENERATION_FAILED",
            RenderError::Template(_) => "TEMPLATE_RENDER_FAILED",
        }
    }
}

// =============================================================================
// Delivery Errors
// =============================================================================

/// The email API refused or failed the request
#[derive(Debug, Error)]
#[error("Failed to send email to '{recipient}': {message}")]
pub struct DeliveryError {
    pub recipient: String,
    pub message: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_not_found_maps_to_404() {
        let err: InvoiceError = EntityError::not_found("order", Uuid::new_v4()).into();
        assert_eq!(err.status_code(), StatusCode::NOT_FOUND);
        assert_eq!(err.error_code(), "ENTITY_NOT_FOUND");
    }

    #[test]
    fn test_missing_invoice_is_conflict() {
        let err: InvoiceError = EntityError::InvoiceNotGenerated {
            order_id: Uuid::new_v4(),
        }
        .into();
        assert_eq!(err.status_code(), StatusCode::CONFLICT);
    }

    #[test]
    fn test_upload_failure_is_server_error() {
        let err: InvoiceError = StorageError::Upload {
            key: "Rechnung_1001_de.pdf".to_string(),
            message: "bucket missing".to_string(),
        }
        .into();
        assert_eq!(err.status_code(), StatusCode::INTERNAL_SERVER_ERROR);
        assert!(err.to_string().contains("Rechnung_1001_de.pdf"));
    }

    #[test]
    fn test_delivery_failure_is_bad_gateway() {
        let err: InvoiceError = DeliveryError {
            recipient: "kunde@example.com".to_string(),
            message: "rate limited".to_string(),
        }
        .into();
        assert_eq!(err.status_code(), StatusCode::BAD_GATEWAY);
    }

    #[test]
    fn test_response_carries_not_found_details() {
        let id = Uuid::new_v4();
        let err: InvoiceError = EntityError::not_found("shop", id).into();
        let response = err.to_response();
        let details = response.details.unwrap();
        assert_eq!(details["entity_type"], "shop");
        assert_eq!(details["id"], id.to_string());
    }

    #[test]
    fn test_unsupported_language_code() {
        let err: InvoiceError = ValidationError::UnsupportedLanguage {
            code: "xx".to_string(),
        }
        .into();
        assert_eq!(err.status_code(), StatusCode::BAD_REQUEST);
        assert_eq!(err.error_code(), "UNSUPPORTED_LANGUAGE");
    }
}
