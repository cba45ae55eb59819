//! Request extractors

use crate::core::error::{InvoiceError, ValidationError};
use axum::{
    Json,
    extract::{FromRequest, Request, rejection::JsonRejection},
};
use serde::de::DeserializeOwned;

/// JSON request body whose rejections use the service's error format
///
/// Syntax errors, missing fields and a wrong content type all become
/// `400 VALIDATION_ERROR` on the `body` field.
pub struct JsonBody<T>(pub T);

impl<S, T> FromRequest<S> for JsonBody<T>
where
    S: Send + Sync,
    T: DeserializeOwned,
{
    type Rejection = InvoiceError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        match Json::<T>::from_request(req, state).await {
            Ok(Json(value)) => Ok(JsonBody(value)),
            Err(rejection) => Err(body_error(rejection)),
        }
    }
}

fn body_error(rejection: JsonRejection) -> InvoiceError {
    tracing::debug!(status = %rejection.status(), "rejected request body");
    ValidationError::field("body", rejection.body_text()).into()
}
