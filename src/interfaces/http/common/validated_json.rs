//! JSON body extractor for the auth endpoints
//!
//! A body that cannot be read as the expected JSON is answered with 400 and
//! the same "Invalid request payload" message the reset flow uses. A body
//! that parses but breaks a `validator` rule is answered with 422 naming
//! each offending field.

use axum::extract::rejection::JsonRejection;
use axum::extract::{FromRequest, Request};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::de::DeserializeOwned;
use tracing::debug;
use validator::{Validate, ValidationErrors};

use super::ApiResponse;
use crate::application::PasswordResetError;

/// `Json<T>` that also runs `T::validate()`.
pub struct ValidatedJson<T>(pub T);

#[derive(Debug)]
pub enum BodyRejection {
    Unreadable(JsonRejection),
    Invalid(ValidationErrors),
}

impl BodyRejection {
    pub fn status(&self) -> StatusCode {
        match self {
            Self::Unreadable(_) => StatusCode::BAD_REQUEST,
            Self::Invalid(_) => StatusCode::UNPROCESSABLE_ENTITY,
        }
    }

    /// Client-facing message
    pub fn message(&self) -> String {
        match self {
            Self::Unreadable(_) => PasswordResetError::InvalidPayload.to_string(),
            Self::Invalid(errors) => describe(errors),
        }
    }
}

/// `field: reason` for the first failed rule of every field, sorted by field.
fn describe(errors: &ValidationErrors) -> String {
    let mut fields: Vec<String> = errors
        .field_errors()
        .into_iter()
        .map(|(field, errs)| match errs.first() {
            Some(e) => match &e.message {
                Some(message) => format!("{}: {}", field, message),
                None => format!("{}: failed '{}'", field, e.code),
            },
            None => format!("{}: invalid", field),
        })
        .collect();
    fields.sort();
    fields.join("; ")
}

impl IntoResponse for BodyRejection {
    fn into_response(self) -> Response {
        if let Self::Unreadable(ref rejection) = self {
            debug!(error = %rejection, "Unreadable request body");
        }
        let body = ApiResponse::<()>::error(self.message());
        (self.status(), Json(body)).into_response()
    }
}

impl<S, T> FromRequest<S> for ValidatedJson<T>
where
    T: DeserializeOwned + Validate,
    S: Send + Sync,
{
    type Rejection = BodyRejection;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        let Json(value) = Json::<T>::from_request(req, state)
            .await
            .map_err(BodyRejection::Unreadable)?;
        value.validate().map_err(BodyRejection::Invalid)?;
        Ok(ValidatedJson(value))
    }
}
