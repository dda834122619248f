//! JSON extractor running `validator` rules after deserialization.

use std::borrow::Cow;
use std::collections::HashMap;

use axum::extract::{FromRequest, Request};
use derive_more::{Deref, DerefMut, From};
use serde::de::DeserializeOwned;
use validator::{Validate, ValidationError, ValidationErrors};

use super::Json;
use crate::handler::{Error, ErrorKind};

/// Deserializes like [`Json`], then rejects values failing [`Validate`].
#[must_use]
#[derive(Debug, Clone, Copy, Default, Deref, DerefMut, From)]
pub struct ValidateJson<T>(pub T);

impl<T> ValidateJson<T> {
    /// Creates a new instance of [`ValidateJson`].
    #[inline]
    pub fn new(inner: T) -> Self {
        Self(inner)
    }

    /// Returns the inner validated value.
    #[inline]
    pub fn into_inner(self) -> T {
        self.0
    }
}

impl<T, S> FromRequest<S> for ValidateJson<T>
where
    T: DeserializeOwned + Validate + 'static,
    S: Send + Sync,
{
    type Rejection = Error<'static>;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        let Json(data) = <Json<T> as FromRequest<S>>::from_request(req, state).await?;
        data.validate()?;
        Ok(Self::new(data))
    }
}

fn bound(params: &HashMap<Cow<'static, str>, serde_json::Value>, key: &str) -> Option<u64> {
    params.get(key).and_then(serde_json::Value::as_u64)
}

fn format_length_error(
    field: &str,
    params: &HashMap<Cow<'static, str>, serde_json::Value>,
) -> String {
    match (bound(params, "min"), bound(params, "max")) {
        (Some(min), Some(max)) => {
            format!("Field '{field}' must be between {min} and {max} characters long")
        }
        (Some(min), None) => format!("Field '{field}' must be at least {min} characters long"),
        (None, Some(max)) => format!("Field '{field}' must be at most {max} characters long"),
        (None, None) => format!("Field '{field}' has invalid length"),
    }
}

/// Formats one failure, preferring the message attached to the rule.
fn format_validation_error(field: &str, error: &ValidationError) -> String {
    if let Some(message) = &error.message {
        return format!("Field '{field}': {message}");
    }

    match error.code.as_ref() {
        "length" => format_length_error(field, &error.params),
        "required" => format!("Field '{field}' is required and cannot be empty"),
        code => format!("Field '{field}' failed validation: {code}"),
    }
}

impl From<ValidationErrors> for Error<'static> {
    fn from(errors: ValidationErrors) -> Self {
        let mut messages: Vec<String> = errors
            .field_errors()
            .iter()
            .flat_map(|(field, field_errors)| {
                field_errors
                    .iter()
                    .map(move |error| format_validation_error(field, error))
            })
            .collect();
        messages.sort();

        let message = match messages.as_slice() {
            [] => "Validation failed".to_owned(),
            [single] => single.clone(),
            multiple => multiple.join(". "),
        };

        tracing::warn!(
            errors = ?errors.field_errors(),
            "Request validation failed"
        );

        ErrorKind::BadRequest
            .with_message(message)
            .with_resource("request")
    }
}

#[cfg(test)]
mod tests {
    use serde::Deserialize;

    use super::*;

    #[derive(Debug, Deserialize, Validate)]
    struct Named {
        #[validate(length(min = 1, max = 5))]
        name: String,
    }

    #[test]
    fn length_failures_are_described() {
        let errors = Named { name: String::new() }.validate().unwrap_err();
        let error: Error = errors.into();

        assert_eq!(error.kind(), ErrorKind::BadRequest);
        assert_eq!(
            error.message(),
            Some("Field 'name' must be between 1 and 5 characters long")
        );
        assert_eq!(error.resource(), Some("request"));
    }
}
