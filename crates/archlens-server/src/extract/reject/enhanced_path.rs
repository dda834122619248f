//! Path parameter extractor with descriptive rejections.

use axum::extract::rejection::PathRejection;
use axum::extract::{FromRequestParts, Path as AxumPath};
use axum::http::request::Parts;
use derive_more::{Deref, DerefMut, From};
use serde::de::DeserializeOwned;

use super::sanitize_error_message;
use crate::handler::{Error, ErrorKind};

/// Drop-in replacement for [`axum::extract::Path`] rejecting with an
/// [`Error`] body.
#[must_use]
#[derive(Debug, Clone, Copy, Default, Deref, DerefMut, From)]
pub struct Path<T>(pub T);

impl<T> Path<T> {
    /// Creates a new instance of [`Path`].
    #[inline]
    pub fn new(inner: T) -> Self {
        Self(inner)
    }

    /// Returns the inner path parameters.
    #[inline]
    pub fn into_inner(self) -> T {
        self.0
    }
}

impl<T, S> FromRequestParts<S> for Path<T>
where
    T: DeserializeOwned + Send + 'static,
    S: Send + Sync,
{
    type Rejection = Error<'static>;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let extractor =
            <AxumPath<T> as FromRequestParts<S>>::from_request_parts(parts, state).await;
        extractor.map(|x| Self(x.0)).map_err(Into::into)
    }
}

impl From<PathRejection> for Error<'static> {
    fn from(rejection: PathRejection) -> Self {
        match rejection {
            PathRejection::FailedToDeserializePathParams(err) => {
                let message = err.body_text();
                ErrorKind::BadRequest
                    .with_message("Invalid path parameter format")
                    .with_context(format!(
                        "Path parameter deserialization failed: {}. {}",
                        sanitize_error_message(&message, 2, 150),
                        parameter_hint(&message)
                    ))
            }
            PathRejection::MissingPathParams(err) => ErrorKind::MissingPathParam
                .with_message("Required path parameter missing")
                .with_context(sanitize_error_message(&err.body_text(), 2, 150)),
            _ => ErrorKind::InternalServerError
                .with_message("Path processing failed")
                .with_context("Unexpected error during path parameter processing"),
        }
    }
}

/// Points at the expected format of the parameter that failed.
fn parameter_hint(message: &str) -> &'static str {
    let lower = message.to_lowercase();

    if lower.contains("uuid") || lower.contains("invalid character") {
        "Analysis ids are UUIDs: xxxxxxxx-xxxx-xxxx-xxxx-xxxxxxxxxxxx"
    } else if lower.contains("invalid digit") || lower.contains("cannot parse") {
        "Numeric parameters must contain only digits"
    } else {
        "Check that the parameter format matches the expected type"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn hints_follow_the_failing_type() {
        assert!(parameter_hint("UUID parsing failed: invalid character").contains("UUIDs"));
        assert!(parameter_hint("invalid digit found in string").contains("digits"));
        assert!(parameter_hint("something else").contains("expected type"));
    }
}
