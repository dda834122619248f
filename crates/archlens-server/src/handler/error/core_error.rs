//! Mapping of capability errors onto HTTP errors.
//!
//! Only failures while answering a request pass through here. Failures of
//! a running job become its terminal status instead.

use archlens_core::ErrorKind as CoreErrorKind;

use super::http_error::{Error as HttpError, ErrorKind};

impl From<archlens_core::Error> for HttpError<'static> {
    fn from(error: archlens_core::Error) -> Self {
        let message = error.message_or_kind().to_owned();

        match error.kind {
            CoreErrorKind::InvalidInput => ErrorKind::BadRequest.with_message(message),
            CoreErrorKind::NotFound => ErrorKind::NotFound.with_message(message),
            CoreErrorKind::ServiceUnavailable | CoreErrorKind::NetworkError => {
                ErrorKind::ServiceUnavailable
                    .with_message("Backing store unavailable")
                    .with_context(message)
            }
            CoreErrorKind::Timeout => ErrorKind::GatewayTimeout
                .with_message("Backing store timed out")
                .with_context(message),
            _ => ErrorKind::InternalServerError.with_context(message),
        }
    }
}
