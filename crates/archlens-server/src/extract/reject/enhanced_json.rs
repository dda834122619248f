//! JSON extractor with descriptive rejections.

use axum::extract::rejection::JsonRejection;
use axum::extract::{FromRequest, Json as AxumJson, Request};
use axum::response::{IntoResponse, Response};
use derive_more::{Deref, DerefMut, From};
use serde::Serialize;
use serde::de::DeserializeOwned;

use super::sanitize_error_message;
use crate::handler::{Error, ErrorKind};

/// Drop-in replacement for [`axum::Json`] rejecting with an [`Error`] body.
///
/// Also serializes response bodies, so handlers use one type both ways.
#[must_use]
#[derive(Debug, Clone, Copy, Default, Deref, DerefMut, From)]
pub struct Json<T>(pub T);

impl<T> Json<T> {
    /// Creates a new [`Json`] wrapper around the provided value.
    #[inline]
    pub fn new(inner: T) -> Self {
        Self(inner)
    }

    /// Returns the inner value.
    #[inline]
    pub fn into_inner(self) -> T {
        self.0
    }
}

impl<T, S> FromRequest<S> for Json<T>
where
    T: DeserializeOwned + 'static,
    S: Send + Sync,
{
    type Rejection = Error<'static>;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        let extractor = <AxumJson<T> as FromRequest<S>>::from_request(req, state).await;
        extractor.map(|x| Self::new(x.0)).map_err(Into::into)
    }
}

impl<T> IntoResponse for Json<T>
where
    T: Serialize,
{
    #[inline]
    fn into_response(self) -> Response {
        AxumJson(self.0).into_response()
    }
}

impl From<JsonRejection> for Error<'static> {
    fn from(rejection: JsonRejection) -> Self {
        match rejection {
            JsonRejection::JsonDataError(err) => ErrorKind::BadRequest
                .with_message("Invalid request data format")
                .with_context(format!(
                    "JSON deserialization failed: {}",
                    sanitize_error_message(&err.body_text(), 3, 200)
                )),
            JsonRejection::JsonSyntaxError(err) => ErrorKind::BadRequest
                .with_message("Invalid JSON syntax in request body")
                .with_context(format!(
                    "JSON parsing failed: {}",
                    sanitize_error_message(&err.body_text(), 3, 200)
                )),
            JsonRejection::MissingJsonContentType(_) => ErrorKind::BadRequest
                .with_message("Invalid content type")
                .with_context("Request must have Content-Type header set to 'application/json'"),
            JsonRejection::BytesRejection(err) => ErrorKind::BadRequest
                .with_message("Failed to read request body")
                .with_context(sanitize_error_message(&err.body_text(), 3, 200)),
            other => ErrorKind::InternalServerError
                .with_message("Request processing failed")
                .with_context(format!("Unexpected JSON rejection: {other}")),
        }
    }
}

#[cfg(test)]
mod tests {
    use axum::Router;
    use axum::routing::post;
    use axum_test::TestServer;
    use serde::Deserialize;
    use serde_json::json;

    use super::*;

    #[derive(Debug, Deserialize, Serialize)]
    struct Payload {
        owner: String,
    }

    async fn echo(Json(payload): Json<Payload>) -> Json<Payload> {
        Json(payload)
    }

    fn server() -> TestServer {
        TestServer::new(Router::new().route("/", post(echo))).unwrap()
    }

    #[tokio::test]
    async fn accepts_well_formed_bodies() {
        let response = server().post("/").json(&json!({ "owner": "acme" })).await;
        response.assert_status_ok();
        response.assert_json(&json!({ "owner": "acme" }));
    }

    #[tokio::test]
    async fn rejects_missing_fields_as_bad_request() {
        let response = server().post("/").json(&json!({ "name": "widgets" })).await;
        response.assert_status_bad_request();

        let body = response.json::<serde_json::Value>();
        assert_eq!(body["name"], "bad_request");
        assert!(body["message"].as_str().unwrap().contains("Invalid request data format"));
    }

    #[tokio::test]
    async fn rejects_missing_content_type() {
        let response = server().post("/").text(r#"{"owner":"acme"}"#).await;
        response.assert_status_bad_request();
    }
}
