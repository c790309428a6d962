// III-IV
// Copyright 2023 Julio Merino
//
// Licensed under the Apache License, Version 2.0 (the "License"); you may not
// use this file except in compliance with the License.  You may obtain a copy
// of the License at:
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS, WITHOUT
// WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.  See the
// License for the specific language governing permissions and limitations
// under the License.

//! Building blocks for the HTTP transport of the services.

use async_trait::async_trait;
use axum::Json;
use axum::body::HttpBody;
use axum::extract::{FromRequest, Request};
use axum::http::header::AsHeaderName;
use axum::http::{HeaderMap, HeaderValue, StatusCode, header};
use axum::response::{IntoResponse, Response};
use serde::{Deserialize, Serialize};

/// Failures of requests that never made it to the service.
#[derive(Debug, PartialEq, thiserror::Error)]
pub enum RestError {
    /// The request is malformed at the HTTP level.
    #[error("{0}")]
    InvalidRequest(String),

    /// The request carried a payload where none was expected.
    #[error("Content should be empty")]
    PayloadNotEmpty,

    /// The server is not in a state to take requests.
    #[error("{0}")]
    ServiceUnavailable(String),

    /// The caller did not present acceptable credentials.
    #[error("Unauthorized: {message}")]
    Unauthorized {
        /// Authorization scheme the caller must use.
        scheme: &'static str,

        /// Protection space the credentials apply to.
        realm: &'static str,

        /// Why the credentials were rejected.
        message: String,
    },
}

impl RestError {
    /// Returns the HTTP status that represents this error.
    pub fn status(&self) -> StatusCode {
        match self {
            RestError::InvalidRequest(_) => StatusCode::BAD_REQUEST,
            RestError::PayloadNotEmpty => StatusCode::PAYLOAD_TOO_LARGE,
            RestError::ServiceUnavailable(_) => StatusCode::SERVICE_UNAVAILABLE,
            RestError::Unauthorized { .. } => StatusCode::UNAUTHORIZED,
        }
    }

    /// Returns the `WWW-Authenticate` challenge to attach to the response, if any.
    fn challenge(&self) -> Option<HeaderValue> {
        match self {
            RestError::Unauthorized { scheme, realm, .. } => {
                HeaderValue::from_str(&format!("{} realm=\"{}\"", scheme, realm)).ok()
            }
            _ => None,
        }
    }
}

impl IntoResponse for RestError {
    fn into_response(self) -> Response {
        let mut headers = HeaderMap::new();
        if let Some(challenge) = self.challenge() {
            headers.insert(header::WWW_AUTHENTICATE, challenge);
        }
        let status = self.status();
        let body = ErrorResponse { message: self.to_string() };
        (status, headers, Json(body)).into_response()
    }
}

/// Result type for this module.
pub type RestResult<T> = Result<T, RestError>;

/// Body of all responses for failed requests.
#[derive(Debug, Deserialize, Serialize)]
pub struct ErrorResponse {
    /// Description of the failure.
    pub message: String,
}

/// Extractor that rejects requests with a payload.
pub struct EmptyBody {}

#[async_trait]
impl<S> FromRequest<S> for EmptyBody
where
    S: Send + Sync,
{
    type Rejection = RestError;

    async fn from_request(req: Request, _state: &S) -> Result<Self, Self::Rejection> {
        if req.into_body().is_end_stream() {
            Ok(EmptyBody {})
        } else {
            Err(RestError::PayloadNotEmpty)
        }
    }
}

/// Gets the only value of the header `name` in `headers`, if present.
///
/// Repeated headers are rejected as invalid requests.
pub fn get_unique_header<K: AsHeaderName + Copy>(
    headers: &HeaderMap,
    name: K,
) -> RestResult<Option<&HeaderValue>> {
    let mut values = headers.get_all(name).iter();
    match (values.next(), values.next()) {
        (value, None) => Ok(value),
        (_, Some(_)) => Err(RestError::InvalidRequest(format!(
            "Header {} cannot have more than one value",
            name.as_str()
        ))),
    }
}

/// Harness to send requests to a router in-process and to check their responses.
#[cfg(feature = "testutils")]
pub mod testutils {
    use super::*;
    use axum::Router;
    use axum::body::{Body, Bytes};
    use axum::http::{HeaderName, Method};
    use serde::de::DeserializeOwned;
    use std::fmt;
    use tower::util::ServiceExt;

    /// Largest response body that the checker is willing to read.
    const MAX_BODY_SIZE: usize = 64 * 1024;

    /// A single request to send to a router.
    #[must_use]
    pub struct OneShotBuilder {
        /// Router that will handle the request.
        app: Router,

        /// Method of the request.
        method: Method,

        /// Target of the request.
        uri: String,

        /// Headers of the request.
        headers: HeaderMap,
    }

    impl OneShotBuilder {
        /// Prepares a request to `uri` with `method` that `app` will handle.
        pub fn new<U: AsRef<str>>(app: Router, (method, uri): (Method, U)) -> Self {
            Self { app, method, uri: uri.as_ref().to_owned(), headers: HeaderMap::new() }
        }

        /// Presents `token` as a bearer credential.
        pub fn with_bearer_auth<T: fmt::Display>(self, token: T) -> Self {
            self.with_header(header::AUTHORIZATION, format!("Bearer {}", token))
        }

        /// Appends the header `name` with `value`.
        ///
        /// Panics if either the name or the value are not valid.
        pub fn with_header<K, V>(mut self, name: K, value: V) -> Self
        where
            K: TryInto<HeaderName>,
            K::Error: fmt::Debug,
            V: TryInto<HeaderValue>,
            V::Error: fmt::Debug,
        {
            self.headers.append(name.try_into().unwrap(), value.try_into().unwrap());
            self
        }

        /// Sends the request with `body` labeled as `content_type`, if any.
        async fn send(mut self, content_type: Option<mime::Mime>, body: Body) -> ResponseChecker {
            if let Some(content_type) = content_type {
                let value = HeaderValue::from_str(content_type.as_ref()).unwrap();
                self.headers.insert(header::CONTENT_TYPE, value);
            }
            let mut request = Request::new(body);
            *request.method_mut() = self.method;
            *request.uri_mut() = self.uri.parse().unwrap();
            *request.headers_mut() = self.headers;
            let response = self.app.oneshot(request).await.unwrap();
            ResponseChecker { response, exp_status: StatusCode::OK }
        }

        /// Sends the request without a payload.
        pub async fn send_empty(self) -> ResponseChecker {
            self.send(None, Body::empty()).await
        }

        /// Sends the request with a plain text payload.
        pub async fn send_text<T: Into<String>>(self, text: T) -> ResponseChecker {
            self.send(Some(mime::TEXT_PLAIN), Body::from(text.into())).await
        }

        /// Sends the request with `request` serialized as a JSON payload.
        pub async fn send_json<T: Serialize>(self, request: T) -> ResponseChecker {
            let body = serde_json::to_vec(&request).unwrap();
            self.send(Some(mime::APPLICATION_JSON), Body::from(body)).await
        }
    }

    /// Expectations on the response to a request sent by a `OneShotBuilder`.
    #[must_use]
    pub struct ResponseChecker {
        /// The response returned by the router.
        response: Response,

        /// The status the response must have.
        exp_status: StatusCode,
    }

    impl ResponseChecker {
        /// Expects the response to have `status` instead of 200.
        pub fn expect_status(mut self, status: StatusCode) -> Self {
            self.exp_status = status;
            self
        }

        /// Checks the status and consumes the response to get its body.
        async fn into_body(self) -> Bytes {
            assert_eq!(self.exp_status, self.response.status());
            axum::body::to_bytes(self.response.into_body(), MAX_BODY_SIZE).await.unwrap()
        }

        /// Expects the body to be an `ErrorResponse` with a message that matches `exp_re`.
        pub async fn expect_error(self, exp_re: &str) {
            let body = self.into_body().await;
            let response = serde_json::from_slice::<ErrorResponse>(&body).unwrap_or_else(|e| {
                panic!("Invalid error response ({}): {}", e, String::from_utf8_lossy(&body))
            });
            let re = regex::Regex::new(exp_re).unwrap();
            assert!(
                re.is_match(&response.message),
                "Error '{}' does not match '{}'",
                response.message,
                exp_re
            );
        }

        /// Expects the body to be a JSON representation of `T` and returns it.
        pub async fn expect_json<T: DeserializeOwned>(self) -> T {
            let body = self.into_body().await;
            serde_json::from_slice::<T>(&body).unwrap_or_else(|e| {
                panic!("Invalid JSON response ({}): {}", e, String::from_utf8_lossy(&body))
            })
        }

        /// Expects the body to be text that matches `exp_re`.
        pub async fn expect_text(self, exp_re: &str) {
            assert!(!exp_re.is_empty(), "Empty expressions match any body");
            let body = self.into_body().await;
            let body = String::from_utf8(body.to_vec()).unwrap();
            assert!(
                !body.contains("\"message\":"),
                "Use expect_error to validate errors wrapped in an ErrorResponse"
            );
            let re = regex::Regex::new(exp_re).unwrap();
            assert!(re.is_match(&body), "Body '{}' does not match '{}'", body, exp_re);
        }

        /// Checks the status and returns the response for checks not covered by this type.
        pub async fn take_response(self) -> Response {
            assert_eq!(self.exp_status, self.response.status());
            self.response
        }
    }

    /// Generates a test that sends non-JSON payloads to an API that expects JSON.
    #[macro_export]
    macro_rules! test_payload_must_be_json {
        ( $app:expr, $route:expr ) => {
            #[tokio::test]
            async fn test_payload_must_be_json() {
                // Rejections from the JSON extractor are plain text, not an ErrorResponse.
                $crate::rest::testutils::OneShotBuilder::new($app, $route)
                    .send_text("this is not json")
                    .await
                    .expect_status(axum::http::StatusCode::UNSUPPORTED_MEDIA_TYPE)
                    .expect_text("Content-Type")
                    .await;

                $crate::rest::testutils::OneShotBuilder::new($app, $route)
                    .with_header(axum::http::header::CONTENT_TYPE, "application/json")
                    .send_text("this is not json")
                    .await
                    .expect_status(axum::http::StatusCode::BAD_REQUEST)
                    .expect_text("expected ident")
                    .await;
            }
        };
    }

    pub use test_payload_must_be_json;

    /// Generates a test that sends a payload to an API that expects none.
    #[macro_export]
    macro_rules! test_payload_must_be_empty {
        ( $app:expr, $route:expr ) => {
            #[tokio::test]
            async fn test_payload_must_be_empty() {
                $crate::rest::testutils::OneShotBuilder::new($app, $route)
                    .send_text("should not be here")
                    .await
                    .expect_status(axum::http::StatusCode::PAYLOAD_TOO_LARGE)
                    .expect_error("should be empty")
                    .await;
            }
        };
    }

    pub use test_payload_must_be_empty;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_get_unique_header_missing() {
        let mut headers = HeaderMap::new();
        headers.append("ignore-me", "ignored".parse().unwrap());
        assert!(get_unique_header(&headers, "x-deadline").unwrap().is_none());
    }

    #[test]
    fn test_get_unique_header_one() {
        let mut headers = HeaderMap::new();
        headers.append("ignore-me", "ignored".parse().unwrap());
        headers.append("x-deadline", "100".parse().unwrap());
        assert_eq!(b"100", get_unique_header(&headers, "x-deadline").unwrap().unwrap().as_bytes());
    }

    #[test]
    fn test_get_unique_header_repeated() {
        let mut headers = HeaderMap::new();
        headers.append("x-deadline", "100".parse().unwrap());
        headers.append("X-Deadline", "200".parse().unwrap());
        assert_eq!(
            RestError::InvalidRequest(
                "Header x-deadline cannot have more than one value".to_owned()
            ),
            get_unique_header(&headers, "x-deadline").unwrap_err()
        );
    }

    #[test]
    fn test_status() {
        assert_eq!(StatusCode::BAD_REQUEST, RestError::InvalidRequest("x".to_owned()).status());
        assert_eq!(StatusCode::PAYLOAD_TOO_LARGE, RestError::PayloadNotEmpty.status());
        assert_eq!(
            StatusCode::SERVICE_UNAVAILABLE,
            RestError::ServiceUnavailable("x".to_owned()).status()
        );
    }

    #[test]
    fn test_unauthorized_into_response() {
        let response = RestError::Unauthorized {
            scheme: "Bearer",
            realm: "tenancy",
            message: "Missing token".to_owned(),
        }
        .into_response();
        assert_eq!(StatusCode::UNAUTHORIZED, response.status());
        assert_eq!(
            "Bearer realm=\"tenancy\"",
            response.headers().get(header::WWW_AUTHENTICATE).unwrap()
        );
    }

    #[test]
    fn test_other_errors_have_no_challenge() {
        let response = RestError::ServiceUnavailable("Not ready".to_owned()).into_response();
        assert_eq!(StatusCode::SERVICE_UNAVAILABLE, response.status());
        assert!(response.headers().get(header::WWW_AUTHENTICATE).is_none());
    }
}
