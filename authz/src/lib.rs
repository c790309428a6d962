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

//! Bearer token authorization for the endpoints of a service.
//!
//! Requests carry a bearer token that is verified against a set of signing keys.  Once verified,
//! the claims the services care about are attached to the request context as a `ParsedToken`.

// Keep these in sync with other top-level files.
#![warn(anonymous_parameters, bad_style, clippy::missing_docs_in_private_items, missing_docs)]
#![warn(unused, unused_extern_crates, unused_import_braces, unused_qualifications)]
#![warn(unsafe_code)]

use async_trait::async_trait;

mod httputils;
pub use httputils::get_bearer_token;
mod jwks;
pub use jwks::{JwksVerifier, JwksVerifierOptions};
mod middleware;
pub use middleware::authorize;
#[cfg(any(test, feature = "testutils"))]
mod mock;
#[cfg(any(test, feature = "testutils"))]
pub use mock::MockTokenVerifier;

/// Authorization errors.
#[derive(Debug, PartialEq, thiserror::Error)]
pub enum AuthzError {
    /// The signing keys could not be obtained.
    #[error("Cannot fetch signing keys: {0}")]
    KeysUnavailable(String),

    /// The request context did not carry a bearer token.
    #[error("Missing bearer token")]
    MissingToken,

    /// The bearer token failed verification.
    #[error("Invalid token: {0}")]
    InvalidToken(String),
}

/// Result type for this crate.
pub type AuthzResult<T> = Result<T, AuthzError>;

/// Raw bearer token as extracted from the transport, before verification.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct BearerToken(String);

impl BearerToken {
    /// Creates a new bearer token from its raw representation.
    pub fn new<S: Into<String>>(token: S) -> Self {
        Self(token.into())
    }

    /// Returns the raw token.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

/// Claims extracted from a verified token.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct ParsedToken {
    /// Email address of the caller.
    pub email: String,
}

/// Capability to verify bearer tokens.
#[async_trait]
pub trait TokenVerifier {
    /// Checks the signature of `token` and extracts its claims.
    async fn verify(&self, token: &str) -> AuthzResult<ParsedToken>;
}
