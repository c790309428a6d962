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

//! Utilities to extract bearer tokens from HTTP requests.

use crate::BearerToken;
use http::header::HeaderMap;
use tenancy_core::rest::{RestError, RestResult, get_unique_header};

/// Gets the bearer token from the `Authorization` header in `headers`, if any.
///
/// Requests without the header are allowed to proceed so that the endpoints can decide whether
/// they need authorization.  A present but malformed header is always an error.
pub fn get_bearer_token(
    headers: &HeaderMap,
    exp_realm: &'static str,
) -> RestResult<Option<BearerToken>> {
    let unauthorized = |message: String| RestError::Unauthorized {
        scheme: "Bearer",
        realm: exp_realm,
        message,
    };

    let authz = match get_unique_header(headers, "Authorization") {
        Ok(Some(value)) => value,
        Ok(None) => return Ok(None),
        Err(e) => return Err(unauthorized(e.to_string())),
    };

    let authz = match authz.to_str() {
        Ok(value) => value,
        Err(e) => return Err(unauthorized(format!("Bad encoding in Authorization header: {}", e))),
    };

    let mut fields = authz.splitn(2, ' ');
    let scheme = match fields.next() {
        Some(s) if !s.is_empty() => s,
        _ => return Err(unauthorized("Bad Authorization header: missing scheme".to_owned())),
    };
    let payload = match fields.next() {
        Some(s) if !s.trim().is_empty() => s.trim(),
        _ => return Err(unauthorized("Bad Authorization header: missing payload".to_owned())),
    };

    if !scheme.eq_ignore_ascii_case("Bearer") {
        return Err(unauthorized("Unsupported scheme".to_owned()));
    }

    Ok(Some(BearerToken::new(payload)))
}
