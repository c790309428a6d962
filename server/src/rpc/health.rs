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

//! Liveness and readiness checks.

use crate::rpc::Status;
use axum::extract::State;
use std::sync::Arc;
use tenancy_core::rest::{EmptyBody, RestError, RestResult};

/// Handler for the liveness check.
pub(crate) async fn live_handler(
    State(status): State<Arc<Status>>,
    _: EmptyBody,
) -> RestResult<&'static str> {
    if status.is_live() {
        Ok("OK")
    } else {
        Err(RestError::ServiceUnavailable("Server is not running".to_owned()))
    }
}

/// Handler for the readiness check.
pub(crate) async fn ready_handler(
    State(status): State<Arc<Status>>,
    _: EmptyBody,
) -> RestResult<&'static str> {
    if status.is_ready() {
        Ok("OK")
    } else {
        Err(RestError::ServiceUnavailable("Server is not ready to take requests".to_owned()))
    }
}
