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

//! RPC to create a tenant.

use crate::rpc::messages::{CreateRequestMessage, CreateResponseMessage};
use crate::rpc::{AppState, call, codec};
use axum::Json;
use axum::extract::State;
use http::HeaderMap;
use tenancy_core::rest::RestResult;

/// RPC handler.
pub(crate) async fn handler(
    State(state): State<AppState>,
    headers: HeaderMap,
    Json(message): Json<Option<CreateRequestMessage>>,
) -> RestResult<Json<CreateResponseMessage>> {
    call(
        &state.endpoints,
        &state.endpoints.create,
        &headers,
        message,
        codec::decode_create_request,
        codec::encode_create_response,
    )
    .await
}
