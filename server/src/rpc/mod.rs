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

//! RPC transport of the service over HTTP.
//!
//! Every method of the service is exposed as a `POST` to `/tenancy.v1.TenantService/<Method>`
//! with JSON request and response bodies.  Business failures are reported inside the response
//! bodies; HTTP error statuses are reserved for requests that never reach the service.

use crate::driver::Reply;
use crate::endpoint::Endpoints;
use axum::Json;
use axum::Router;
use http::HeaderMap;
use std::sync::Arc;
use std::time::Duration;
use tenancy_authz::get_bearer_token;
use tenancy_core::context::Context;
use tenancy_core::endpoint::{Endpoint, TransportError};
use tenancy_core::rest::{RestError, RestResult, get_unique_header};

mod codec;
mod create;
mod delete;
mod health;
pub mod messages;
mod read;
mod search;
mod server;
pub use server::{BoundServer, Server, ServerError, ServerOptions, Status, StopHandle};
#[cfg(test)]
mod testutils;
mod update;

/// Realm reported to clients that fail authorization.
const REALM: &str = "tenancy";

/// Header that carries the maximum time the client is willing to wait for a response.
const TIMEOUT_HEADER: &str = "X-Request-Timeout-Ms";

/// Prefix of the paths of all the methods of the service.
pub const SERVICE_PATH: &str = "/tenancy.v1.TenantService";

/// State shared by all handlers.
#[derive(Clone)]
pub(crate) struct AppState {
    /// The endpoints that implement the service.
    endpoints: Endpoints,
}

/// Builds the request context out of the HTTP request `headers`.
fn request_context(headers: &HeaderMap, requires_token: bool) -> RestResult<Context> {
    let mut ctx = Context::background();

    // Without authorization, the Authorization header belongs to whoever set it.
    if requires_token {
        if let Some(token) = get_bearer_token(headers, REALM)? {
            ctx.insert(token);
        }
    }

    if let Some(value) = get_unique_header(headers, TIMEOUT_HEADER)? {
        let millis = value.to_str().ok().and_then(|value| value.parse::<u64>().ok());
        match millis {
            Some(millis) => ctx = ctx.with_timeout(Duration::from_millis(millis)),
            None => {
                return Err(RestError::InvalidRequest(format!(
                    "Header {} must be a number of milliseconds",
                    TIMEOUT_HEADER
                )));
            }
        }
    }

    Ok(ctx)
}

/// Converts a transport error raised by an endpoint into an HTTP error.
fn map_transport_error(e: TransportError) -> RestError {
    match e {
        TransportError::Unauthorized(e) => {
            RestError::Unauthorized { scheme: "Bearer", realm: REALM, message: e.to_string() }
        }
    }
}

/// Invokes `endpoint` with the wire `message` and returns the wire response.
///
/// `decode` and `encode` convert between the wire representation and the business types.
async fn call<M, Req, Resp, R>(
    endpoints: &Endpoints,
    endpoint: &Endpoint<Req, Reply<Resp>>,
    headers: &HeaderMap,
    message: Option<M>,
    decode: fn(M) -> Req,
    encode: fn(Reply<Resp>) -> R,
) -> RestResult<Json<R>> {
    let ctx = request_context(headers, endpoints.requires_token())?;
    let reply = endpoint(Some(ctx), message.map(decode)).await.map_err(map_transport_error)?;
    Ok(Json(encode(reply)))
}

/// Creates the router for the health routes.
pub(crate) fn health_app(status: Arc<Status>) -> Router {
    use axum::routing::get;
    Router::new()
        .route("/healthz", get(health::live_handler))
        .route("/readyz", get(health::ready_handler))
        .with_state(status)
}

/// Creates the router for the application.
pub(crate) fn app(endpoints: Endpoints, status: Arc<Status>) -> Router {
    use axum::routing::post;
    let state = AppState { endpoints };
    Router::new()
        .route(&format!("{}/Create", SERVICE_PATH), post(create::handler))
        .route(&format!("{}/Read", SERVICE_PATH), post(read::handler))
        .route(&format!("{}/Update", SERVICE_PATH), post(update::handler))
        .route(&format!("{}/Delete", SERVICE_PATH), post(delete::handler))
        .route(&format!("{}/Search", SERVICE_PATH), post(search::handler))
        .with_state(state)
        .merge(health_app(status))
}
