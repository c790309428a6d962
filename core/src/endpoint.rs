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

//! Uniform shape of the functions that serve a single RPC.
//!
//! Every operation exposed by a service is reduced to a function that takes an optional context
//! and an optional request and returns either a response or a transport-level error.  Keeping a
//! single shape allows wrapping any endpoint with cross-cutting middlewares.

use crate::context::Context;
use futures::future::BoxFuture;
use std::future::Future;
use std::sync::Arc;

/// Type-erased error used as the cause of transport errors.
pub type BoxError = Box<dyn std::error::Error + Send + Sync>;

/// Errors that abort the processing of a request before it reaches the service.
///
/// Business errors never travel through this type: they are part of the responses.
#[derive(Debug, thiserror::Error)]
pub enum TransportError {
    /// The caller could not be authorized.
    #[error("Unauthorized: {0}")]
    Unauthorized(#[source] BoxError),
}

/// Result type for endpoint invocations.
pub type EndpointResult<T> = Result<T, TransportError>;

/// A function that serves one RPC.
pub type Endpoint<Req, Resp> = Arc<
    dyn Fn(Option<Context>, Option<Req>) -> BoxFuture<'static, EndpointResult<Resp>> + Send + Sync,
>;

/// Wraps an async function `f` as an `Endpoint`.
pub fn endpoint<Req, Resp, F, Fut>(f: F) -> Endpoint<Req, Resp>
where
    F: Fn(Option<Context>, Option<Req>) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = EndpointResult<Resp>> + Send + 'static,
{
    Arc::new(move |ctx: Option<Context>, req: Option<Req>| -> BoxFuture<'static, EndpointResult<Resp>> {
        Box::pin(f(ctx, req))
    })
}
