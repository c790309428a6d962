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

//! Uniform endpoints for the operations of the service.
//!
//! Every endpoint checks its preconditions before reaching into the business logic: the
//! context and the request must be present and the request must be valid.  Any failure,
//! including those of the business logic, is returned inside the `Reply` envelope.  The
//! transport error channel is reserved for the authorization middleware.

use crate::driver::*;
use crate::errors::DomainError;
use crate::validation::Validate;
use std::future::Future;
use std::sync::Arc;
use tenancy_authz::{TokenVerifier, authorize};
use tenancy_core::context::Context;
use tenancy_core::endpoint::{Endpoint, endpoint};

/// Wraps a business operation `op` with the precondition checks shared by all endpoints.
fn make_endpoint<Req, Resp, F, Fut>(driver: Driver, op: F) -> Endpoint<Req, Reply<Resp>>
where
    Req: Validate + Send + 'static,
    Resp: Send + 'static,
    F: Fn(Driver, Context, Req) -> Fut + Clone + Send + Sync + 'static,
    Fut: Future<Output = Reply<Resp>> + Send + 'static,
{
    endpoint(move |ctx: Option<Context>, request: Option<Req>| {
        let driver = driver.clone();
        let op = op.clone();
        async move {
            let Some(ctx) = ctx else {
                return Ok(Err(DomainError::ArgumentNil { name: "ctx" }));
            };
            let Some(request) = request else {
                return Ok(Err(DomainError::ArgumentNil { name: "request" }));
            };
            if let Err(e) = request.validate() {
                return Ok(Err(DomainError::argument("request", e)));
            }
            Ok(op(driver, ctx, request).await)
        }
    })
}

/// Collection of the endpoints exposed by the service.
#[derive(Clone)]
pub struct Endpoints {
    /// Creates a tenant.
    pub create: Endpoint<CreateRequest, Reply<CreateResponse>>,

    /// Reads a tenant.
    pub read: Endpoint<ReadRequest, Reply<ReadResponse>>,

    /// Updates a tenant.
    pub update: Endpoint<UpdateRequest, Reply<UpdateResponse>>,

    /// Deletes a tenant.
    pub delete: Endpoint<DeleteRequest, Reply<DeleteResponse>>,

    /// Searches for tenants.
    pub search: Endpoint<SearchRequest, Reply<SearchResponse>>,

    /// Whether the endpoints require a bearer token.
    authorized: bool,
}

impl Endpoints {
    /// Creates the endpoints backed by `driver`.
    pub fn new(driver: Driver) -> Self {
        Self {
            create: make_endpoint(
                driver.clone(),
                |driver: Driver, ctx: Context, request: CreateRequest| async move {
                    driver.create(&ctx, request).await
                },
            ),
            read: make_endpoint(
                driver.clone(),
                |driver: Driver, ctx: Context, request: ReadRequest| async move {
                    driver.read(&ctx, request).await
                },
            ),
            update: make_endpoint(
                driver.clone(),
                |driver: Driver, ctx: Context, request: UpdateRequest| async move {
                    driver.update(&ctx, request).await
                },
            ),
            delete: make_endpoint(
                driver.clone(),
                |driver: Driver, ctx: Context, request: DeleteRequest| async move {
                    driver.delete(&ctx, request).await
                },
            ),
            search: make_endpoint(
                driver,
                |driver: Driver, ctx: Context, request: SearchRequest| async move {
                    driver.search(&ctx, request).await
                },
            ),
            authorized: false,
        }
    }

    /// Wraps all endpoints so that they require a bearer token accepted by `verifier`.
    pub fn authorized(self, verifier: Arc<dyn TokenVerifier + Send + Sync>) -> Self {
        Self {
            create: authorize(verifier.clone(), self.create),
            read: authorize(verifier.clone(), self.read),
            update: authorize(verifier.clone(), self.update),
            delete: authorize(verifier.clone(), self.delete),
            search: authorize(verifier, self.search),
            authorized: true,
        }
    }

    /// Returns true if callers must present a bearer token.
    pub fn requires_token(&self) -> bool {
        self.authorized
    }
}
