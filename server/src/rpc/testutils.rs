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

//! Test utilities for the RPC transport.

use crate::db::{MemoryStore, StorageError, TenantStore};
use crate::driver::Driver;
use crate::endpoint::Endpoints;
use crate::model::*;
use crate::rpc::{Status, app};
use axum::Router;
use http::Method;
use std::sync::Arc;
use tenancy_authz::MockTokenVerifier;
use tenancy_core::context::Context;

/// Token accepted by the apps created with `setup_authorized`.
pub(crate) const GOOD_TOKEN: &str = "good-token";

/// Returns the route to invoke the RPC `method`.
pub(crate) fn route(method: &str) -> (Method, String) {
    (Method::POST, format!("{}/{}", super::SERVICE_PATH, method))
}

/// State of a running test.
pub(crate) struct TestContext {
    /// Direct access to the storage used by the app.
    store: MemoryStore,

    /// The app under test.
    app: Router,
}

impl TestContext {
    /// Creates an app that accepts any caller.
    pub(crate) fn setup() -> Self {
        let store = MemoryStore::default();
        let endpoints = Endpoints::new(Driver::new(Arc::new(store.clone())));
        let app = app(endpoints, Arc::from(Status::default()));
        Self { store, app }
    }

    /// Creates an app that only accepts callers presenting `GOOD_TOKEN`.
    pub(crate) fn setup_authorized() -> Self {
        let store = MemoryStore::default();
        let verifier = Arc::new(MockTokenVerifier::new(&[(GOOD_TOKEN, "admin@example.com")]));
        let endpoints = Endpoints::new(Driver::new(Arc::new(store.clone()))).authorized(verifier);
        let app = app(endpoints, Arc::from(Status::default()));
        Self { store, app }
    }

    /// Returns a copy of the app under test.
    pub(crate) fn app(&self) -> Router {
        self.app.clone()
    }

    /// Consumes the context and returns the app under test.
    pub(crate) fn into_app(self) -> Router {
        self.app
    }

    /// Stores a tenant named `name` bypassing the app.
    pub(crate) async fn put_tenant(&self, name: &str) -> TenantId {
        let ctx = Context::background();
        self.store.create(&ctx, Tenant::new(name.to_owned())).await.unwrap().id
    }

    /// Gets the tenant `id` bypassing the app, if it exists.
    pub(crate) async fn get_tenant(&self, id: &str) -> Option<Tenant> {
        let ctx = Context::background();
        match self.store.read(&ctx, &TenantId::from(id)).await {
            Ok(tenant) => Some(tenant),
            Err(StorageError::NotFound { .. }) => None,
            Err(e) => panic!("{:?}", e),
        }
    }
}
