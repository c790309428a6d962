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

//! Test utilities for the business layer.

use crate::db::{MemoryStore, StorageError, StorageResult, TenantStore};
use crate::driver::Driver;
use crate::model::*;
use async_trait::async_trait;
use std::io;
use std::sync::Arc;
use tenancy_core::context::Context;

/// Storage that fails every operation.
pub(crate) struct BrokenStore;

impl BrokenStore {
    /// Returns the error that all operations fail with.
    fn error() -> StorageError {
        StorageError::unknown("Backend unreachable", io::Error::other("connection refused"))
    }
}

#[async_trait]
impl TenantStore for BrokenStore {
    async fn create(&self, _ctx: &Context, _tenant: Tenant) -> StorageResult<TenantWithCursor> {
        Err(Self::error())
    }

    async fn read(&self, _ctx: &Context, _id: &TenantId) -> StorageResult<Tenant> {
        Err(Self::error())
    }

    async fn update(
        &self,
        _ctx: &Context,
        _id: &TenantId,
        _tenant: Tenant,
    ) -> StorageResult<TenantWithCursor> {
        Err(Self::error())
    }

    async fn delete(&self, _ctx: &Context, _id: &TenantId) -> StorageResult<()> {
        Err(Self::error())
    }

    async fn search(&self, _ctx: &Context, _query: &SearchQuery) -> StorageResult<SearchPage> {
        Err(Self::error())
    }
}

/// State of a running test.
pub(crate) struct TestContext {
    /// Direct access to the storage used by the driver.
    store: MemoryStore,

    /// The driver under test.
    driver: Driver,
}

impl TestContext {
    /// Creates a driver backed by an empty in-memory store.
    pub(crate) fn setup() -> Self {
        let store = MemoryStore::default();
        let driver = Driver::new(Arc::new(store.clone()));
        Self { store, driver }
    }

    /// Creates a driver backed by a store that fails all operations.
    pub(crate) fn setup_broken() -> Self {
        let store = MemoryStore::default();
        let driver = Driver::new(Arc::new(BrokenStore));
        Self { store, driver }
    }

    /// Returns a fresh request context.
    pub(crate) fn ctx(&self) -> Context {
        Context::background()
    }

    /// Returns a handle to the driver under test.
    pub(crate) fn driver(&self) -> Driver {
        self.driver.clone()
    }

    /// Stores a tenant named `name` bypassing the driver.
    pub(crate) async fn put_tenant(&self, name: &str) -> TenantId {
        self.store.create(&self.ctx(), Tenant::new(name.to_owned())).await.unwrap().id
    }

    /// Gets the tenant `id` bypassing the driver.
    pub(crate) async fn get_tenant(&self, id: &TenantId) -> Tenant {
        self.store.read(&self.ctx(), id).await.unwrap()
    }

    /// Checks if the tenant `id` exists bypassing the driver.
    pub(crate) async fn has_tenant(&self, id: &TenantId) -> bool {
        match self.store.read(&self.ctx(), id).await {
            Ok(_) => true,
            Err(StorageError::NotFound { .. }) => false,
            Err(e) => panic!("{:?}", e),
        }
    }
}
