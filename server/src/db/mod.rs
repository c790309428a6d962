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

//! Storage abstraction in terms of the operations needed by the service.

use crate::model::*;
use async_trait::async_trait;
use tenancy_core::context::{Context, ContextError};
use tenancy_core::endpoint::BoxError;

mod document;
pub use document::{DocumentStore, DocumentStoreOptions};
mod memory;
pub use memory::MemoryStore;
mod paging;

/// Storage errors.
#[derive(Debug, thiserror::Error)]
pub enum StorageError {
    /// The tenant to insert conflicts with an existing one.
    #[error("Already exists")]
    AlreadyExists {
        /// Underlying cause.
        #[source]
        source: Option<BoxError>,
    },

    /// The requested tenant does not exist.
    #[error("Tenant {id} not found")]
    NotFound {
        /// Identifier of the tenant that was looked for.
        id: TenantId,

        /// Underlying cause.
        #[source]
        source: Option<BoxError>,
    },

    /// Catch-all error type for unexpected backend failures.
    #[error("{message}")]
    Unknown {
        /// Description of the failure.
        message: String,

        /// Underlying cause.
        #[source]
        source: Option<BoxError>,
    },
}

impl StorageError {
    /// Creates a `NotFound` error for `id` without cause.
    pub fn not_found(id: TenantId) -> Self {
        StorageError::NotFound { id, source: None }
    }

    /// Creates an `Unknown` error with `message` caused by `e`.
    pub fn unknown<E>(message: &str, e: E) -> Self
    where
        E: std::error::Error + Send + Sync + 'static,
    {
        StorageError::Unknown { message: message.to_owned(), source: Some(Box::from(e)) }
    }
}

impl From<ContextError> for StorageError {
    fn from(e: ContextError) -> Self {
        StorageError::unknown("Operation aborted", e)
    }
}

/// Result type for this module.
pub type StorageResult<T> = Result<T, StorageError>;

/// Capability to persist tenants.
///
/// Implementations must be safe to call concurrently and must honor the deadline and
/// cancellation of the given context, reporting them as `Unknown` errors.
#[async_trait]
pub trait TenantStore {
    /// Persists `tenant` under a freshly minted identifier.
    async fn create(&self, ctx: &Context, tenant: Tenant) -> StorageResult<TenantWithCursor>;

    /// Gets the tenant identified by `id`.
    async fn read(&self, ctx: &Context, id: &TenantId) -> StorageResult<Tenant>;

    /// Replaces the contents of the existing tenant identified by `id` with `tenant`.
    async fn update(
        &self,
        ctx: &Context,
        id: &TenantId,
        tenant: Tenant,
    ) -> StorageResult<TenantWithCursor>;

    /// Deletes the existing tenant identified by `id`.
    async fn delete(&self, ctx: &Context, id: &TenantId) -> StorageResult<()>;

    /// Gets the page of tenants described by `query`.
    async fn search(&self, ctx: &Context, query: &SearchQuery) -> StorageResult<SearchPage>;
}
