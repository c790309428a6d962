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

//! Business logic for the service.

use crate::db::TenantStore;
use crate::errors::DomainError;
use std::sync::Arc;

mod search;
pub use search::{SearchRequest, SearchResponse};
mod tenant;
pub use tenant::{
    CreateRequest, CreateResponse, DeleteRequest, DeleteResponse, ReadRequest, ReadResponse,
    UpdateRequest, UpdateResponse,
};
#[cfg(test)]
pub(crate) mod testutils;

/// Outcome of a business operation.
///
/// Failures are part of the reply so that they can travel to the caller in the response
/// envelope instead of through the transport.
pub type Reply<T> = Result<T, DomainError>;

/// Business logic.
///
/// The driver is stateless beyond the storage it is attached to, so it is cheap to clone and
/// safe to use concurrently.  Operations consume the driver to match how the endpoints use it.
#[derive(Clone)]
pub struct Driver {
    /// The storage that the driver uses for persistence.
    store: Arc<dyn TenantStore + Send + Sync>,
}

impl Driver {
    /// Creates a new driver backed by the given injected components.
    pub fn new(store: Arc<dyn TenantStore + Send + Sync>) -> Self {
        Self { store }
    }
}
