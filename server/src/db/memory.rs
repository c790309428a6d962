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

//! Implementation of the storage abstraction backed by an in-process map.

use crate::db::paging::{Window, compare, resolve_sorting};
use crate::db::{StorageError, StorageResult, TenantStore};
use crate::model::*;
use async_trait::async_trait;
use std::collections::{HashMap, HashSet};
use std::sync::Arc;
use tenancy_core::context::Context;
use tokio::sync::RwLock;
use uuid::Uuid;

/// Storage that keeps all tenants in memory.
///
/// Clones share the same underlying map.  Reads proceed concurrently and writes are exclusive.
#[derive(Clone, Default)]
pub struct MemoryStore {
    /// Mapping of identifiers to tenants.
    tenants: Arc<RwLock<HashMap<TenantId, Tenant>>>,
}

impl MemoryStore {
    /// Mints a new tenant identifier.
    fn new_id() -> TenantId {
        TenantId::new(Uuid::new_v4().simple().to_string())
    }
}

#[async_trait]
impl TenantStore for MemoryStore {
    async fn create(&self, ctx: &Context, tenant: Tenant) -> StorageResult<TenantWithCursor> {
        let mut tenants = ctx.run(self.tenants.write()).await?;
        let id = Self::new_id();
        if tenants.contains_key(&id) {
            return Err(StorageError::AlreadyExists { source: None });
        }
        tenants.insert(id.clone(), tenant.clone());
        Ok(TenantWithCursor::new(id, tenant))
    }

    async fn read(&self, ctx: &Context, id: &TenantId) -> StorageResult<Tenant> {
        let tenants = ctx.run(self.tenants.read()).await?;
        match tenants.get(id) {
            Some(tenant) => Ok(tenant.clone()),
            None => Err(StorageError::not_found(id.clone())),
        }
    }

    async fn update(
        &self,
        ctx: &Context,
        id: &TenantId,
        tenant: Tenant,
    ) -> StorageResult<TenantWithCursor> {
        let mut tenants = ctx.run(self.tenants.write()).await?;
        match tenants.get_mut(id) {
            Some(existing) => {
                *existing = tenant.clone();
                Ok(TenantWithCursor::new(id.clone(), tenant))
            }
            None => Err(StorageError::not_found(id.clone())),
        }
    }

    async fn delete(&self, ctx: &Context, id: &TenantId) -> StorageResult<()> {
        let mut tenants = ctx.run(self.tenants.write()).await?;
        match tenants.remove(id) {
            Some(_) => Ok(()),
            None => Err(StorageError::not_found(id.clone())),
        }
    }

    async fn search(&self, ctx: &Context, query: &SearchQuery) -> StorageResult<SearchPage> {
        let keys = resolve_sorting(&query.sorting_options)?;

        let tenants = ctx.run(self.tenants.read()).await?;
        let filter = query.ids.iter().collect::<HashSet<&TenantId>>();
        let mut matches = tenants
            .iter()
            .filter(|(id, _)| filter.is_empty() || filter.contains(id))
            .collect::<Vec<(&TenantId, &Tenant)>>();
        matches.sort_by(|a, b| compare(&keys, *a, *b));

        let position = |cursor: &Option<Cursor>| {
            cursor.as_ref().and_then(|cursor| {
                matches.iter().position(|(id, _)| id.as_str() == cursor.as_str())
            })
        };
        let window = Window::new(
            matches.len(),
            position(&query.pagination.after),
            position(&query.pagination.before),
            &query.pagination,
        );

        let page = matches[window.start..window.end]
            .iter()
            .map(|(id, tenant)| TenantWithCursor::new((*id).clone(), (*tenant).clone()))
            .collect::<Vec<TenantWithCursor>>();
        Ok(SearchPage {
            has_previous_page: window.has_previous_page(),
            has_next_page: window.has_next_page(),
            total_count: window.total as u64,
            tenants: page,
        })
    }
}
