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

//! High-level data types.

use derive_getters::Getters;
use derive_more::{Constructor, Display};
use serde::{Deserialize, Serialize};

/// Identifier of a tenant as minted by the storage layer at creation time.
///
/// Identifiers are opaque: callers must not assume anything about their format.
#[derive(Clone, Constructor, Debug, Display, Eq, Hash, Ord, PartialEq, PartialOrd)]
pub struct TenantId(String);

impl TenantId {
    /// Returns the raw identifier.
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Returns true if the identifier is empty.
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl From<&str> for TenantId {
    fn from(raw: &str) -> Self {
        Self(raw.to_owned())
    }
}

/// Opaque position of a tenant within a search that can be used to resume paging.
#[derive(Clone, Constructor, Debug, Display, Eq, Hash, PartialEq)]
pub struct Cursor(String);

impl Cursor {
    /// Returns the raw cursor.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<&TenantId> for Cursor {
    fn from(id: &TenantId) -> Self {
        Self(id.0.clone())
    }
}

/// The tenant entity.  This is the shape persisted by the storage layer.
#[derive(Clone, Constructor, Debug, Deserialize, Eq, Getters, PartialEq, Serialize)]
pub struct Tenant {
    /// Display name of the tenant.
    name: String,
}

/// A tenant along with its identifier and its cursor.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct TenantWithCursor {
    /// Identifier of the tenant.
    pub id: TenantId,

    /// Contents of the tenant.
    pub tenant: Tenant,

    /// Cursor that locates this tenant in searches.
    pub cursor: Cursor,
}

impl TenantWithCursor {
    /// Creates a new tenant with cursor, deriving the cursor from the `id`.
    pub fn new(id: TenantId, tenant: Tenant) -> Self {
        let cursor = Cursor::from(&id);
        Self { id, tenant, cursor }
    }
}

/// Cursor-relative window to return from a search.
///
/// `after`/`first` describe a forward window and `before`/`last` describe a backward window.
/// Both can be combined.  A missing cursor means the corresponding end of the results and a
/// missing count means no truncation.
#[derive(Clone, Debug, Default, Eq, PartialEq)]
pub struct Pagination {
    /// Only return tenants strictly after this cursor.
    pub after: Option<Cursor>,

    /// Return at most this many tenants from the start of the window.
    pub first: Option<usize>,

    /// Only return tenants strictly before this cursor.
    pub before: Option<Cursor>,

    /// Return at most this many tenants from the end of the window.
    pub last: Option<usize>,
}

/// Direction in which to sort search results.
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq)]
pub enum SortDirection {
    /// Smallest values first.
    #[default]
    Ascending,

    /// Largest values first.
    Descending,
}

/// A single sorting criterion for searches.
#[derive(Clone, Constructor, Debug, Eq, PartialEq)]
pub struct SortingOption {
    /// Name of the field to sort by.
    pub field_name: String,

    /// Direction in which to sort.
    pub direction: SortDirection,
}

/// Parameters of a tenant search.
#[derive(Clone, Debug, Default, Eq, PartialEq)]
pub struct SearchQuery {
    /// Window of results to return.
    pub pagination: Pagination,

    /// Sorting criteria in order of precedence.  Empty means ascending by name.
    pub sorting_options: Vec<SortingOption>,

    /// Identifiers to restrict the search to.  Empty means no restriction.
    pub ids: Vec<TenantId>,
}

/// One page of search results.
#[derive(Clone, Debug, Default, Eq, PartialEq)]
pub struct SearchPage {
    /// Whether there are tenants before the returned window.
    pub has_previous_page: bool,

    /// Whether there are tenants after the returned window.
    pub has_next_page: bool,

    /// Number of tenants that matched the filter, regardless of the window.
    pub total_count: u64,

    /// The tenants in the window, in sorting order.
    pub tenants: Vec<TenantWithCursor>,
}
