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

//! Sorting and windowing rules shared by all storage backends.

use crate::db::{StorageError, StorageResult};
use crate::model::*;
use std::cmp::Ordering;

/// Fields by which tenants can be sorted.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub(crate) enum SortField {
    /// The tenant's name.
    Name,

    /// The tenant's identifier.
    Id,
}

/// A validated sorting criterion.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub(crate) struct SortKey {
    /// Field to sort by.
    pub(crate) field: SortField,

    /// Direction in which to sort.
    pub(crate) direction: SortDirection,
}

/// Converts the caller-supplied `options` into the full list of sort keys to apply.
///
/// The result always ends with the identifier so that the ordering is total.
pub(crate) fn resolve_sorting(options: &[SortingOption]) -> StorageResult<Vec<SortKey>> {
    let mut keys = Vec::with_capacity(options.len() + 1);
    for option in options {
        let field = match option.field_name.to_ascii_lowercase().as_str() {
            "name" => SortField::Name,
            "id" => SortField::Id,
            _ => {
                return Err(StorageError::Unknown {
                    message: format!("Unsupported sort field '{}'", option.field_name),
                    source: None,
                });
            }
        };
        keys.push(SortKey { field, direction: option.direction });
    }

    if keys.is_empty() {
        keys.push(SortKey { field: SortField::Name, direction: SortDirection::Ascending });
    }
    if !keys.iter().any(|key| key.field == SortField::Id) {
        keys.push(SortKey { field: SortField::Id, direction: SortDirection::Ascending });
    }
    Ok(keys)
}

/// Compares two tenants according to `keys`.
pub(crate) fn compare(
    keys: &[SortKey],
    (a_id, a): (&TenantId, &Tenant),
    (b_id, b): (&TenantId, &Tenant),
) -> Ordering {
    for key in keys {
        let ordering = match key.field {
            SortField::Name => a.name().cmp(b.name()),
            SortField::Id => a_id.cmp(b_id),
        };
        let ordering = match key.direction {
            SortDirection::Ascending => ordering,
            SortDirection::Descending => ordering.reverse(),
        };
        if ordering != Ordering::Equal {
            return ordering;
        }
    }
    Ordering::Equal
}

/// Range of positions to return out of a sorted and filtered list of tenants.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub(crate) struct Window {
    /// First position to return.
    pub(crate) start: usize,

    /// One past the last position to return.
    pub(crate) end: usize,

    /// Length of the list the window applies to.
    pub(crate) total: usize,
}

impl Window {
    /// Computes the window for a list of `total` elements where the `after` and `before` cursors
    /// of `pagination` were found at the given zero-based positions.
    ///
    /// Cursors that could not be located must be passed as `None` and are ignored.
    pub(crate) fn new(
        total: usize,
        after: Option<usize>,
        before: Option<usize>,
        pagination: &Pagination,
    ) -> Self {
        let mut start = after.map(|pos| pos + 1).unwrap_or(0).min(total);
        let mut end = before.unwrap_or(total).max(start);
        if let Some(first) = pagination.first {
            end = end.min(start.saturating_add(first));
        }
        if let Some(last) = pagination.last {
            start = start.max(end.saturating_sub(last));
        }
        Self { start, end, total }
    }

    /// Number of elements in the window.
    pub(crate) fn len(&self) -> usize {
        self.end - self.start
    }

    /// Whether any element exists before the window.
    pub(crate) fn has_previous_page(&self) -> bool {
        self.start > 0
    }

    /// Whether any element exists after the window.
    pub(crate) fn has_next_page(&self) -> bool {
        self.end < self.total
    }
}
