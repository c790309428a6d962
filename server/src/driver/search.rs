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

//! Operations on collections of tenants.

use crate::driver::{Driver, Reply};
use crate::model::{SearchPage, SearchQuery};
use crate::validation::{Validate, ValidationErrors};
use tenancy_core::context::Context;

/// Request to search for tenants.
pub type SearchRequest = SearchQuery;

/// Response to a tenant search.
pub type SearchResponse = SearchPage;

impl Validate for SearchQuery {
    fn validate(&self) -> Result<(), ValidationErrors> {
        Ok(())
    }
}

impl Driver {
    /// Gets a page of tenants matching `request`.
    pub async fn search(self, ctx: &Context, request: SearchRequest) -> Reply<SearchResponse> {
        let page = self.store.search(ctx, &request).await?;
        Ok(page)
    }
}
