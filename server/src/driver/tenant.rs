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

//! Operations on one tenant.

use crate::driver::{Driver, Reply};
use crate::model::*;
use crate::validation::{Validate, ValidationErrors};
use tenancy_core::context::Context;

/// Request to create a tenant.
#[derive(Clone, Debug, PartialEq)]
pub struct CreateRequest {
    /// Contents of the new tenant.
    pub tenant: Tenant,
}

impl Validate for CreateRequest {
    fn validate(&self) -> Result<(), ValidationErrors> {
        let mut errors = ValidationErrors::default();
        errors.require("tenant.name", self.tenant.name());
        errors.into_result()
    }
}

/// Response to a tenant creation.
#[derive(Clone, Debug, PartialEq)]
pub struct CreateResponse {
    /// Identifier minted for the new tenant.
    pub id: TenantId,

    /// Contents of the new tenant.
    pub tenant: Tenant,

    /// Cursor that locates the new tenant in searches.
    pub cursor: Cursor,
}

/// Request to read a tenant.
#[derive(Clone, Debug, PartialEq)]
pub struct ReadRequest {
    /// Identifier of the tenant to read.
    pub id: TenantId,
}

impl Validate for ReadRequest {
    fn validate(&self) -> Result<(), ValidationErrors> {
        let mut errors = ValidationErrors::default();
        errors.require("tenantId", self.id.as_str());
        errors.into_result()
    }
}

/// Response to a tenant read.
#[derive(Clone, Debug, PartialEq)]
pub struct ReadResponse {
    /// Contents of the tenant.
    pub tenant: Tenant,
}

/// Request to update a tenant.
#[derive(Clone, Debug, PartialEq)]
pub struct UpdateRequest {
    /// Identifier of the tenant to update.
    pub id: TenantId,

    /// New contents of the tenant.
    pub tenant: Tenant,
}

impl Validate for UpdateRequest {
    fn validate(&self) -> Result<(), ValidationErrors> {
        let mut errors = ValidationErrors::default();
        errors.require("tenantId", self.id.as_str());
        errors.require("tenant.name", self.tenant.name());
        errors.into_result()
    }
}

/// Response to a tenant update.
#[derive(Clone, Debug, PartialEq)]
pub struct UpdateResponse {
    /// New contents of the tenant.
    pub tenant: Tenant,

    /// Cursor that locates the tenant in searches.
    pub cursor: Cursor,
}

/// Request to delete a tenant.
#[derive(Clone, Debug, PartialEq)]
pub struct DeleteRequest {
    /// Identifier of the tenant to delete.
    pub id: TenantId,
}

impl Validate for DeleteRequest {
    fn validate(&self) -> Result<(), ValidationErrors> {
        let mut errors = ValidationErrors::default();
        errors.require("tenantId", self.id.as_str());
        errors.into_result()
    }
}

/// Response to a tenant deletion.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct DeleteResponse {}

impl Driver {
    /// Creates a new tenant.
    pub async fn create(self, ctx: &Context, request: CreateRequest) -> Reply<CreateResponse> {
        let created = self.store.create(ctx, request.tenant).await?;
        Ok(CreateResponse { id: created.id, tenant: created.tenant, cursor: created.cursor })
    }

    /// Gets an existing tenant.
    pub async fn read(self, ctx: &Context, request: ReadRequest) -> Reply<ReadResponse> {
        let tenant = self.store.read(ctx, &request.id).await?;
        Ok(ReadResponse { tenant })
    }

    /// Replaces the contents of an existing tenant.
    pub async fn update(self, ctx: &Context, request: UpdateRequest) -> Reply<UpdateResponse> {
        let updated = self.store.update(ctx, &request.id, request.tenant).await?;
        Ok(UpdateResponse { tenant: updated.tenant, cursor: updated.cursor })
    }

    /// Deletes an existing tenant.
    pub async fn delete(self, ctx: &Context, request: DeleteRequest) -> Reply<DeleteResponse> {
        self.store.delete(ctx, &request.id).await?;
        Ok(DeleteResponse {})
    }
}
