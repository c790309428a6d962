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

//! Wire representation of the messages exchanged with clients.
//!
//! Field names use camelCase and enumerations travel as their numeric values, which are part of
//! the public contract and must never change.

use serde::de::Visitor;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;

/// Outcome of an operation as reported on the wire.
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq)]
pub enum ErrorCode {
    /// The operation succeeded.
    #[default]
    NoError = 0,

    /// The operation failed for an unexpected reason.
    Unknown = 1,

    /// The tenant to create conflicts with an existing one.
    TenantAlreadyExists = 2,

    /// The requested tenant does not exist.
    TenantNotFound = 3,

    /// The request was malformed.
    BadRequest = 4,
}

impl Serialize for ErrorCode {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_u8(*self as u8)
    }
}

/// Visitor to deserialize an `ErrorCode` from its numeric value.
struct ErrorCodeVisitor;

impl Visitor<'_> for ErrorCodeVisitor {
    type Value = ErrorCode;

    fn expecting(&self, formatter: &mut fmt::Formatter) -> fmt::Result {
        formatter.write_str("an error code between 0 and 4")
    }

    fn visit_u64<E>(self, v: u64) -> Result<Self::Value, E>
    where
        E: serde::de::Error,
    {
        match v {
            0 => Ok(ErrorCode::NoError),
            1 => Ok(ErrorCode::Unknown),
            2 => Ok(ErrorCode::TenantAlreadyExists),
            3 => Ok(ErrorCode::TenantNotFound),
            4 => Ok(ErrorCode::BadRequest),
            v => Err(E::custom(format!("Unknown error code {}", v))),
        }
    }
}

impl<'de> Deserialize<'de> for ErrorCode {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        deserializer.deserialize_u8(ErrorCodeVisitor)
    }
}

/// Sorting direction as reported on the wire.
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq)]
pub enum Direction {
    /// Smallest values first.
    #[default]
    Ascending = 0,

    /// Largest values first.
    Descending = 1,
}

impl Serialize for Direction {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_u8(*self as u8)
    }
}

/// Visitor to deserialize a `Direction` from its numeric value.
struct DirectionVisitor;

impl Visitor<'_> for DirectionVisitor {
    type Value = Direction;

    fn expecting(&self, formatter: &mut fmt::Formatter) -> fmt::Result {
        formatter.write_str("a sorting direction of 0 or 1")
    }

    fn visit_u64<E>(self, v: u64) -> Result<Self::Value, E>
    where
        E: serde::de::Error,
    {
        match v {
            0 => Ok(Direction::Ascending),
            1 => Ok(Direction::Descending),
            v => Err(E::custom(format!("Unknown sorting direction {}", v))),
        }
    }
}

impl<'de> Deserialize<'de> for Direction {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        deserializer.deserialize_u8(DirectionVisitor)
    }
}

/// A tenant.
#[derive(Clone, Debug, Default, Deserialize, Eq, PartialEq, Serialize)]
#[serde(default, rename_all = "camelCase")]
pub struct TenantMessage {
    /// Display name of the tenant.
    pub name: String,
}

/// Request to create a tenant.
#[derive(Clone, Debug, Default, Deserialize, Eq, PartialEq, Serialize)]
#[serde(default, rename_all = "camelCase")]
pub struct CreateRequestMessage {
    /// Contents of the new tenant.
    pub tenant: Option<TenantMessage>,
}

/// Response to a tenant creation.
#[derive(Clone, Debug, Default, Deserialize, Eq, PartialEq, Serialize)]
#[serde(default, rename_all = "camelCase")]
pub struct CreateResponseMessage {
    /// Identifier of the new tenant.
    pub tenant_id: String,

    /// Outcome of the operation.
    pub error: ErrorCode,

    /// Description of the failure, if any.
    pub error_message: String,
}

/// Request to read a tenant.
#[derive(Clone, Debug, Default, Deserialize, Eq, PartialEq, Serialize)]
#[serde(default, rename_all = "camelCase")]
pub struct ReadRequestMessage {
    /// Identifier of the tenant to read.
    pub tenant_id: String,
}

/// Response to a tenant read.
#[derive(Clone, Debug, Default, Deserialize, Eq, PartialEq, Serialize)]
#[serde(default, rename_all = "camelCase")]
pub struct ReadResponseMessage {
    /// Contents of the tenant.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tenant: Option<TenantMessage>,

    /// Outcome of the operation.
    pub error: ErrorCode,

    /// Description of the failure, if any.
    pub error_message: String,
}

/// Request to update a tenant.
#[derive(Clone, Debug, Default, Deserialize, Eq, PartialEq, Serialize)]
#[serde(default, rename_all = "camelCase")]
pub struct UpdateRequestMessage {
    /// Identifier of the tenant to update.
    pub tenant_id: String,

    /// New contents of the tenant.
    pub tenant: Option<TenantMessage>,
}

/// Response to a tenant update.
#[derive(Clone, Debug, Default, Deserialize, Eq, PartialEq, Serialize)]
#[serde(default, rename_all = "camelCase")]
pub struct UpdateResponseMessage {
    /// Outcome of the operation.
    pub error: ErrorCode,

    /// Description of the failure, if any.
    pub error_message: String,
}

/// Request to delete a tenant.
#[derive(Clone, Debug, Default, Deserialize, Eq, PartialEq, Serialize)]
#[serde(default, rename_all = "camelCase")]
pub struct DeleteRequestMessage {
    /// Identifier of the tenant to delete.
    pub tenant_id: String,
}

/// Response to a tenant deletion.
#[derive(Clone, Debug, Default, Deserialize, Eq, PartialEq, Serialize)]
#[serde(default, rename_all = "camelCase")]
pub struct DeleteResponseMessage {
    /// Outcome of the operation.
    pub error: ErrorCode,

    /// Description of the failure, if any.
    pub error_message: String,
}

/// Window of results to return from a search.
#[derive(Clone, Debug, Default, Deserialize, Eq, PartialEq, Serialize)]
#[serde(default, rename_all = "camelCase")]
pub struct PaginationMessage {
    /// Cursor after which to start returning results.  Empty means the beginning.
    pub after: String,

    /// Maximum number of results to return after `after`.
    pub first: Option<u32>,

    /// Cursor before which to stop returning results.  Empty means the end.
    pub before: String,

    /// Maximum number of results to return before `before`.
    pub last: Option<u32>,
}

/// A single sorting criterion.
#[derive(Clone, Debug, Default, Deserialize, Eq, PartialEq, Serialize)]
#[serde(default, rename_all = "camelCase")]
pub struct SortingOptionMessage {
    /// Name of the field to sort by.
    pub field_name: String,

    /// Direction in which to sort.
    pub direction: Direction,
}

/// Request to search for tenants.
#[derive(Clone, Debug, Default, Deserialize, Eq, PartialEq, Serialize)]
#[serde(default, rename_all = "camelCase")]
pub struct SearchRequestMessage {
    /// Window of results to return.
    pub pagination: Option<PaginationMessage>,

    /// Sorting criteria in order of precedence.
    pub sorting_options: Vec<SortingOptionMessage>,

    /// Identifiers to restrict the search to.
    pub tenant_ids: Vec<String>,
}

/// A tenant within search results.
#[derive(Clone, Debug, Default, Deserialize, Eq, PartialEq, Serialize)]
#[serde(default, rename_all = "camelCase")]
pub struct TenantWithCursorMessage {
    /// Identifier of the tenant.
    pub id: String,

    /// Contents of the tenant.
    pub tenant: TenantMessage,

    /// Cursor to resume searching from this tenant.
    pub cursor: String,
}

/// Response to a tenant search.
#[derive(Clone, Debug, Default, Deserialize, Eq, PartialEq, Serialize)]
#[serde(default, rename_all = "camelCase")]
pub struct SearchResponseMessage {
    /// Whether there are tenants before the returned ones.
    pub has_previous_page: bool,

    /// Whether there are tenants after the returned ones.
    pub has_next_page: bool,

    /// Number of tenants that matched the filter, regardless of the window.
    pub total_count: u64,

    /// The tenants in the window.
    pub tenants: Vec<TenantWithCursorMessage>,

    /// Outcome of the operation.
    pub error: ErrorCode,

    /// Description of the failure, if any.
    pub error_message: String,
}
