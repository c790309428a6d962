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

//! Conversions between wire messages and business types.

use crate::driver::*;
use crate::errors::DomainError;
use crate::model::*;
use crate::rpc::messages::*;
use log::warn;

/// Maps a business error to the code reported on the wire.
pub(crate) fn map_error(e: &DomainError) -> ErrorCode {
    match e {
        DomainError::ArgumentNil { .. } | DomainError::Argument { .. } => ErrorCode::BadRequest,
        DomainError::Unknown { .. } => {
            warn!("Reporting unexpected error to client: {}", e);
            ErrorCode::Unknown
        }
        DomainError::EntityAlreadyExists { .. } => ErrorCode::TenantAlreadyExists,
        DomainError::EntityNotFound { .. } => ErrorCode::TenantNotFound,
    }
}

/// Converts an optional wire tenant to a tenant.  Missing tenants are treated as empty so that
/// validation reports the missing fields.
fn decode_tenant(message: Option<TenantMessage>) -> Tenant {
    Tenant::new(message.map(|tenant| tenant.name).unwrap_or_default())
}

/// Converts a tenant to its wire representation.
fn encode_tenant(tenant: Tenant) -> TenantMessage {
    TenantMessage { name: tenant.name().clone() }
}

/// Converts a wire cursor, where the empty string means no cursor.
fn decode_cursor(raw: String) -> Option<Cursor> {
    if raw.is_empty() { None } else { Some(Cursor::new(raw)) }
}

/// Converts a wire count to a native count.
fn decode_count(count: Option<u32>) -> Option<usize> {
    count.map(|count| usize::try_from(count).unwrap_or(usize::MAX))
}

pub(crate) fn decode_create_request(message: CreateRequestMessage) -> CreateRequest {
    CreateRequest { tenant: decode_tenant(message.tenant) }
}

pub(crate) fn decode_read_request(message: ReadRequestMessage) -> ReadRequest {
    ReadRequest { id: TenantId::new(message.tenant_id) }
}

pub(crate) fn decode_update_request(message: UpdateRequestMessage) -> UpdateRequest {
    UpdateRequest { id: TenantId::new(message.tenant_id), tenant: decode_tenant(message.tenant) }
}

pub(crate) fn decode_delete_request(message: DeleteRequestMessage) -> DeleteRequest {
    DeleteRequest { id: TenantId::new(message.tenant_id) }
}

pub(crate) fn decode_search_request(message: SearchRequestMessage) -> SearchRequest {
    let pagination = message.pagination.unwrap_or_default();
    let sorting_options = message
        .sorting_options
        .into_iter()
        .map(|option| {
            let direction = match option.direction {
                Direction::Ascending => SortDirection::Ascending,
                Direction::Descending => SortDirection::Descending,
            };
            SortingOption::new(option.field_name, direction)
        })
        .collect();
    SearchRequest {
        pagination: Pagination {
            after: decode_cursor(pagination.after),
            first: decode_count(pagination.first),
            before: decode_cursor(pagination.before),
            last: decode_count(pagination.last),
        },
        sorting_options,
        ids: message.tenant_ids.into_iter().map(TenantId::new).collect(),
    }
}

pub(crate) fn encode_create_response(reply: Reply<CreateResponse>) -> CreateResponseMessage {
    match reply {
        Ok(response) => {
            CreateResponseMessage { tenant_id: response.id.to_string(), ..Default::default() }
        }
        Err(e) => CreateResponseMessage {
            error: map_error(&e),
            error_message: e.to_string(),
            ..Default::default()
        },
    }
}

pub(crate) fn encode_read_response(reply: Reply<ReadResponse>) -> ReadResponseMessage {
    match reply {
        Ok(response) => {
            ReadResponseMessage { tenant: Some(encode_tenant(response.tenant)), ..Default::default() }
        }
        Err(e) => ReadResponseMessage {
            error: map_error(&e),
            error_message: e.to_string(),
            ..Default::default()
        },
    }
}

pub(crate) fn encode_update_response(reply: Reply<UpdateResponse>) -> UpdateResponseMessage {
    match reply {
        Ok(_) => UpdateResponseMessage::default(),
        Err(e) => UpdateResponseMessage { error: map_error(&e), error_message: e.to_string() },
    }
}

pub(crate) fn encode_delete_response(reply: Reply<DeleteResponse>) -> DeleteResponseMessage {
    match reply {
        Ok(_) => DeleteResponseMessage::default(),
        Err(e) => DeleteResponseMessage { error: map_error(&e), error_message: e.to_string() },
    }
}

pub(crate) fn encode_search_response(reply: Reply<SearchResponse>) -> SearchResponseMessage {
    match reply {
        Ok(response) => SearchResponseMessage {
            has_previous_page: response.has_previous_page,
            has_next_page: response.has_next_page,
            total_count: response.total_count,
            tenants: response
                .tenants
                .into_iter()
                .map(|tenant| TenantWithCursorMessage {
                    id: tenant.id.to_string(),
                    tenant: encode_tenant(tenant.tenant),
                    cursor: tenant.cursor.to_string(),
                })
                .collect(),
            ..Default::default()
        },
        Err(e) => SearchResponseMessage {
            error: map_error(&e),
            error_message: e.to_string(),
            ..Default::default()
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::StorageError;
    use crate::validation::ValidationErrors;

    /// Returns one instance of every business error kind along with its expected wire code.
    fn all_errors() -> Vec<(DomainError, ErrorCode)> {
        let mut validation = ValidationErrors::default();
        validation.require("tenant.name", "");
        vec![
            (DomainError::ArgumentNil { name: "request" }, ErrorCode::BadRequest),
            (DomainError::argument("request", validation), ErrorCode::BadRequest),
            (
                DomainError::Unknown { message: "boom".to_owned(), source: None },
                ErrorCode::Unknown,
            ),
            (
                DomainError::from(StorageError::AlreadyExists { source: None }),
                ErrorCode::TenantAlreadyExists,
            ),
            (
                DomainError::from(StorageError::not_found(TenantId::from("nonexistent"))),
                ErrorCode::TenantNotFound,
            ),
        ]
    }

    #[test]
    fn test_map_error() {
        for (e, code) in all_errors() {
            assert_eq!(code, map_error(&e), "Bad mapping for {:?}", e);
        }
    }

    #[test]
    fn test_encode_errors_in_every_response() {
        for (e, code) in all_errors() {
            let message = e.to_string();
            assert!(!message.is_empty());
            let response = encode_delete_response(Err(e));
            assert_eq!(DeleteResponseMessage { error: code, error_message: message }, response);
        }
    }

    #[test]
    fn test_encode_not_found_mentions_id() {
        let e = DomainError::from(StorageError::not_found(TenantId::from("nonexistent")));
        let response = encode_read_response(Err(e));
        assert_eq!(ErrorCode::TenantNotFound, response.error);
        assert!(response.error_message.contains("nonexistent"));
        assert_eq!(None, response.tenant);
    }

    #[test]
    fn test_encode_success_has_no_error() {
        let response = encode_create_response(Ok(CreateResponse {
            id: TenantId::from("abc"),
            tenant: Tenant::new("acme".to_owned()),
            cursor: Cursor::new("abc".to_owned()),
        }));
        assert_eq!(
            CreateResponseMessage {
                tenant_id: "abc".to_owned(),
                error: ErrorCode::NoError,
                error_message: "".to_owned(),
            },
            response
        );

        let response =
            encode_read_response(Ok(ReadResponse { tenant: Tenant::new("acme".to_owned()) }));
        assert_eq!(Some(TenantMessage { name: "acme".to_owned() }), response.tenant);
        assert_eq!(ErrorCode::NoError, response.error);
        assert!(response.error_message.is_empty());

        let response = encode_update_response(Ok(UpdateResponse {
            tenant: Tenant::new("acme".to_owned()),
            cursor: Cursor::new("abc".to_owned()),
        }));
        assert_eq!(UpdateResponseMessage::default(), response);
    }

    #[test]
    fn test_encode_search_response() {
        let response = encode_search_response(Ok(SearchResponse {
            has_previous_page: true,
            has_next_page: false,
            total_count: 7,
            tenants: vec![TenantWithCursor::new(
                TenantId::from("abc"),
                Tenant::new("acme".to_owned()),
            )],
        }));
        assert_eq!(
            SearchResponseMessage {
                has_previous_page: true,
                has_next_page: false,
                total_count: 7,
                tenants: vec![TenantWithCursorMessage {
                    id: "abc".to_owned(),
                    tenant: TenantMessage { name: "acme".to_owned() },
                    cursor: "abc".to_owned(),
                }],
                error: ErrorCode::NoError,
                error_message: "".to_owned(),
            },
            response
        );
    }

    #[test]
    fn test_decode_missing_tenant() {
        let request = decode_create_request(CreateRequestMessage { tenant: None });
        assert_eq!(CreateRequest { tenant: Tenant::new("".to_owned()) }, request);

        let request = decode_update_request(UpdateRequestMessage {
            tenant_id: "abc".to_owned(),
            tenant: Some(TenantMessage { name: "acme".to_owned() }),
        });
        assert_eq!(
            UpdateRequest { id: TenantId::from("abc"), tenant: Tenant::new("acme".to_owned()) },
            request
        );
    }

    #[test]
    fn test_decode_search_request() {
        let request = decode_search_request(SearchRequestMessage {
            pagination: Some(PaginationMessage {
                after: "a".to_owned(),
                first: Some(5),
                before: "".to_owned(),
                last: None,
            }),
            sorting_options: vec![SortingOptionMessage {
                field_name: "name".to_owned(),
                direction: Direction::Descending,
            }],
            tenant_ids: vec!["x".to_owned(), "y".to_owned()],
        });
        assert_eq!(
            SearchRequest {
                pagination: Pagination {
                    after: Some(Cursor::new("a".to_owned())),
                    first: Some(5),
                    before: None,
                    last: None,
                },
                sorting_options: vec![SortingOption::new(
                    "name".to_owned(),
                    SortDirection::Descending
                )],
                ids: vec![TenantId::from("x"), TenantId::from("y")],
            },
            request
        );
    }

    #[test]
    fn test_decode_search_request_defaults() {
        assert_eq!(SearchRequest::default(), decode_search_request(SearchRequestMessage::default()));
    }
}
