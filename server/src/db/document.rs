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

//! Implementation of the storage abstraction backed by a document collection in PostgreSQL.
//!
//! Each tenant is a JSONB document keyed by a server-generated UUID.  Identifiers are exposed
//! in their 32-digit hexadecimal form.

use crate::db::paging::{SortField, SortKey, Window, resolve_sorting};
use crate::db::{StorageError, StorageResult, TenantStore};
use crate::model::*;
use async_trait::async_trait;
use derivative::Derivative;
use futures::TryStreamExt;
use log::info;
use sqlx::postgres::{PgConnectOptions, PgPool, PgPoolOptions, Postgres};
use sqlx::types::Json;
use sqlx::{Row, Transaction};
use tenancy_core::context::Context;
use tenancy_core::env::{get_optional_var, get_required_var};
use uuid::Uuid;

/// Schema to use to initialize the database.
const SCHEMA: &str = include_str!("document.sql");

/// Default maximum number of connections to keep open to the database.
const DEFAULT_MAX_CONNECTIONS: u32 = 10;

/// SQL condition that restricts a query to the identifiers bound to `$1`, if any.
const FILTER: &str = "($1::uuid[] IS NULL OR id = ANY($1))";

/// Takes a raw SQLx error `e` and converts it to our generic error type.
fn map_sqlx_error(e: sqlx::Error) -> StorageError {
    let code = e.as_database_error().and_then(|e| e.code()).map(|code| code.into_owned());
    match code.as_deref() {
        Some("23505") /* unique_violation */ => {
            StorageError::AlreadyExists { source: Some(Box::from(e)) }
        }
        _ => StorageError::unknown("Database operation failed", e),
    }
}

/// Converts a row count or position returned by the database into a `usize`.
fn to_usize(value: i64) -> StorageResult<usize> {
    usize::try_from(value).map_err(|e| StorageError::unknown("Invalid row count", e))
}

/// Parses a tenant identifier into the database's native type.  Identifiers that cannot be
/// parsed cannot exist in the database either.
///
/// Only the form produced by `format_id` is accepted so that each tenant has exactly one valid
/// identifier, as it does in the in-memory store.
fn parse_id(raw: &str) -> Option<Uuid> {
    if raw.len() != 32 || !raw.bytes().all(|b| matches!(b, b'0'..=b'9' | b'a'..=b'f')) {
        return None;
    }
    Uuid::try_parse(raw).ok()
}

/// Formats a native identifier as a tenant identifier.
fn format_id(id: Uuid) -> TenantId {
    TenantId::new(id.simple().to_string())
}

/// Generates the `ORDER BY` expression for `keys`.
fn order_by(keys: &[SortKey]) -> String {
    let mut terms = Vec::with_capacity(keys.len());
    for key in keys {
        let column = match key.field {
            SortField::Name => "(document->>'name') COLLATE \"C\"",
            SortField::Id => "id",
        };
        let direction = match key.direction {
            SortDirection::Ascending => "ASC",
            SortDirection::Descending => "DESC",
        };
        terms.push(format!("{} {}", column, direction));
    }
    terms.join(", ")
}

/// Options to establish a connection to the document database.
#[derive(Derivative)]
#[derivative(Debug)]
#[cfg_attr(test, derivative(PartialEq))]
pub struct DocumentStoreOptions {
    /// Connection string of the database server.  May contain credentials.
    #[derivative(Debug = "ignore")]
    pub connection_string: String,

    /// Name of the database that holds the tenants collection.
    pub database_name: String,

    /// Maximum number of concurrent connections to the database.
    pub max_connections: u32,
}

impl DocumentStoreOptions {
    /// Initializes a set of options from the `DATABASE_CONNECTION_STRING`, `DATABASE_NAME` and
    /// `DATABASE_MAX_CONNECTIONS` environment variables.
    pub fn from_env() -> Result<Self, String> {
        Ok(Self {
            connection_string: get_required_var::<String>("DATABASE_CONNECTION_STRING")?,
            database_name: get_required_var::<String>("DATABASE_NAME")?,
            max_connections: get_optional_var::<u32>("DATABASE_MAX_CONNECTIONS")?
                .unwrap_or(DEFAULT_MAX_CONNECTIONS),
        })
    }
}

/// Storage backed by a PostgreSQL database used as a document store.
#[derive(Clone)]
pub struct DocumentStore {
    /// Shared connection pool.  Connections are established on demand.
    pool: PgPool,
}

impl DocumentStore {
    /// Creates a new store configured with `opts` and initializes its schema.
    pub async fn connect(opts: DocumentStoreOptions) -> StorageResult<Self> {
        let options = opts
            .connection_string
            .parse::<PgConnectOptions>()
            .map_err(|e| StorageError::unknown("Invalid database connection string", e))?
            .database(&opts.database_name);
        let pool =
            PgPoolOptions::new().max_connections(opts.max_connections).connect_lazy_with(options);
        info!("Using document storage in database {}", opts.database_name);
        Self::attach(pool).await
    }

    /// Creates a new store on top of an existing `pool` and initializes its schema.
    pub(crate) async fn attach(pool: PgPool) -> StorageResult<Self> {
        sqlx::raw_sql(SCHEMA).execute(&pool).await.map_err(map_sqlx_error)?;
        Ok(Self { pool })
    }

    /// Inserts a new document for `tenant`.
    async fn insert(&self, tenant: Tenant) -> StorageResult<TenantWithCursor> {
        let query_str = "INSERT INTO tenants (document) VALUES ($1) RETURNING id";
        let row = sqlx::query(query_str)
            .bind(Json(&tenant))
            .fetch_one(&self.pool)
            .await
            .map_err(map_sqlx_error)?;
        let id: Uuid = row.try_get("id").map_err(map_sqlx_error)?;
        Ok(TenantWithCursor::new(format_id(id), tenant))
    }

    /// Fetches the document for `id`.
    async fn fetch(&self, id: &TenantId) -> StorageResult<Tenant> {
        let Some(uuid) = parse_id(id.as_str()) else {
            return Err(StorageError::not_found(id.clone()));
        };

        let query_str = "SELECT document FROM tenants WHERE id = $1";
        let maybe_row = sqlx::query(query_str)
            .bind(uuid)
            .fetch_optional(&self.pool)
            .await
            .map_err(map_sqlx_error)?;
        match maybe_row {
            None => Err(StorageError::not_found(id.clone())),
            Some(row) => {
                let document: Json<Tenant> = row.try_get("document").map_err(map_sqlx_error)?;
                Ok(document.0)
            }
        }
    }

    /// Replaces the document for `id` with `tenant`.
    async fn replace(&self, id: &TenantId, tenant: Tenant) -> StorageResult<TenantWithCursor> {
        let Some(uuid) = parse_id(id.as_str()) else {
            return Err(StorageError::not_found(id.clone()));
        };

        let query_str = "UPDATE tenants SET document = $2 WHERE id = $1";
        let done = sqlx::query(query_str)
            .bind(uuid)
            .bind(Json(&tenant))
            .execute(&self.pool)
            .await
            .map_err(map_sqlx_error)?;
        if done.rows_affected() == 0 {
            return Err(StorageError::not_found(id.clone()));
        }
        Ok(TenantWithCursor::new(id.clone(), tenant))
    }

    /// Removes the document for `id`.
    async fn remove(&self, id: &TenantId) -> StorageResult<()> {
        let Some(uuid) = parse_id(id.as_str()) else {
            return Err(StorageError::not_found(id.clone()));
        };

        let query_str = "DELETE FROM tenants WHERE id = $1";
        let done =
            sqlx::query(query_str).bind(uuid).execute(&self.pool).await.map_err(map_sqlx_error)?;
        if done.rows_affected() == 0 {
            return Err(StorageError::not_found(id.clone()));
        }
        Ok(())
    }

    /// Finds the zero-based position of `cursor` within the filtered and sorted collection.
    async fn locate(
        tx: &mut Transaction<'static, Postgres>,
        filter: &Option<Vec<Uuid>>,
        order: &str,
        cursor: &Option<Cursor>,
    ) -> StorageResult<Option<usize>> {
        let Some(uuid) = cursor.as_ref().and_then(|cursor| parse_id(cursor.as_str())) else {
            return Ok(None);
        };

        let query_str = format!(
            "SELECT pos FROM (
                SELECT id, ROW_NUMBER() OVER (ORDER BY {}) AS pos FROM tenants WHERE {}
            ) AS ranked WHERE id = $2",
            order, FILTER
        );
        let maybe_row = sqlx::query(&query_str)
            .bind(filter)
            .bind(uuid)
            .fetch_optional(&mut **tx)
            .await
            .map_err(map_sqlx_error)?;
        match maybe_row {
            None => Ok(None),
            Some(row) => {
                let pos: i64 = row.try_get("pos").map_err(map_sqlx_error)?;
                Ok(Some(to_usize(pos - 1)?))
            }
        }
    }

    /// Runs the search described by `query` within a consistent snapshot.
    async fn find(&self, query: &SearchQuery) -> StorageResult<SearchPage> {
        let keys = resolve_sorting(&query.sorting_options)?;
        let order = order_by(&keys);
        let filter = if query.ids.is_empty() {
            None
        } else {
            Some(query.ids.iter().filter_map(|id| parse_id(id.as_str())).collect::<Vec<Uuid>>())
        };

        let mut tx = self.pool.begin().await.map_err(map_sqlx_error)?;
        sqlx::query("SET TRANSACTION ISOLATION LEVEL REPEATABLE READ")
            .execute(&mut *tx)
            .await
            .map_err(map_sqlx_error)?;

        let query_str = format!("SELECT COUNT(*) AS total FROM tenants WHERE {}", FILTER);
        let row =
            sqlx::query(&query_str).bind(&filter).fetch_one(&mut *tx).await.map_err(map_sqlx_error)?;
        let total = to_usize(row.try_get::<i64, _>("total").map_err(map_sqlx_error)?)?;

        let after = Self::locate(&mut tx, &filter, &order, &query.pagination.after).await?;
        let before = Self::locate(&mut tx, &filter, &order, &query.pagination.before).await?;
        let window = Window::new(total, after, before, &query.pagination);

        let mut tenants = Vec::with_capacity(window.len());
        if window.len() > 0 {
            let query_str = format!(
                "SELECT id, document FROM tenants WHERE {} ORDER BY {} OFFSET $2 LIMIT $3",
                FILTER, order
            );
            let offset = i64::try_from(window.start)
                .map_err(|e| StorageError::unknown("Invalid offset", e))?;
            let limit =
                i64::try_from(window.len()).map_err(|e| StorageError::unknown("Invalid limit", e))?;
            let mut rows =
                sqlx::query(&query_str).bind(&filter).bind(offset).bind(limit).fetch(&mut *tx);
            while let Some(row) = rows.try_next().await.map_err(map_sqlx_error)? {
                let id: Uuid = row.try_get("id").map_err(map_sqlx_error)?;
                let document: Json<Tenant> = row.try_get("document").map_err(map_sqlx_error)?;
                tenants.push(TenantWithCursor::new(format_id(id), document.0));
            }
        }

        tx.commit().await.map_err(map_sqlx_error)?;

        Ok(SearchPage {
            has_previous_page: window.has_previous_page(),
            has_next_page: window.has_next_page(),
            total_count: window.total as u64,
            tenants,
        })
    }
}

#[async_trait]
impl TenantStore for DocumentStore {
    async fn create(&self, ctx: &Context, tenant: Tenant) -> StorageResult<TenantWithCursor> {
        ctx.run(self.insert(tenant)).await?
    }

    async fn read(&self, ctx: &Context, id: &TenantId) -> StorageResult<Tenant> {
        ctx.run(self.fetch(id)).await?
    }

    async fn update(
        &self,
        ctx: &Context,
        id: &TenantId,
        tenant: Tenant,
    ) -> StorageResult<TenantWithCursor> {
        ctx.run(self.replace(id, tenant)).await?
    }

    async fn delete(&self, ctx: &Context, id: &TenantId) -> StorageResult<()> {
        ctx.run(self.remove(id)).await?
    }

    async fn search(&self, ctx: &Context, query: &SearchQuery) -> StorageResult<SearchPage> {
        ctx.run(self.find(query)).await?
    }
}

/// Test utilities for the document storage.
#[cfg(test)]
pub(crate) mod testutils {
    use super::*;

    /// Creates a new store connected to the test database.
    ///
    /// The connection is configured to use the `pg_temp` schema so that the collection created
    /// by each test is private to it and vanishes at disconnection time.  For this to work, the
    /// pool must keep a single connection open at all times.
    pub(crate) async fn setup() -> DocumentStore {
        let _can_fail = env_logger::builder().is_test(true).try_init();

        let connection_string =
            get_required_var::<String>("TEST_DATABASE_CONNECTION_STRING").unwrap();
        let options = connection_string.parse::<PgConnectOptions>().unwrap();
        let pool = PgPoolOptions::new()
            .min_connections(1)
            .max_connections(1)
            .after_connect(|conn, _meta| {
                Box::pin(async move {
                    sqlx::query("SET search_path TO pg_temp").execute(&mut *conn).await?;
                    Ok(())
                })
            })
            .connect_lazy_with(options);
        DocumentStore::attach(pool).await.unwrap()
    }
}
