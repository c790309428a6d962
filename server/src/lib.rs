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

//! Tenant management service.

// Keep these in sync with other top-level files.
#![warn(anonymous_parameters, bad_style, clippy::missing_docs_in_private_items, missing_docs)]
#![warn(unused, unused_extern_crates, unused_import_braces, unused_qualifications)]
#![warn(unsafe_code)]

use crate::config::Config;
use crate::db::{DocumentStore, MemoryStore, TenantStore};
use crate::driver::Driver;
use crate::endpoint::Endpoints;
use crate::rpc::Server;
use log::info;
use std::error::Error;
use std::sync::Arc;
use tenancy_authz::JwksVerifier;

pub mod config;
pub mod db;
pub mod driver;
pub mod endpoint;
pub mod errors;
pub mod model;
pub mod rpc;
pub mod validation;
pub mod version;

/// Instantiates all resources needed to serve the service as described by `config`.
///
/// The returned server has not bound its listeners yet.
pub async fn assemble(config: Config) -> Result<Server, Box<dyn Error>> {
    let store: Arc<dyn TenantStore + Send + Sync> = match config.database {
        Some(opts) => Arc::new(DocumentStore::connect(opts).await?),
        None => {
            info!("Using in-memory storage; tenants will be lost on exit");
            Arc::new(MemoryStore::default())
        }
    };

    let mut endpoints = Endpoints::new(Driver::new(store));
    if let Some(opts) = config.jwks {
        info!("Authorizing requests against the keys published at {}", opts.url);
        endpoints = endpoints.authorized(Arc::new(JwksVerifier::new(opts)));
    }

    Ok(Server::new(config.server, endpoints))
}
