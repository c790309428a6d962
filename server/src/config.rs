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

//! Service configuration.

use crate::db::DocumentStoreOptions;
use crate::rpc::ServerOptions;
use tenancy_authz::JwksVerifierOptions;
use tenancy_core::env::get_optional_var;

/// Configuration of the whole service as read from the environment.
#[derive(Debug)]
pub struct Config {
    /// Listening configuration of the RPC server.
    pub server: ServerOptions,

    /// Configuration of the document database, or none to keep tenants in memory.
    pub database: Option<DocumentStoreOptions>,

    /// Configuration of the token verifier, or none to accept unauthenticated callers.
    pub jwks: Option<JwksVerifierOptions>,
}

/// Reads the raw value of the variable `name`, preferring the value of `override_name`.
fn get_raw_with_override(name: &str, override_name: &str) -> Result<Option<String>, String> {
    match get_optional_var::<String>(override_name)? {
        Some(value) => Ok(Some(value)),
        None => get_optional_var::<String>(name),
    }
}

impl Config {
    /// Creates a configuration from the environment.
    ///
    /// Host and port values are not validated here: the server reports problems with them when
    /// it starts.
    pub fn from_env() -> Result<Self, String> {
        let server = ServerOptions {
            host: get_raw_with_override("HOST", "GRPC_HOST")?,
            port: get_raw_with_override("PORT", "GRPC_PORT")?,
            health_host: get_optional_var::<String>("HTTPS_HOST")?,
            health_port: get_optional_var::<String>("HTTPS_PORT")?,
        };

        let database = match get_optional_var::<String>("DATABASE_CONNECTION_STRING")? {
            Some(_) => Some(DocumentStoreOptions::from_env()?),
            None => None,
        };

        let jwks = match get_optional_var::<String>("JWKS_URL")? {
            Some(_) => Some(JwksVerifierOptions::from_env()?),
            None => None,
        };

        Ok(Self { server, database, jwks })
    }
}
