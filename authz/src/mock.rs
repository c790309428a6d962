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

//! Token verifier backed by an in-memory map for testing purposes.

use crate::{AuthzError, AuthzResult, ParsedToken, TokenVerifier};
use async_trait::async_trait;
use std::{collections::HashMap, sync::Arc};

/// Token verifier that accepts a fixed set of opaque tokens.
#[derive(Clone)]
pub struct MockTokenVerifier {
    /// Mapping of valid tokens to the email addresses they carry.
    data: Arc<HashMap<String, String>>,
}

impl MockTokenVerifier {
    /// Creates a new mock verifier based on a list of `(token, email)` pairs.
    pub fn new(raw_data: &[(&'static str, &'static str)]) -> Self {
        let data = raw_data
            .iter()
            .map(|(token, email)| ((*token).to_owned(), (*email).to_owned()))
            .collect::<HashMap<String, String>>();
        Self { data: Arc::from(data) }
    }
}

#[async_trait]
impl TokenVerifier for MockTokenVerifier {
    async fn verify(&self, token: &str) -> AuthzResult<ParsedToken> {
        match self.data.get(token) {
            Some(email) => Ok(ParsedToken { email: email.clone() }),
            None => Err(AuthzError::InvalidToken(format!("Unknown token '{}'", token))),
        }
    }
}
