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

//! Endpoint wrapper that enforces bearer token authorization.

use crate::{AuthzError, BearerToken, TokenVerifier};
use log::warn;
use std::sync::Arc;
use tenancy_core::context::Context;
use tenancy_core::endpoint::{Endpoint, TransportError, endpoint};

/// Wraps `next` so that it only runs after the bearer token in the request context has been
/// verified by `verifier`.
///
/// On success, the claims of the token are attached to the context as a `ParsedToken` before
/// invoking `next`.  On failure, `next` is not called and the verification error is returned
/// through the transport channel.
///
/// Requests without a context are forwarded untouched so that the wrapped endpoint can reject
/// them with its own argument checks.
pub fn authorize<Req, Resp>(
    verifier: Arc<dyn TokenVerifier + Send + Sync>,
    next: Endpoint<Req, Resp>,
) -> Endpoint<Req, Resp>
where
    Req: Send + 'static,
    Resp: Send + 'static,
{
    endpoint(move |ctx: Option<Context>, req: Option<Req>| {
        let verifier = verifier.clone();
        let next = next.clone();
        async move {
            let Some(mut ctx) = ctx else {
                return next(None, req).await;
            };

            let token = match ctx.get::<BearerToken>() {
                Some(token) => token.clone(),
                None => {
                    warn!("Rejecting request without bearer token");
                    return Err(TransportError::Unauthorized(Box::from(AuthzError::MissingToken)));
                }
            };

            match verifier.verify(token.as_str()).await {
                Ok(parsed) => {
                    ctx.insert(parsed);
                    next(Some(ctx), req).await
                }
                Err(e) => {
                    warn!("Rejecting request with unverifiable token: {}", e);
                    Err(TransportError::Unauthorized(Box::from(e)))
                }
            }
        }
    })
}
