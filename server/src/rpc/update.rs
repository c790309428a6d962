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

//! RPC to update a tenant.

use crate::rpc::messages::{UpdateRequestMessage, UpdateResponseMessage};
use crate::rpc::{AppState, call, codec};
use axum::Json;
use axum::extract::State;
use http::HeaderMap;
use tenancy_core::rest::RestResult;

/// RPC handler.
pub(crate) async fn handler(
    State(state): State<AppState>,
    headers: HeaderMap,
    Json(message): Json<Option<UpdateRequestMessage>>,
) -> RestResult<Json<UpdateResponseMessage>> {
    call(
        &state.endpoints,
        &state.endpoints.update,
        &headers,
        message,
        codec::decode_update_request,
        codec::encode_update_response,
    )
    .await
}

#[cfg(test)]
mod tests {
    use crate::model::*;
    use crate::rpc::messages::*;
    use crate::rpc::testutils::*;
    use tenancy_core::rest::testutils::*;

    #[tokio::test]
    async fn test_ok() {
        let context = TestContext::setup();
        let id = context.put_tenant("before").await;

        let request = UpdateRequestMessage {
            tenant_id: id.to_string(),
            tenant: Some(TenantMessage { name: "after".to_owned() }),
        };
        let response = OneShotBuilder::new(context.app(), route("Update"))
            .send_json(request)
            .await
            .expect_json::<UpdateResponseMessage>()
            .await;
        assert_eq!(UpdateResponseMessage::default(), response);

        assert_eq!(Some(Tenant::new("after".to_owned())), context.get_tenant(id.as_str()).await);
    }

    #[tokio::test]
    async fn test_not_found() {
        let context = TestContext::setup();

        let request = UpdateRequestMessage {
            tenant_id: "nonexistent".to_owned(),
            tenant: Some(TenantMessage { name: "after".to_owned() }),
        };
        let response = OneShotBuilder::new(context.app(), route("Update"))
            .send_json(request)
            .await
            .expect_json::<UpdateResponseMessage>()
            .await;
        assert_eq!(ErrorCode::TenantNotFound, response.error);
        assert!(response.error_message.contains("nonexistent"));
    }

    #[tokio::test]
    async fn test_invalid() {
        let context = TestContext::setup();
        let id = context.put_tenant("before").await;

        let request = UpdateRequestMessage { tenant_id: id.to_string(), tenant: None };
        let response = OneShotBuilder::new(context.app(), route("Update"))
            .send_json(request)
            .await
            .expect_json::<UpdateResponseMessage>()
            .await;
        assert_eq!(ErrorCode::BadRequest, response.error);
        assert!(response.error_message.contains("tenant.name"));

        assert_eq!(Some(Tenant::new("before".to_owned())), context.get_tenant(id.as_str()).await);
    }

    test_payload_must_be_json!(TestContext::setup().into_app(), route("Update"));
}
