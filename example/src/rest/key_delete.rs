// apiseed
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

//! API to delete a key.

use crate::driver::Driver;
use crate::model::Key;
use apiseed_core::rest::{EmptyBody, RestError};
use axum::extract::{Path, State};
use axum::http;
use axum::response::IntoResponse;

/// API handler.
pub(crate) async fn handler(
    State(driver): State<Driver>,
    Path(key): Path<Key>,
    _: EmptyBody,
) -> Result<impl IntoResponse, RestError> {
    driver.delete_key(&key)?;

    Ok(http::StatusCode::NO_CONTENT)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rest::testutils::*;
    use apiseed_core::rest::testutils::*;
    use serde_json::json;

    fn route(key: &str) -> (http::Method, String) {
        (http::Method::DELETE, format!("/keys/{}", key))
    }

    #[tokio::test]
    async fn test_ok() {
        let context = TestContext::setup();

        context.set_key("first", json!("value"), 1);
        context.set_key("first", json!("value2"), 2);
        context.set_key("second", json!("value"), 1);

        OneShotBuilder::new(context.app(), route("first"))
            .send_empty()
            .await
            .expect_status(http::StatusCode::NO_CONTENT)
            .expect_empty()
            .await;

        assert!(!context.has_key("first"));
        assert!(context.has_key("second"));
    }

    #[tokio::test]
    async fn test_missing() {
        let context = TestContext::setup();

        context.set_key("first", json!("value"), 1);

        OneShotBuilder::new(context.app(), route("second"))
            .send_empty()
            .await
            .expect_status(http::StatusCode::NOT_FOUND)
            .expect_error("not found")
            .await;
    }

    #[tokio::test]
    async fn test_unauthorized_user() {
        let context = TestContextBuilder::new().with_authorized_users(&["alice"]).build();

        context.set_key("first", json!("value"), 1);

        OneShotBuilder::new(context.app(), route("first"))
            .with_basic_auth("mallory", "")
            .send_empty()
            .await
            .expect_status(http::StatusCode::UNAUTHORIZED)
            .expect_error("user is not authorized")
            .await;
        assert!(context.has_key("first"));
    }

    test_payload_must_be_empty!(TestContext::setup().into_app(), route("irrelevant"));
}
