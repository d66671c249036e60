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

//! API to get the latest version of a key.

use crate::driver::Driver;
use crate::model::Key;
use apiseed_core::rest::{EmptyBody, RestError};
use axum::Json;
use axum::extract::{Path, State};
use axum::response::IntoResponse;

/// API handler.
pub(crate) async fn handler(
    State(driver): State<Driver>,
    Path(key): Path<Key>,
    _: EmptyBody,
) -> Result<impl IntoResponse, RestError> {
    let entry = driver.get_key(&key)?;
    Ok(Json(entry))
}

#[cfg(test)]
mod tests {
    use crate::model::*;
    use crate::rest::testutils::*;
    use apiseed_core::rest::testutils::*;
    use axum::http;
    use serde_json::json;

    fn route(key: &str) -> (http::Method, String) {
        (http::Method::GET, format!("/keys/{}", key))
    }

    #[tokio::test]
    async fn test_ok() {
        let context = TestContext::setup();

        context.set_key("first", json!("value"), 1);
        context.set_key("first", json!(["value", 2]), 2);
        context.set_key("second", json!("value"), 1);

        let response = OneShotBuilder::new(context.into_app(), route("first"))
            .send_empty()
            .await
            .expect_json::<Entry>()
            .await;
        let exp_response = Entry::new(json!(["value", 2]), Version::from_u32(2));
        assert_eq!(exp_response, response);
    }

    #[tokio::test]
    async fn test_missing() {
        let context = TestContext::setup();

        context.set_key("first", json!("value"), 1);

        OneShotBuilder::new(context.into_app(), route("second"))
            .send_empty()
            .await
            .expect_status(http::StatusCode::NOT_FOUND)
            .expect_error("not found")
            .await;
    }

    test_payload_must_be_empty!(TestContext::setup().into_app(), route("irrelevant"));
}
