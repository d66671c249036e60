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

//! Entry point to the REST server.

use crate::driver::Driver;
use apiseed_authn::rest::Guards;
use axum::Router;

mod key_delete;
mod key_get;
mod key_post;
mod keys_get;
mod root_get;
#[cfg(test)]
mod testutils;
mod whoami_get;

/// Authentication realm reported by the service.
pub(crate) const REALM: &str = "apiseed";

/// Creates the router for the application.
///
/// All routes are protected by the `api_keys` guards.  Routes that act on behalf of a user are
/// additionally protected by the `users` guards.
pub(crate) fn app(driver: Driver, api_keys: Guards, users: Guards) -> Router {
    use axum::routing::{get, post};
    Router::new()
        .route("/", get(root_get::handler))
        .route("/keys", get(keys_get::handler))
        .route(
            "/keys/:key",
            get(key_get::handler).merge(
                post(key_post::handler)
                    .delete(key_delete::handler)
                    .route_layer(users.clone().layer()),
            ),
        )
        .route("/whoami", get(whoami_get::handler).route_layer(users.layer()))
        .route_layer(api_keys.layer())
        .with_state(driver)
}

#[cfg(test)]
mod tests {
    use super::testutils::*;
    use crate::model::*;
    use apiseed_core::rest::testutils::*;
    use axum::http;
    use serde_json::json;

    #[tokio::test]
    async fn test_e2e_without_api_keys() {
        let context = TestContextBuilder::new().build();

        let entry = OneShotBuilder::new(context.app(), (http::Method::POST, "/keys/first"))
            .send_json(json!({"some": "data"}))
            .await
            .expect_status(http::StatusCode::CREATED)
            .expect_json::<Entry>()
            .await;
        assert_eq!(Entry::new(json!({"some": "data"}), Version::initial()), entry);

        let entry = OneShotBuilder::new(context.app(), (http::Method::GET, "/keys/first"))
            .send_empty()
            .await
            .expect_json::<Entry>()
            .await;
        assert_eq!(Entry::new(json!({"some": "data"}), Version::initial()), entry);
    }

    #[tokio::test]
    async fn test_e2e_wrong_api_key() {
        let context = TestContextBuilder::new().with_api_keys(&["the-key"]).build();

        for route in [
            (http::Method::GET, "/"),
            (http::Method::GET, "/keys"),
            (http::Method::GET, "/keys/first"),
            (http::Method::DELETE, "/keys/first"),
            (http::Method::GET, "/whoami"),
        ] {
            OneShotBuilder::new(context.app(), route)
                .with_header("x-api-key", "other-key")
                .send_empty()
                .await
                .expect_status(http::StatusCode::UNAUTHORIZED)
                .expect_error("Invalid or missing API Key")
                .await;
        }

        OneShotBuilder::new(context.app(), (http::Method::POST, "/keys/first"))
            .with_query([("api-key", "other-key")])
            .send_json(json!(1))
            .await
            .expect_status(http::StatusCode::UNAUTHORIZED)
            .expect_error("Invalid or missing API Key")
            .await;
        assert_eq!(None, context.get_key("first"));
    }

    #[tokio::test]
    async fn test_e2e_good_api_key() {
        let context = TestContextBuilder::new().with_api_keys(&["k1", "k2"]).build();

        OneShotBuilder::new(context.app(), (http::Method::POST, "/keys/first"))
            .with_query([("api-key", "k2")])
            .send_json(json!("value"))
            .await
            .expect_status(http::StatusCode::CREATED)
            .expect_json::<Entry>()
            .await;

        let keys = OneShotBuilder::new(context.app(), (http::Method::GET, "/keys"))
            .with_header("x-api-key", "k1")
            .send_empty()
            .await
            .expect_json::<Vec<String>>()
            .await;
        assert_eq!(vec!["first".to_owned()], keys);
    }

    #[tokio::test]
    async fn test_api_key_checked_before_user() {
        let context =
            TestContextBuilder::new().with_api_keys(&["k"]).with_anonymous(false).build();

        OneShotBuilder::new(context.app(), (http::Method::GET, "/whoami"))
            .send_empty()
            .await
            .expect_status(http::StatusCode::UNAUTHORIZED)
            .expect_error("API Key")
            .await;

        OneShotBuilder::new(context.app(), (http::Method::GET, "/whoami"))
            .with_header("x-api-key", "k")
            .send_empty()
            .await
            .expect_status(http::StatusCode::UNAUTHORIZED)
            .expect_error("invalid user name")
            .await;
    }

    #[tokio::test]
    async fn test_unknown_route() {
        let context = TestContextBuilder::new().build();

        OneShotBuilder::new(context.app(), (http::Method::GET, "/missing"))
            .send_empty()
            .await
            .expect_status(http::StatusCode::NOT_FOUND)
            .expect_empty()
            .await;
    }
}
