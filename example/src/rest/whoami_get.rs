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

//! API to get the user on behalf of which requests act.

use apiseed_authn::rest::{Principals, UserGuard};
use apiseed_core::rest::{EmptyBody, RestError};
use axum::response::IntoResponse;
use axum::{Extension, Json};
use serde::{Deserialize, Serialize};

/// Message returned by the server with the identity of the caller.
#[derive(Debug, Deserialize, PartialEq, Serialize)]
pub(crate) struct WhoamiResponse {
    /// Name of the user, or `anonymous`.
    pub(crate) username: String,
}

/// API handler.
pub(crate) async fn handler(
    Extension(principals): Extension<Principals>,
    _: EmptyBody,
) -> Result<impl IntoResponse, RestError> {
    let username = match principals.get(UserGuard::NAME) {
        Some(principal) => principal.as_str().to_owned(),
        None => return Err(RestError::InternalError("User guard not configured".to_owned())),
    };
    Ok(Json(WhoamiResponse { username }))
}
