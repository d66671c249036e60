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

//! API to check that the service is alive.

use apiseed_core::rest::{EmptyBody, RestError};
use axum::Json;
use axum::response::IntoResponse;
use serde::{Deserialize, Serialize};

/// Message returned by the server to report its status.
#[derive(Debug, Deserialize, PartialEq, Serialize)]
pub(crate) struct StatusResponse {
    /// Overall status of the service.
    pub(crate) status: String,

    /// Greeting.
    pub(crate) message: String,
}

/// API handler.
pub(crate) async fn handler(_: EmptyBody) -> Result<impl IntoResponse, RestError> {
    Ok(Json(StatusResponse { status: "OK".to_owned(), message: "Hello world!".to_owned() }))
}
