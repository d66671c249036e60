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

//! API to create or update a key.

use crate::driver::Driver;
use crate::model::{Key, Version};
use apiseed_core::rest::RestError;
use axum::extract::{Path, State};
use axum::response::IntoResponse;
use axum::{Json, http};
use serde_json::Value;

/// API handler.
pub(crate) async fn handler(
    State(driver): State<Driver>,
    Path(key): Path<Key>,
    Json(value): Json<Value>,
) -> Result<(http::StatusCode, impl IntoResponse), RestError> {
    let entry = driver.set_key(&key, value)?;
    let code = if *entry.version() == Version::initial() {
        http::StatusCode::CREATED
    } else {
        http::StatusCode::OK
    };
    Ok((code, Json(entry)))
}
