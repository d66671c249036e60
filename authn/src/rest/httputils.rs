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

//! Utilities to deal with HTTP authorization.

use apiseed_core::rest::{RestError, RestResult, get_unique_header};
use base64::Engine;
use base64::engine::general_purpose;
use http::header::HeaderMap;

/// Validates that the `Authorization` HTTP header contains a textual payload for the
/// `exp_scheme` scheme and returns it.
fn get_authorization_header<'a>(
    headers: &'a HeaderMap,
    exp_scheme: &'static str,
    exp_realm: &'static str,
) -> RestResult<&'a str> {
    let unauthorized =
        |message: String| RestError::Unauthorized { scheme: exp_scheme, realm: exp_realm, message };

    let authz = match get_unique_header(headers, &http::header::AUTHORIZATION) {
        Ok(Some(value)) => value,
        Ok(None) => return Err(unauthorized("Missing Authorization header".to_owned())),
        Err(e) => return Err(unauthorized(e.to_string())),
    };

    let authz = authz
        .to_str()
        .map_err(|e| unauthorized(format!("Bad encoding in Authorization header: {}", e)))?;

    let (scheme, payload) = match authz.split_once(' ') {
        Some((scheme, _)) if scheme.is_empty() => {
            return Err(unauthorized("Bad Authorization header: missing scheme".to_owned()));
        }
        Some((scheme, payload)) => (scheme, payload),
        None if authz.is_empty() => {
            return Err(unauthorized("Bad Authorization header: missing scheme".to_owned()));
        }
        None => return Err(unauthorized("Bad Authorization header: missing payload".to_owned())),
    };

    if !scheme.eq_ignore_ascii_case(exp_scheme) {
        return Err(unauthorized("Unsupported scheme".to_owned()));
    }

    Ok(payload)
}

/// Checks if the request carries an `Authorization` header at all.
pub fn has_authorization(headers: &HeaderMap, exp_realm: &'static str) -> RestResult<bool> {
    match get_unique_header(headers, &http::header::AUTHORIZATION) {
        Ok(value) => Ok(value.is_some()),
        Err(e) => Err(RestError::Unauthorized {
            scheme: "Basic",
            realm: exp_realm,
            message: e.to_string(),
        }),
    }
}

/// Assumes that the `headers` contain basic authentication credentials and extracts the
/// username and password from them.
///
/// The username may be empty, as happens when a client sends credentials like `:password`.
pub fn get_basic_auth(
    headers: &HeaderMap,
    exp_realm: &'static str,
) -> RestResult<(String, String)> {
    let unauthorized =
        |message: String| RestError::Unauthorized { scheme: "Basic", realm: exp_realm, message };

    let base64_payload = get_authorization_header(headers, "Basic", exp_realm)?;

    let payload = general_purpose::STANDARD
        .decode(base64_payload)
        .map_err(|e| unauthorized(format!("Bad base64 encoding in payload: {}", e)))?;

    // Both the username and the password have to be strings, so it is easier to convert the
    // payload first in one go instead of doing two conversion after splitting the bytes.
    let payload = String::from_utf8(payload)
        .map_err(|e| unauthorized(format!("Bad UTF-8 encoding in payload: {}", e)))?;

    match payload.split_once(':') {
        Some((username, password)) => Ok((username.to_owned(), password.to_owned())),
        None => Err(unauthorized("Bad content".to_owned())),
    }
}
