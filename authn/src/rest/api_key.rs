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

//! Guard that requires a known API key.

use crate::rest::{Guard, Principal};
use apiseed_core::rest::{RestError, RestResult, get_unique_header};
use http::request::Parts;
use std::collections::HashSet;

/// Name of the query parameter that carries the API key.
pub const API_KEY_QUERY: &str = "api-key";

/// Name of the header that carries the API key.
pub const API_KEY_HEADER: &str = "x-api-key";

/// Identity of requests accepted when no API keys are configured.
pub const DEFAULT_PRINCIPAL: &str = "default";

/// Extracts the API key passed in the query string of the request, if any.
fn query_key(parts: &Parts) -> Option<String> {
    let query = parts.uri.query()?;
    let pairs = serde_urlencoded::from_str::<Vec<(String, String)>>(query).ok()?;
    pairs.into_iter().find(|(name, _)| name == API_KEY_QUERY).map(|(_, value)| value)
}

/// Extracts the API key passed in the headers of the request, if any.
fn header_key(parts: &Parts) -> Option<&str> {
    match get_unique_header(&parts.headers, API_KEY_HEADER) {
        Ok(Some(value)) => value.to_str().ok(),
        _ => None,
    }
}

/// Guard that accepts requests carrying one of the allowed API keys.
///
/// The key can be passed in the `api-key` query parameter or in the `x-api-key` header.  If no
/// keys are allowed, all requests are accepted on behalf of the `default` principal.
#[derive(Clone, Debug)]
pub struct ApiKeyGuard {
    /// The allowed keys.
    keys: HashSet<String>,

    /// Authentication realm to report on rejections.
    realm: &'static str,
}

impl ApiKeyGuard {
    /// Name of this guard in the `Principals` of a request.
    pub const NAME: &'static str = "api_key";

    /// Creates a new guard that allows the given `keys`.
    pub fn new(keys: Vec<String>, realm: &'static str) -> Self {
        Self { keys: keys.into_iter().collect(), realm }
    }

    /// Returns true if `candidate` is one of the allowed keys.
    fn is_allowed(&self, candidate: Option<&str>) -> bool {
        candidate.map(|key| self.keys.contains(key)).unwrap_or(false)
    }
}

impl Guard for ApiKeyGuard {
    fn name(&self) -> &'static str {
        Self::NAME
    }

    fn check(&self, parts: &Parts) -> RestResult<Principal> {
        if self.keys.is_empty() {
            return Ok(Principal::new(DEFAULT_PRINCIPAL));
        }

        let from_query = query_key(parts);
        if self.is_allowed(from_query.as_deref()) {
            return Ok(Principal::new(from_query.unwrap_or_default()));
        }

        let from_header = header_key(parts);
        if self.is_allowed(from_header) {
            return Ok(Principal::new(from_header.unwrap_or_default()));
        }

        Err(RestError::Unauthorized {
            scheme: "ApiKey",
            realm: self.realm,
            message: "Invalid or missing API Key".to_owned(),
        })
    }
}
