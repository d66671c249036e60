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

//! Guard that identifies the user a request acts on behalf of.

use crate::rest::{Guard, Principal, get_basic_auth, has_authorization};
use apiseed_core::rest::{RestError, RestResult};
use http::request::Parts;
use std::collections::HashSet;

/// Identity of requests accepted without a username.
pub const ANONYMOUS_PRINCIPAL: &str = "anonymous";

/// Guard that takes the username from the HTTP basic authentication credentials.
///
/// Passwords are not verified: the username only tells on behalf of which user the request acts.
/// Requests without credentials are treated as having an empty username.
#[derive(Clone, Debug)]
pub struct UserGuard {
    /// The users allowed to issue requests.  Empty means any user.
    authorized_users: HashSet<String>,

    /// Whether requests with an empty username are accepted when any user is allowed.
    allow_anonymous: bool,

    /// Authentication realm to report on rejections.
    realm: &'static str,
}

impl UserGuard {
    /// Name of this guard in the `Principals` of a request.
    pub const NAME: &'static str = "username";

    /// Creates a new guard that accepts the `authorized_users`.
    pub fn new(authorized_users: Vec<String>, allow_anonymous: bool, realm: &'static str) -> Self {
        Self { authorized_users: authorized_users.into_iter().collect(), allow_anonymous, realm }
    }

    /// Constructs the error returned on rejections.
    fn unauthorized(&self, message: &str) -> RestError {
        RestError::Unauthorized { scheme: "Basic", realm: self.realm, message: message.to_owned() }
    }
}

impl Guard for UserGuard {
    fn name(&self) -> &'static str {
        Self::NAME
    }

    fn check(&self, parts: &Parts) -> RestResult<Principal> {
        let username = if has_authorization(&parts.headers, self.realm)? {
            get_basic_auth(&parts.headers, self.realm)?.0
        } else {
            String::new()
        };

        if self.authorized_users.is_empty() {
            if !username.is_empty() {
                Ok(Principal::new(username))
            } else if self.allow_anonymous {
                Ok(Principal::new(ANONYMOUS_PRINCIPAL))
            } else {
                Err(self.unauthorized("invalid user name"))
            }
        } else if self.authorized_users.contains(&username) {
            Ok(Principal::new(username))
        } else {
            Err(self.unauthorized("user is not authorized"))
        }
    }
}
