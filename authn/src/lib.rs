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

//! Request guards for services that identify callers by API key and by username.
//!
//! Guards are pure checks over the metadata of a request (its headers and query string) that
//! either accept the request on behalf of a principal or reject it with an HTTP error.  Services
//! compose guards into a `Guards` pipeline and attach it to their routes as middleware:
//!
//! ```rust
//! use apiseed_authn::rest::{ApiKeyGuard, Guards, UserGuard};
//! use axum::Router;
//! use axum::routing::get;
//!
//! let api_keys = Guards::new().with(ApiKeyGuard::new(vec!["secret".to_owned()], "realm"));
//! let users = Guards::new().with(UserGuard::new(vec![], true, "realm"));
//!
//! let app: Router = Router::new()
//!     .route("/whoami", get(|| async { "me" }).route_layer(users.layer()))
//!     .route_layer(api_keys.layer());
//! ```
//!
//! Handlers obtain the accepted principals from the `Principals` request extension.

// Keep these in sync with other top-level files.
#![warn(anonymous_parameters, bad_style, clippy::missing_docs_in_private_items, missing_docs)]
#![warn(unused, unused_extern_crates, unused_import_braces, unused_qualifications)]
#![warn(unsafe_code)]

pub mod rest;
