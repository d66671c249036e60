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

//! Scaffolding to build small HTTP APIs.
//!
//! Services built on top of this crate are expected to follow a layered architecture and to
//! define these modules themselves:
//!
//! 1.  `model`: High-level data types that represent concepts in the domain of the application.
//!     There should be no logic in here.
//!
//! 1.  `db`: The persistence layer.  Services back their state with a `jsondb::JsonModel`
//!     implementation wrapped in a `jsondb::JsonDb`, which mirrors the in-memory state to a
//!     single JSON file.
//!
//! 1.  `driver`: The business logic layer.  Services provide their own `Driver` type to
//!     encapsulate all of the in-memory state required by the app.
//!
//! 1.  `rest`: The HTTP layer.  Services provide their own `axum::Router` and hand it to a
//!     `server::Server`, which takes care of mounting it and of running lifecycle hooks.
//!
//! 1.  `main`: The app launcher.  Its sole purpose is to gather configuration via the `config`
//!     module, to install the `logger`, and to start the server.
//!
//! There are result and error types in every layer, such as `DriverResult` and `DriverError`.
//! Errors can transparently float to the top of the app using the `?` operator, being translated
//! to HTTP status codes once returned from the REST layer.

// Keep these in sync with other top-level files.
#![warn(anonymous_parameters, bad_style, clippy::missing_docs_in_private_items, missing_docs)]
#![warn(unused, unused_extern_crates, unused_import_braces, unused_qualifications)]
#![warn(unsafe_code)]

pub mod clocks;
pub mod config;
pub mod driver;
pub mod jsondb;
pub mod logger;
pub mod model;
pub mod rest;
pub mod server;
