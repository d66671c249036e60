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

//! Generic business logic for any service.
//!
//! Every service should implement its own `Driver` type.  In most cases, this type will wrap the
//! shared `JsonDb` of the service, and as such the definition will look like this:
//!
//! ```rust
//! use apiseed_core::jsondb::{EmptyModel, JsonDb};
//! use std::sync::{Arc, Mutex};
//!
//! #[derive(Clone)]
//! pub(crate) struct Driver {
//!     /// The database that the driver uses for persistence.
//!     db: Arc<Mutex<JsonDb<EmptyModel>>>,
//!
//!     // ... other fields here ...
//! }
//! ```
//!
//! Every operation implemented in the `Driver` should consume `self` and hold the database lock
//! for the whole duration of the operation, so that a read-then-write sequence issued by a single
//! request is never interleaved with another request.

use crate::jsondb::JsonDbError;

/// Business logic errors.  These errors encompass backend and logical errors.
#[derive(Debug, PartialEq, thiserror::Error)]
pub enum DriverError {
    /// Catch-all error type for unexpected database errors.
    #[error("{0}")]
    BackendError(String),

    /// Indicates an error in the input data.
    #[error("{0}")]
    InvalidInput(String),

    /// Indicates that a requested entry does not exist.
    #[error("{0}")]
    NotFound(String),
}

impl From<JsonDbError> for DriverError {
    fn from(e: JsonDbError) -> Self {
        match e {
            JsonDbError::InvalidContent(_) => DriverError::InvalidInput(e.to_string()),
            JsonDbError::InvalidJson(_)
            | JsonDbError::Io { .. }
            | JsonDbError::NoFilename
            | JsonDbError::NotAFile(_) => DriverError::BackendError(e.to_string()),
        }
    }
}

/// Result type for this module.
pub type DriverResult<T> = Result<T, DriverError>;
