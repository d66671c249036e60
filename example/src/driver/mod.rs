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

//! Business logic for the service.

use crate::db::KeyValueDb;
use apiseed_core::driver::{DriverError, DriverResult};
use std::sync::{Arc, Mutex, MutexGuard};

mod key;
mod keys;
#[cfg(test)]
mod testutils;

/// Business logic.
///
/// The public operations exposed by the driver are all "one shot": they hold the database lock
/// for their whole duration, so it's incorrect for the caller to use two separate calls to
/// implement a single logical operation.  For this reason, these operations consume the driver in
/// an attempt to minimize the possibility of executing two operations.
#[derive(Clone)]
pub(crate) struct Driver {
    /// The database that the driver uses for persistence.
    db: Arc<Mutex<KeyValueDb>>,
}

impl Driver {
    /// Creates a new driver backed by the given injected components.
    pub(crate) fn new(db: Arc<Mutex<KeyValueDb>>) -> Self {
        Self { db }
    }

    /// Acquires exclusive access to the database.
    fn lock(&self) -> DriverResult<MutexGuard<'_, KeyValueDb>> {
        self.db
            .lock()
            .map_err(|e| DriverError::BackendError(format!("Database lock poisoned: {}", e)))
    }

    /// Writes the database to its backing file, if any.
    pub(crate) fn save(self) -> DriverResult<()> {
        let db = self.lock()?;
        if db.filename().is_some() {
            db.save()?;
        }
        Ok(())
    }
}
