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

//! Operations on one key.

use crate::driver::Driver;
use crate::model::*;
use apiseed_core::driver::{DriverError, DriverResult};
use serde_json::Value;

impl Driver {
    /// Deletes an existing `key`.
    pub(crate) fn delete_key(self, key: &Key) -> DriverResult<()> {
        let mut db = self.lock()?;
        if db.model().get_key(key).is_none() {
            return Err(DriverError::NotFound(format!("Key {} not found", key)));
        }
        db.mutate(|model| model.delete_key(key))?;
        Ok(())
    }

    /// Gets the current value of the given `key`.
    pub(crate) fn get_key(self, key: &Key) -> DriverResult<Entry> {
        let db = self.lock()?;
        match db.model().get_key(key) {
            Some(entry) => Ok(entry.clone()),
            None => Err(DriverError::NotFound(format!("Key {} not found", key))),
        }
    }

    /// Sets `key` to `value`, incrementing its version.
    pub(crate) fn set_key(self, key: &Key, value: Value) -> DriverResult<Entry> {
        let mut db = self.lock()?;
        let version = db
            .model()
            .get_key_version(key)
            .map(Version::next)
            .unwrap_or_else(Version::initial);
        let entry = Entry::new(value, version);
        db.mutate(|model| model.set_key(key.clone(), entry.clone()))?;
        Ok(entry)
    }
}
