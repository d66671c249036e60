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

//! High-level data types.

use apiseed_core::model::{ModelError, ModelResult};
use derive_getters::Getters;
use derive_more::{AsRef, Constructor, Display};
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Newtype pattern for the keys of our key/value store.
#[derive(AsRef, Clone, Debug, Deserialize, Display, Eq, Ord, PartialEq, PartialOrd, Serialize)]
#[serde(try_from = "String")]
pub(crate) struct Key(String);

impl Key {
    /// Creates a new key after validating that `key` is acceptable.
    pub(crate) fn new<S: Into<String>>(key: S) -> ModelResult<Self> {
        let key = key.into();
        if key.is_empty() {
            return Err(ModelError("Key cannot be empty".to_owned()));
        }
        Ok(Self(key))
    }
}

impl TryFrom<String> for Key {
    type Error = ModelError;

    fn try_from(key: String) -> ModelResult<Self> {
        Key::new(key)
    }
}

/// A key's current version number.
#[derive(Clone, Copy, Debug, Deserialize, Eq, PartialEq, Serialize)]
pub(crate) struct Version(u32);

impl Version {
    /// Returns the initial version assigned to new keys.
    pub(crate) fn initial() -> Version {
        Version(1)
    }

    /// Returns the next version to assign to an existing key.
    pub(crate) fn next(self) -> Version {
        Version(self.0.saturating_add(1))
    }

    /// Creates a version from a raw `u32`.
    #[cfg(test)]
    pub(crate) fn from_u32(version: u32) -> Version {
        Version(version)
    }
}

/// Content of the keys stored in our key/value store.
#[derive(Clone, Constructor, Debug, Deserialize, Getters, PartialEq, Serialize)]
pub(crate) struct Entry {
    /// The key's raw value.  Null values are not persisted, so a missing value reads as null.
    #[serde(default)]
    value: Value,

    /// The key's current version number.
    version: Version,
}
