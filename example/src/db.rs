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

//! Database abstraction for the key/value store.

use crate::model::*;
use apiseed_core::jsondb::{JsonDb, JsonModel};
use serde_json::{Map, Value};
use std::collections::BTreeMap;

/// The database of the service: the key/value model mirrored to a JSON file.
pub(crate) type KeyValueDb = JsonDb<KeyValueModel>;

/// In-memory state of the key/value store.
///
/// The on-disk representation is a JSON object that maps every key to its `Entry`.
#[derive(Debug, Default)]
pub(crate) struct KeyValueModel {
    /// All entries, sorted by key.
    entries: BTreeMap<Key, Entry>,
}

impl KeyValueModel {
    /// Gets the current value of the given `key`.
    pub(crate) fn get_key(&self, key: &Key) -> Option<&Entry> {
        self.entries.get(key)
    }

    /// Gets the current version of the given `key`, if it exists.
    pub(crate) fn get_key_version(&self, key: &Key) -> Option<Version> {
        self.entries.get(key).map(|entry| *entry.version())
    }

    /// Gets a list of all existing keys, in order.
    pub(crate) fn get_keys(&self) -> Vec<Key> {
        self.entries.keys().cloned().collect()
    }

    /// Sets `key` to `entry`, replacing any previous value.
    pub(crate) fn set_key(&mut self, key: Key, entry: Entry) {
        self.entries.insert(key, entry);
    }

    /// Deletes `key` and returns whether it existed.
    pub(crate) fn delete_key(&mut self, key: &Key) -> bool {
        self.entries.remove(key).is_some()
    }
}

impl JsonModel for KeyValueModel {
    fn unserialize(&mut self, parsed: Map<String, Value>) -> Result<(), String> {
        let mut entries = BTreeMap::default();
        for (key, entry) in parsed {
            let entry = serde_json::from_value::<Entry>(entry)
                .map_err(|e| format!("Invalid entry for key {}: {}", key, e))?;
            let key = Key::new(key).map_err(|e| e.to_string())?;
            entries.insert(key, entry);
        }
        self.entries = entries;
        Ok(())
    }

    fn serialize(&self) -> Value {
        let mut object = Map::new();
        for (key, entry) in &self.entries {
            // Serializing an Entry cannot fail.
            if let Ok(entry) = serde_json::to_value(entry) {
                object.insert(key.as_ref().to_owned(), entry);
            }
        }
        Value::Object(object)
    }

    fn wipe(&mut self) {
        self.entries.clear();
    }
}
