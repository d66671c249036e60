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

//! Test utilities for the business layer.

use crate::db::{KeyValueDb, KeyValueModel};
use crate::driver::Driver;
use crate::model::*;
use serde_json::Value;
use std::fs;
use std::sync::{Arc, Mutex};
use tempfile::TempDir;

pub(crate) struct TestContext {
    db: Arc<Mutex<KeyValueDb>>,
    driver: Driver,
    dir: Option<TempDir>,
}

impl TestContext {
    /// Sets up a driver backed by an in-memory database.
    pub(crate) fn setup() -> Self {
        let db = Arc::new(Mutex::new(KeyValueDb::new(KeyValueModel::default(), None, true)));
        let driver = Driver::new(db.clone());
        Self { db, driver, dir: None }
    }

    /// Sets up a driver backed by a database file with autosave enabled.
    pub(crate) fn setup_with_file() -> Self {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("db.json");
        fs::write(&path, "{}").unwrap();

        let mut db = KeyValueDb::new(KeyValueModel::default(), None, true);
        db.load(&path).unwrap();
        let db = Arc::new(Mutex::new(db));
        let driver = Driver::new(db.clone());
        Self { db, driver, dir: Some(dir) }
    }

    pub(crate) fn driver(&self) -> Driver {
        self.driver.clone()
    }

    /// Stores `value` under `key` with the given `version`, bypassing the driver.
    pub(crate) fn set_key(&self, key: &Key, value: Value, version: u32) {
        let mut db = self.db.lock().unwrap();
        let entry = Entry::new(value, Version::from_u32(version));
        db.mutate(|model| model.set_key(key.clone(), entry)).unwrap();
    }

    /// Gets the entry for `key`, bypassing the driver.
    pub(crate) fn get_key(&self, key: &Key) -> Option<Entry> {
        self.db.lock().unwrap().model().get_key(key).cloned()
    }

    /// Reads and parses the database file.
    pub(crate) fn read_file(&self) -> Value {
        let dir = self.dir.as_ref().expect("Context not backed by a file");
        let content = fs::read_to_string(dir.path().join("db.json")).unwrap();
        serde_json::from_str(&content).unwrap()
    }
}
