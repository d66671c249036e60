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

//! Test utilities for the REST API.

use crate::db::{KeyValueDb, KeyValueModel};
use crate::driver::Driver;
use crate::model::*;
use crate::rest::{REALM, app};
use apiseed_authn::rest::{ApiKeyGuard, Guards, UserGuard};
use axum::Router;
use serde_json::Value;
use std::sync::{Arc, Mutex};

/// Builder for a `TestContext`.
#[must_use]
pub(crate) struct TestContextBuilder {
    api_keys: Vec<String>,
    authorized_users: Vec<String>,
    allow_anonymous: bool,
}

impl TestContextBuilder {
    pub(crate) fn new() -> Self {
        Self { api_keys: vec![], authorized_users: vec![], allow_anonymous: true }
    }

    pub(crate) fn with_api_keys(mut self, keys: &[&str]) -> Self {
        self.api_keys = keys.iter().map(|k| (*k).to_owned()).collect();
        self
    }

    pub(crate) fn with_authorized_users(mut self, users: &[&str]) -> Self {
        self.authorized_users = users.iter().map(|u| (*u).to_owned()).collect();
        self
    }

    pub(crate) fn with_anonymous(mut self, allow: bool) -> Self {
        self.allow_anonymous = allow;
        self
    }

    pub(crate) fn build(self) -> TestContext {
        let db = Arc::new(Mutex::new(KeyValueDb::new(KeyValueModel::default(), None, true)));
        let driver = Driver::new(db.clone());
        let api_keys = Guards::new().with(ApiKeyGuard::new(self.api_keys, REALM));
        let users = Guards::new().with(UserGuard::new(
            self.authorized_users,
            self.allow_anonymous,
            REALM,
        ));
        let app = app(driver, api_keys, users);
        TestContext { db, app }
    }
}

pub(crate) struct TestContext {
    db: Arc<Mutex<KeyValueDb>>,
    app: Router,
}

impl TestContext {
    pub(crate) fn setup() -> Self {
        TestContextBuilder::new().build()
    }

    pub(crate) fn app(&self) -> Router {
        self.app.clone()
    }

    pub(crate) fn into_app(self) -> Router {
        self.app
    }

    pub(crate) fn set_key<K: Into<String>>(&self, key: K, value: Value, version: u32) {
        let key = Key::new(key).unwrap();
        let entry = Entry::new(value, Version::from_u32(version));
        self.db.lock().unwrap().mutate(|model| model.set_key(key, entry)).unwrap();
    }

    pub(crate) fn has_key<K: Into<String>>(&self, key: K) -> bool {
        self.get_key(key).is_some()
    }

    pub(crate) fn get_key<K: Into<String>>(&self, key: K) -> Option<Entry> {
        let key = Key::new(key).unwrap();
        self.db.lock().unwrap().model().get_key(&key).cloned()
    }
}
