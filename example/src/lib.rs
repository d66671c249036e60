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

//! Sample REST service that implements a key/value store.

// Keep these in sync with other top-level files.
#![warn(anonymous_parameters, bad_style, clippy::missing_docs_in_private_items, missing_docs)]
#![warn(unused, unused_extern_crates, unused_import_braces, unused_qualifications)]
#![warn(unsafe_code)]

use apiseed_authn::rest::{ApiKeyGuard, Guards, UserGuard};
use apiseed_core::jsondb::JsonDbError;
use apiseed_core::server::Server;
use log::error;
use std::io;
use std::net::{IpAddr, SocketAddr};
use std::sync::{Arc, Mutex};

pub(crate) mod db;
use db::{KeyValueDb, KeyValueModel};
mod driver;
use driver::Driver;
pub(crate) mod model;
mod rest;
use rest::{REALM, app};
pub mod settings;
use settings::Settings;

/// Errors that prevent the service from running.
#[derive(Debug, thiserror::Error)]
pub enum ServeError {
    /// Indicates that the key/value store could not be loaded.
    #[error("Cannot load database: {0}")]
    Database(#[from] JsonDbError),

    /// Indicates a problem with the listening socket.
    #[error("{0}")]
    Io(#[from] io::Error),
}

/// Instantiates all resources to serve the application on `ip_address`.
///
/// While it'd be nice to push this responsibility to `main`, doing so would force us to expose many
/// crate-internal types to the public, which in turn would make dead code detection harder.
pub async fn serve(settings: &Settings, ip_address: IpAddr) -> Result<(), ServeError> {
    let mut db = KeyValueDb::new(KeyValueModel::default(), None, true);
    db.load(settings.database_file())?;
    let db = Arc::new(Mutex::new(db));

    let driver = Driver::new(db);
    let api_keys = Guards::new().with(ApiKeyGuard::new(settings.api_keys().clone(), REALM));
    let users = Guards::new().with(UserGuard::new(
        settings.authorized_users().clone(),
        *settings.allow_anonymous_user(),
        REALM,
    ));

    let stop_driver = driver.clone();
    let server = Server::new(app(driver, api_keys, users))
        .base_path(settings.apibase().as_str())
        .log_api_calls(*settings.log_api_calls())
        .on_stop(move || {
            if let Err(e) = stop_driver.save() {
                error!("Failed to save database: {}", e);
            }
        });

    server.serve(SocketAddr::new(ip_address, *settings.port())).await?;
    Ok(())
}
