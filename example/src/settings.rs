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

//! Settings of the service and where to load them from.

use apiseed_core::config::{OptionSpec, Schema};
use apiseed_core::logger::{InvalidLevelError, Level, LoggerOptions};
use derive_getters::Getters;
use serde::Deserialize;
use std::path::{Path, PathBuf};

/// Short name of the service, used to derive the names of its files.
pub const SHORTNAME: &str = "apiseed";

/// Returns the declaration of all settings recognized by the service and their defaults.
pub fn schema() -> Schema {
    Schema::new()
        .with(OptionSpec::string("ip_address", "0.0.0.0"))
        .with(OptionSpec::integer("port", 8000))
        .with(OptionSpec::string("database_file", &format!("{}.json", SHORTNAME)))
        .with(OptionSpec::string("apibase", ""))
        .with(OptionSpec::string_list("api_keys", &[]))
        .with(OptionSpec::string_list("authorized_users", &[]))
        .with(OptionSpec::boolean("allow_anonymous_user", true))
        .with(OptionSpec::optional_string("log_file", None))
        .with(OptionSpec::string("log_level", "INFO"))
        .with(OptionSpec::boolean("quiet", false))
        .with(OptionSpec::boolean("log_api_calls", true))
}

/// Returns the configuration files to look for, in order of preference.
///
/// `config_file` is an explicitly-requested file, which takes precedence over all others.
pub fn candidate_files(config_file: Option<&Path>) -> Vec<PathBuf> {
    let mut files = vec![];
    if let Some(config_file) = config_file {
        files.push(config_file.to_owned());
    }
    files.push(PathBuf::from(format!("{}.conf", SHORTNAME)));
    files.push(PathBuf::from(format!("etc/{}.conf", SHORTNAME)));
    files.push(PathBuf::from(format!("/etc/{}.conf", SHORTNAME)));
    files.push(PathBuf::from(format!("/etc/{0}/{0}.conf", SHORTNAME)));
    files.push(PathBuf::from(format!("/usr/local/etc/{}.conf", SHORTNAME)));
    files
}

/// Strongly-typed view of the settings once all sources have been merged.
#[derive(Clone, Debug, Deserialize, Getters, PartialEq)]
pub struct Settings {
    /// Address to listen on.
    ip_address: String,

    /// Port to listen on.
    port: u16,

    /// Path to the JSON file that backs the key/value store.
    database_file: PathBuf,

    /// Path under which to mount the API.
    apibase: String,

    /// API keys accepted by the service.  Empty means no key is required.
    api_keys: Vec<String>,

    /// Users on behalf of which requests can act.  Empty means any user.
    authorized_users: Vec<String>,

    /// Whether requests without a username are accepted when any user is allowed.
    allow_anonymous_user: bool,

    /// File to which to append log lines, if any.
    log_file: Option<PathBuf>,

    /// Name of the most verbose log level to emit.
    log_level: String,

    /// Whether to suppress console output.
    quiet: bool,

    /// Whether to log every API call.
    log_api_calls: bool,
}

impl Settings {
    /// Computes the logger configuration.
    ///
    /// An invalid level name falls back to `INFO` and the error is returned alongside so that it
    /// can be reported once the logger is installed.
    pub fn logger_options(&self) -> (LoggerOptions, Option<InvalidLevelError>) {
        let (level, error) = match self.log_level.parse::<Level>() {
            Ok(level) => (level, None),
            Err(e) => (Level::Info, Some(e)),
        };
        let opts = LoggerOptions { level, log_file: self.log_file.clone(), quiet: self.quiet };
        (opts, error)
    }
}
