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

//! Configuration loaded from YAML files on top of declared defaults.
//!
//! Services declare the options they recognize in a `Schema` and create a `Config` from it, which
//! starts with all options set to their defaults.  The config can then be merged with the
//! contents of zero or more files:
//!
//! *   With `MergePolicy::FirstMatch`, only the first existing file in the candidate list is
//!     applied.
//! *   With `MergePolicy::Layered`, all existing files are applied in reverse order so that the
//!     first-listed file has the final say.
//!
//! Top-level keys in the files are the lowercase names of the options.  Keys that do not match a
//! declared option are ignored, and options that are not mentioned in a file keep their prior
//! values.  Nested sections are merged recursively.

use log::{debug, warn};
use serde::de::DeserializeOwned;
use serde_json::{Map, Value};
use std::fs;
use std::path::{Path, PathBuf};

mod schema;
pub use schema::{OptionSpec, OptionType, Schema};
#[cfg(test)]
mod tests;

/// Configuration errors.
#[derive(Debug, PartialEq, thiserror::Error)]
pub enum ConfigError {
    /// Indicates that a configuration file could not be read.
    #[error("Cannot read configuration file {}: {message}", .path.display())]
    Io {
        /// Path to the file that failed to load.
        path: PathBuf,

        /// Description of the problem.
        message: String,
    },

    /// Indicates that a configuration file has invalid syntax or contents.
    #[error("Invalid configuration file {}: {message}", .path.display())]
    Malformed {
        /// Path to the file that failed to load.
        path: PathBuf,

        /// Description of the problem.
        message: String,
    },

    /// Indicates that an option was given a value of the wrong type.
    #[error("Invalid value for option {name}: expected {expected}")]
    InvalidType {
        /// Fully-qualified name of the option.
        name: String,

        /// Description of the expected type.
        expected: &'static str,
    },

    /// Indicates that an option is not declared in the schema.
    #[error("Unknown configuration option {0}")]
    UnknownOption(String),

    /// Indicates that the configuration cannot be converted to the requested type.
    #[error("Cannot convert configuration: {0}")]
    Conversion(String),
}

/// Result type for this module.
pub type ConfigResult<T> = Result<T, ConfigError>;

/// How to combine multiple candidate configuration files.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum MergePolicy {
    /// Apply only the first existing file.
    FirstMatch,

    /// Apply all existing files so that the first-listed one takes precedence.
    Layered,
}

/// Merges the `source` mapping into `values` following the declarations in `schema`.
///
/// `prefix` is the qualified name of the section being merged, used in error messages.
fn merge_section(
    schema: &Schema,
    values: &mut Map<String, Value>,
    source: &Map<String, Value>,
    prefix: &str,
) -> ConfigResult<()> {
    for spec in schema.iter() {
        let value = match source.get(spec.name()) {
            Some(value) => value,
            None => continue,
        };

        let qualified_name = if prefix.is_empty() {
            spec.name().to_owned()
        } else {
            format!("{}.{}", prefix, spec.name())
        };

        match (spec.kind(), value) {
            (OptionType::Section(subschema), Value::Object(subsource)) => {
                let entry = values
                    .entry(spec.name().to_owned())
                    .or_insert_with(|| Value::Object(Map::new()));
                if !entry.is_object() {
                    *entry = Value::Object(Map::new());
                }
                if let Value::Object(subvalues) = entry {
                    merge_section(subschema, subvalues, subsource, &qualified_name)?;
                }
            }
            (OptionType::Section(_), _) => {
                return Err(ConfigError::InvalidType {
                    name: qualified_name,
                    expected: "a mapping",
                });
            }
            (_, value) => {
                let value = spec.validate(&qualified_name, value)?;
                values.insert(spec.name().to_owned(), value);
            }
        }
    }
    Ok(())
}

/// Reads and parses the YAML file at `path` into a mapping.
///
/// An empty document is returned as an empty mapping.
fn read_mapping(path: &Path) -> ConfigResult<Map<String, Value>> {
    let contents = fs::read_to_string(path)
        .map_err(|e| ConfigError::Io { path: path.to_owned(), message: e.to_string() })?;

    let malformed = |message: String| ConfigError::Malformed { path: path.to_owned(), message };

    let document: serde_yaml::Value =
        serde_yaml::from_str(&contents).map_err(|e| malformed(e.to_string()))?;
    match serde_json::to_value(document).map_err(|e| malformed(e.to_string()))? {
        Value::Null => Ok(Map::new()),
        Value::Object(mapping) => Ok(mapping),
        _ => Err(malformed("top-level content is not a mapping".to_owned())),
    }
}

/// A configuration object: the values of all options declared in a schema.
#[derive(Clone, Debug, PartialEq)]
pub struct Config {
    /// Declaration of the recognized options.
    schema: Schema,

    /// Current values of all options, keyed by their lowercase names.
    values: Map<String, Value>,
}

impl Config {
    /// Creates a new configuration with all options in `schema` set to their defaults.
    pub fn new(schema: Schema) -> Self {
        let values = schema.defaults();
        Self { schema, values }
    }

    /// Returns the schema of this configuration.
    pub fn schema(&self) -> &Schema {
        &self.schema
    }

    /// Merges the options present in `source` into the configuration.
    ///
    /// The merge is all-or-nothing: if any value is invalid, the configuration is left untouched.
    pub fn apply(&mut self, source: &Map<String, Value>) -> ConfigResult<()> {
        let mut values = self.values.clone();
        merge_section(&self.schema, &mut values, source, "")?;
        self.values = values;
        Ok(())
    }

    /// Loads the configuration file at `path` and merges it into the configuration.
    ///
    /// If `scope` is provided, only the contents under that top-level key are considered.  If the
    /// key is missing, the file is skipped with a warning and this returns false.
    pub fn load_file<P: AsRef<Path>>(
        &mut self,
        path: P,
        scope: Option<&str>,
    ) -> ConfigResult<bool> {
        let path = path.as_ref();
        let mut mapping = read_mapping(path)?;

        if let Some(scope) = scope {
            mapping = match mapping.remove(scope) {
                Some(Value::Object(scoped)) => scoped,
                Some(Value::Null) => Map::new(),
                Some(_) => {
                    return Err(ConfigError::Malformed {
                        path: path.to_owned(),
                        message: format!("section {} is not a mapping", scope),
                    });
                }
                None => {
                    warn!(
                        "Section {} not found in configuration file {}; skipping",
                        scope,
                        path.display()
                    );
                    return Ok(false);
                }
            };
        }

        debug!("Applying configuration file {}", path.display());
        self.apply(&mapping).map_err(|e| match e {
            e @ (ConfigError::Io { .. } | ConfigError::Malformed { .. }) => e,
            e => ConfigError::Malformed { path: path.to_owned(), message: e.to_string() },
        })?;
        Ok(true)
    }

    /// Loads the configuration from the candidate `paths` following `policy`.
    ///
    /// Candidates that do not exist are ignored.  Returns the list of files that were applied, in
    /// application order.  A file that fails to load stops the loading and the error is returned
    /// to the caller, who decides whether that is fatal.
    pub fn load<P: AsRef<Path>>(
        &mut self,
        paths: &[P],
        policy: MergePolicy,
        scope: Option<&str>,
    ) -> ConfigResult<Vec<PathBuf>> {
        let candidates: Vec<&Path> =
            paths.iter().map(|path| path.as_ref()).filter(|path| path.is_file()).collect();

        let mut used = vec![];
        match policy {
            MergePolicy::FirstMatch => {
                for path in candidates {
                    if self.load_file(path, scope)? {
                        used.push(path.to_owned());
                        break;
                    }
                }
            }
            MergePolicy::Layered => {
                for path in candidates.into_iter().rev() {
                    if self.load_file(path, scope)? {
                        used.push(path.to_owned());
                    }
                }
            }
        }
        Ok(used)
    }

    /// Overrides the option `name` with `value`.
    ///
    /// Options in nested sections are addressed with dotted names, like `section.option`.
    pub fn set<V: Into<Value>>(&mut self, name: &str, value: V) -> ConfigResult<()> {
        let name = name.to_lowercase();
        let parts = name.split('.').collect::<Vec<&str>>();

        let mut schema = &self.schema;
        for (i, part) in parts.iter().enumerate() {
            let spec = schema.get(part).ok_or_else(|| ConfigError::UnknownOption(name.clone()))?;
            match spec.kind() {
                OptionType::Section(subschema) if i + 1 < parts.len() => schema = subschema,
                _ if i + 1 < parts.len() => {
                    return Err(ConfigError::UnknownOption(name.clone()));
                }
                _ => (),
            }
        }

        let mut value: Value = value.into();
        for part in parts[1..].iter().rev() {
            let mut wrapper = Map::new();
            wrapper.insert((*part).to_owned(), value);
            value = Value::Object(wrapper);
        }
        let mut source = Map::new();
        source.insert(parts[0].to_owned(), value);
        self.apply(&source)
    }

    /// Gets the current value of option `name`, using dotted names for nested options.
    pub fn get(&self, name: &str) -> Option<&Value> {
        let name = name.to_lowercase();
        let mut parts = name.split('.');
        let mut value = self.values.get(parts.next()?)?;
        for part in parts {
            value = value.as_object()?.get(part)?;
        }
        Some(value)
    }

    /// Gets the current value of the string option `name`.
    pub fn get_str(&self, name: &str) -> Option<&str> {
        self.get(name).and_then(Value::as_str)
    }

    /// Gets the current value of the integer option `name`.
    pub fn get_i64(&self, name: &str) -> Option<i64> {
        self.get(name).and_then(Value::as_i64)
    }

    /// Gets the current value of the numeric option `name`.
    pub fn get_f64(&self, name: &str) -> Option<f64> {
        self.get(name).and_then(Value::as_f64)
    }

    /// Gets the current value of the boolean option `name`.
    pub fn get_bool(&self, name: &str) -> Option<bool> {
        self.get(name).and_then(Value::as_bool)
    }

    /// Gets the current value of the list-of-strings option `name`.
    pub fn get_string_list(&self, name: &str) -> Option<Vec<String>> {
        self.get(name)?
            .as_array()?
            .iter()
            .map(|item| item.as_str().map(str::to_owned))
            .collect::<Option<Vec<String>>>()
    }

    /// Returns all current values as a JSON mapping.
    pub fn as_value(&self) -> Value {
        Value::Object(self.values.clone())
    }

    /// Converts the configuration into a strongly-typed settings object.
    pub fn deserialize<T: DeserializeOwned>(&self) -> ConfigResult<T> {
        serde_json::from_value(self.as_value()).map_err(|e| ConfigError::Conversion(e.to_string()))
    }
}
