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

//! In-memory database mirrored to a JSON file.
//!
//! Services implement `JsonModel` to translate between their in-memory data structures and the
//! JSON tree stored on disk, and wrap the model in a `JsonDb`.  When autosave is enabled, every
//! mutation issued via `JsonDb::mutate` rewrites the whole file.
//!
//! Writes are neither atomic nor crash-safe: the file is truncated and rewritten in place, and
//! the last writer wins.

use log::debug;
use serde_json::{Map, Value};
use std::fs;
use std::path::{Path, PathBuf};

/// Database errors.
#[derive(Debug, PartialEq, thiserror::Error)]
pub enum JsonDbError {
    /// Indicates that the database contents were rejected by the model.
    #[error("Invalid JSON content: {0}")]
    InvalidContent(String),

    /// Indicates that the database file does not contain valid JSON.
    #[error("Invalid JSON file: {0}")]
    InvalidJson(String),

    /// Indicates an I/O failure while reading or writing the database file.
    #[error("I/O error on {}: {message}", .path.display())]
    Io {
        /// Path to the database file.
        path: PathBuf,

        /// Description of the problem.
        message: String,
    },

    /// Indicates that a save was requested on a database without a backing file.
    #[error("Database file is not set")]
    NoFilename,

    /// Indicates that the path to load does not point to a regular file.
    #[error("{} is not a file", .0.display())]
    NotAFile(PathBuf),
}

/// Result type for this module.
pub type JsonDbResult<T> = Result<T, JsonDbError>;

/// Translation between the in-memory state of a service and its JSON representation.
pub trait JsonModel {
    /// Replaces the in-memory state with the `parsed` top-level mapping of a database file.
    ///
    /// Returns a description of the problem if the contents are not acceptable.
    fn unserialize(&mut self, parsed: Map<String, Value>) -> Result<(), String>;

    /// Returns the JSON representation of the in-memory state.
    fn serialize(&self) -> Value;

    /// Clears the in-memory state.
    fn wipe(&mut self) {}
}

/// A model that stores nothing.  Useful for debugging purposes.
#[derive(Debug, Default)]
pub struct EmptyModel {}

impl JsonModel for EmptyModel {
    fn unserialize(&mut self, _parsed: Map<String, Value>) -> Result<(), String> {
        Ok(())
    }

    fn serialize(&self) -> Value {
        let mut object = Map::new();
        object.insert("message".to_owned(), Value::from("Empty Dummy DB"));
        Value::Object(object)
    }
}

/// Removes all null-valued keys from `value`, recursively.  Null items in lists are kept.
pub fn remove_nulls(value: &mut Value) {
    match value {
        Value::Object(object) => {
            object.retain(|_, v| !v.is_null());
            object.values_mut().for_each(remove_nulls);
        }
        Value::Array(items) => items.iter_mut().for_each(remove_nulls),
        _ => (),
    }
}

/// A database backed by a `JsonModel` and, optionally, by a file.
#[derive(Debug)]
pub struct JsonDb<M: JsonModel> {
    /// The in-memory state.
    model: M,

    /// File backing the database, if any.
    filename: Option<PathBuf>,

    /// Whether to save the database after every mutation.
    autosave: bool,
}

impl<M: JsonModel> JsonDb<M> {
    /// Creates a new database on top of `model`, optionally backed by `filename`.
    pub fn new(mut model: M, filename: Option<PathBuf>, autosave: bool) -> Self {
        model.wipe();
        Self { model, filename, autosave }
    }

    /// Returns the file backing the database, if any.
    pub fn filename(&self) -> Option<&Path> {
        self.filename.as_deref()
    }

    /// Returns whether autosave is enabled.
    pub fn autosave(&self) -> bool {
        self.autosave
    }

    /// Returns a read-only view of the in-memory state.
    pub fn model(&self) -> &M {
        &self.model
    }

    /// Returns the JSON representation of the in-memory state.
    pub fn as_object(&self) -> Value {
        self.model.serialize()
    }

    /// Clears the in-memory state without touching the backing file.
    pub fn wipe(&mut self) {
        self.model.wipe();
    }

    /// Loads the database from the JSON file at `path`, which becomes the backing file.
    pub fn load<P: AsRef<Path>>(&mut self, path: P) -> JsonDbResult<()> {
        let path = path.as_ref();
        if !path.is_file() {
            return Err(JsonDbError::NotAFile(path.to_owned()));
        }

        let contents = fs::read_to_string(path)
            .map_err(|e| JsonDbError::Io { path: path.to_owned(), message: e.to_string() })?;
        let parsed = match serde_json::from_str::<Value>(&contents) {
            Ok(Value::Object(parsed)) => parsed,
            Ok(_) => {
                return Err(JsonDbError::InvalidJson("top-level value is not an object".to_owned()));
            }
            Err(e) => return Err(JsonDbError::InvalidJson(e.to_string())),
        };

        self.model.unserialize(parsed).map_err(JsonDbError::InvalidContent)?;
        self.filename = Some(path.to_owned());
        debug!("Loaded database from {}", path.display());
        Ok(())
    }

    /// Writes the database to its backing file, replacing any previous contents.
    pub fn save(&self) -> JsonDbResult<()> {
        let path = self.filename.as_ref().ok_or(JsonDbError::NoFilename)?;

        let mut content = self.model.serialize();
        remove_nulls(&mut content);
        let content = serde_json::to_string_pretty(&content)
            .map_err(|e| JsonDbError::InvalidContent(e.to_string()))?;

        fs::write(path, content)
            .map_err(|e| JsonDbError::Io { path: path.to_owned(), message: e.to_string() })?;
        debug!("Saved database to {}", path.display());
        Ok(())
    }

    /// Saves the database if autosave is enabled and there is a backing file.
    pub fn trigger_autosave(&self) -> JsonDbResult<()> {
        if self.autosave && self.filename.is_some() { self.save() } else { Ok(()) }
    }

    /// Applies `op` to the in-memory state and then triggers an autosave.
    ///
    /// The in-memory change is kept even if saving fails.
    pub fn mutate<R, F>(&mut self, op: F) -> JsonDbResult<R>
    where
        F: FnOnce(&mut M) -> R,
    {
        let result = op(&mut self.model);
        self.trigger_autosave()?;
        Ok(result)
    }
}
