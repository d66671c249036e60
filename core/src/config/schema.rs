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

//! Declaration of the options recognized by a configuration.

use super::{ConfigError, ConfigResult};
use serde_json::{Map, Value};

/// Type of the values an option accepts.
#[derive(Clone, Debug, PartialEq)]
pub enum OptionType {
    /// A string.
    String,

    /// An integer number.
    Integer,

    /// Any number.  Integers are accepted too.
    Float,

    /// A boolean.
    Boolean,

    /// A list of strings.  A single string is accepted too and becomes a one-element list.
    StringList,

    /// A nested group of options, merged recursively.
    Section(Schema),
}

impl OptionType {
    /// Returns a textual description of the type for error messages.
    fn describe(&self) -> &'static str {
        match self {
            OptionType::String => "a string",
            OptionType::Integer => "an integer",
            OptionType::Float => "a number",
            OptionType::Boolean => "a boolean",
            OptionType::StringList => "a list of strings",
            OptionType::Section(_) => "a mapping",
        }
    }
}

/// Declaration of a single option: its name, its type and its default value.
#[derive(Clone, Debug, PartialEq)]
pub struct OptionSpec {
    /// Name of the option, always in lowercase.
    name: String,

    /// Type of the values the option accepts.
    kind: OptionType,

    /// Value of the option when no configuration file sets it.
    default: Value,

    /// Whether the option accepts null.
    optional: bool,
}

impl OptionSpec {
    /// Internal constructor for all option types.
    fn new(name: &str, kind: OptionType, default: Value) -> Self {
        let optional = default.is_null();
        Self { name: name.to_lowercase(), kind, default, optional }
    }

    /// Declares a string option.
    pub fn string(name: &str, default: &str) -> Self {
        Self::new(name, OptionType::String, Value::from(default))
    }

    /// Declares a string option that may be unset.
    pub fn optional_string(name: &str, default: Option<&str>) -> Self {
        Self::new(name, OptionType::String, default.map(Value::from).unwrap_or(Value::Null))
            .optional()
    }

    /// Declares an integer option.
    pub fn integer(name: &str, default: i64) -> Self {
        Self::new(name, OptionType::Integer, Value::from(default))
    }

    /// Declares a numeric option.
    pub fn float(name: &str, default: f64) -> Self {
        Self::new(name, OptionType::Float, Value::from(default))
    }

    /// Declares a boolean option.
    pub fn boolean(name: &str, default: bool) -> Self {
        Self::new(name, OptionType::Boolean, Value::from(default))
    }

    /// Declares a list-of-strings option.
    pub fn string_list(name: &str, default: &[&str]) -> Self {
        Self::new(name, OptionType::StringList, Value::from(default.to_vec()))
    }

    /// Declares a nested section whose defaults come from `schema`.
    pub fn section(name: &str, schema: Schema) -> Self {
        let default = Value::Object(schema.defaults());
        Self::new(name, OptionType::Section(schema), default)
    }

    /// Marks the option as accepting null values.
    pub fn optional(mut self) -> Self {
        self.optional = true;
        self
    }

    /// Returns the lowercase name of the option.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Returns the type of the option.
    pub fn kind(&self) -> &OptionType {
        &self.kind
    }

    /// Returns the default value of the option.
    pub fn default_value(&self) -> &Value {
        &self.default
    }

    /// Checks that `value` is acceptable for this option, known as `qualified_name` in error
    /// messages, and returns it in normalized form.
    ///
    /// Sections are not handled here because they are merged, not replaced.
    pub(super) fn validate(&self, qualified_name: &str, value: &Value) -> ConfigResult<Value> {
        let invalid = || ConfigError::InvalidType {
            name: qualified_name.to_owned(),
            expected: self.kind.describe(),
        };

        if value.is_null() {
            return if self.optional { Ok(Value::Null) } else { Err(invalid()) };
        }

        match (&self.kind, value) {
            (OptionType::String, Value::String(_)) => Ok(value.clone()),
            (OptionType::Integer, Value::Number(n)) if n.is_i64() || n.is_u64() => {
                Ok(value.clone())
            }
            (OptionType::Float, Value::Number(_)) => Ok(value.clone()),
            (OptionType::Boolean, Value::Bool(_)) => Ok(value.clone()),
            (OptionType::StringList, Value::String(s)) => {
                Ok(Value::Array(vec![Value::String(s.clone())]))
            }
            (OptionType::StringList, Value::Array(items)) if items.iter().all(Value::is_string) => {
                Ok(value.clone())
            }
            _ => Err(invalid()),
        }
    }
}

/// Ordered collection of option declarations.
///
/// Option names are case-insensitive and must be unique within a schema.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Schema {
    /// The declared options, in declaration order.
    options: Vec<OptionSpec>,
}

impl Schema {
    /// Creates an empty schema.
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds the `spec` option to the schema.
    ///
    /// Panics if an option with the same name already exists, as schemas are static
    /// declarations and a duplicate is a programming error.
    pub fn with(mut self, spec: OptionSpec) -> Self {
        assert!(self.get(spec.name()).is_none(), "Duplicate option {} in schema", spec.name());
        self.options.push(spec);
        self
    }

    /// Looks up an option by `name`, ignoring case.
    pub fn get(&self, name: &str) -> Option<&OptionSpec> {
        let name = name.to_lowercase();
        self.options.iter().find(|spec| spec.name == name)
    }

    /// Iterates over the declared options.
    pub fn iter(&self) -> impl Iterator<Item = &OptionSpec> {
        self.options.iter()
    }

    /// Returns a mapping of every option to its default value.
    pub(super) fn defaults(&self) -> Map<String, Value> {
        self.options.iter().map(|spec| (spec.name.clone(), spec.default.clone())).collect()
    }
}
