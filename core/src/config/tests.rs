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

//! Tests for the configuration loader.

use super::*;
use serde::Deserialize;
use serde_json::json;
use tempfile::TempDir;

/// Schema used by most tests.
fn test_schema() -> Schema {
    Schema::new()
        .with(OptionSpec::string("IP_ADDRESS", "0.0.0.0"))
        .with(OptionSpec::integer("PORT", 8000))
        .with(OptionSpec::string_list("API_KEYS", &[]))
        .with(OptionSpec::optional_string("LOG_FILE", None))
        .with(OptionSpec::boolean("QUIET", false))
        .with(OptionSpec::float("RATIO", 0.5))
        .with(OptionSpec::section(
            "DATABASE",
            Schema::new()
                .with(OptionSpec::string("FILE", "db.json"))
                .with(OptionSpec::boolean("AUTOSAVE", true))
                .with(OptionSpec::section(
                    "BACKUP",
                    Schema::new().with(OptionSpec::integer("COPIES", 1)),
                )),
        ))
}

/// Scratch directory in which to create configuration files.
struct TestContext {
    /// The temporary directory, deleted on drop.
    dir: TempDir,
}

impl TestContext {
    fn setup() -> Self {
        Self { dir: tempfile::tempdir().unwrap() }
    }

    /// Writes a configuration file called `name` with `contents` and returns its path.
    fn write(&self, name: &str, contents: &str) -> PathBuf {
        let path = self.dir.path().join(name);
        fs::write(&path, contents).unwrap();
        path
    }

    /// Returns the path to a file called `name` that does not exist.
    fn missing(&self, name: &str) -> PathBuf {
        self.dir.path().join(name)
    }
}

#[test]
fn test_new_uses_defaults() {
    let config = Config::new(test_schema());
    assert_eq!(Some("0.0.0.0"), config.get_str("ip_address"));
    assert_eq!(Some(8000), config.get_i64("port"));
    assert_eq!(Some(vec![]), config.get_string_list("api_keys"));
    assert_eq!(Some(&Value::Null), config.get("log_file"));
    assert_eq!(Some(false), config.get_bool("quiet"));
    assert_eq!(Some(0.5), config.get_f64("ratio"));
    assert_eq!(Some("db.json"), config.get_str("database.file"));
    assert_eq!(Some(1), config.get_i64("database.backup.copies"));
}

#[test]
fn test_names_are_case_insensitive() {
    let mut config = Config::new(test_schema());
    config.set("Port", 1234).unwrap();
    assert_eq!(Some(1234), config.get_i64("PORT"));
    assert_eq!(Some(1234), config.get_i64("port"));
}

#[test]
fn test_load_file_preserves_missing_keys() {
    let context = TestContext::setup();
    let path = context.write("a.conf", "port: 9000\n");

    let mut config = Config::new(test_schema());
    config.set("ip_address", "127.0.0.1").unwrap();
    assert!(config.load_file(&path, None).unwrap());

    assert_eq!(Some(9000), config.get_i64("port"));
    assert_eq!(Some("127.0.0.1"), config.get_str("ip_address"));
    assert_eq!(Some(false), config.get_bool("quiet"));
}

#[test]
fn test_load_file_ignores_unknown_and_uppercase_keys() {
    let context = TestContext::setup();
    let path = context.write("a.conf", "unknown: 1\nPORT: 9000\nquiet: true\n");

    let mut config = Config::new(test_schema());
    assert!(config.load_file(&path, None).unwrap());

    assert_eq!(Some(8000), config.get_i64("port"));
    assert_eq!(Some(true), config.get_bool("quiet"));
    assert!(config.get("unknown").is_none());
}

#[test]
fn test_load_file_coercions() {
    let context = TestContext::setup();
    let path = context.write("a.conf", "api_keys: the-key\nratio: 2\nlog_file: /tmp/x.log\n");

    let mut config = Config::new(test_schema());
    assert!(config.load_file(&path, None).unwrap());

    assert_eq!(Some(vec!["the-key".to_owned()]), config.get_string_list("api_keys"));
    assert_eq!(Some(2.0), config.get_f64("ratio"));
    assert_eq!(Some("/tmp/x.log"), config.get_str("log_file"));
}

#[test]
fn test_load_file_null_for_optional() {
    let context = TestContext::setup();
    let path = context.write("a.conf", "log_file: ~\n");

    let mut config = Config::new(test_schema());
    config.set("log_file", "/tmp/x.log").unwrap();
    assert!(config.load_file(&path, None).unwrap());

    assert_eq!(Some(&Value::Null), config.get("log_file"));
}

#[test]
fn test_load_file_empty_document() {
    let context = TestContext::setup();
    let path = context.write("a.conf", "");

    let mut config = Config::new(test_schema());
    assert!(config.load_file(&path, None).unwrap());
    assert_eq!(Config::new(test_schema()), config);
}

#[test]
fn test_load_file_merges_sections_recursively() {
    let context = TestContext::setup();
    let path = context.write("a.conf", "database:\n  autosave: false\n  backup:\n    copies: 3\n");

    let mut config = Config::new(test_schema());
    assert!(config.load_file(&path, None).unwrap());

    assert_eq!(
        json!({"file": "db.json", "autosave": false, "backup": {"copies": 3}}),
        *config.get("database").unwrap()
    );
}

#[test]
fn test_load_file_with_scope() {
    let context = TestContext::setup();
    let path = context.write("a.conf", "port: 1\nmyapp:\n  port: 2\n");

    let mut config = Config::new(test_schema());
    assert!(config.load_file(&path, Some("myapp")).unwrap());
    assert_eq!(Some(2), config.get_i64("port"));
}

#[test]
fn test_load_file_with_missing_scope() {
    let context = TestContext::setup();
    let path = context.write("a.conf", "port: 1\n");

    let mut config = Config::new(test_schema());
    assert!(!config.load_file(&path, Some("myapp")).unwrap());
    assert_eq!(Some(8000), config.get_i64("port"));
}

#[test]
fn test_load_file_missing() {
    let context = TestContext::setup();
    let path = context.missing("a.conf");

    let mut config = Config::new(test_schema());
    match config.load_file(&path, None) {
        Err(ConfigError::Io { path: error_path, .. }) => assert_eq!(path, error_path),
        e => panic!("{:?}", e),
    }
}

#[test]
fn test_load_file_bad_syntax() {
    let context = TestContext::setup();
    let path = context.write("a.conf", "port: [1, 2\n");

    let mut config = Config::new(test_schema());
    match config.load_file(&path, None) {
        Err(ConfigError::Malformed { path: error_path, .. }) => assert_eq!(path, error_path),
        e => panic!("{:?}", e),
    }
}

#[test]
fn test_load_file_not_a_mapping() {
    let context = TestContext::setup();
    let path = context.write("a.conf", "- port\n- 1\n");

    let mut config = Config::new(test_schema());
    let err = config.load_file(&path, None).unwrap_err();
    assert!(err.to_string().contains("not a mapping"), "Unexpected error: {}", err);
}

#[test]
fn test_load_file_invalid_type_is_atomic() {
    let context = TestContext::setup();
    let path = context.write("a.conf", "quiet: true\nport: eighty\n");

    let mut config = Config::new(test_schema());
    let err = config.load_file(&path, None).unwrap_err();
    assert!(
        err.to_string().contains("Invalid value for option port: expected an integer"),
        "Unexpected error: {}",
        err
    );
    assert_eq!(Config::new(test_schema()), config);
}

#[test]
fn test_load_file_invalid_nested_type() {
    let context = TestContext::setup();
    let path = context.write("a.conf", "database:\n  backup: 3\n");

    let mut config = Config::new(test_schema());
    let err = config.load_file(&path, None).unwrap_err();
    assert!(err.to_string().contains("database.backup"), "Unexpected error: {}", err);
}

#[test]
fn test_load_first_match_applies_only_first_existing() {
    let context = TestContext::setup();
    let missing = context.missing("0.conf");
    let a = context.write("a.conf", "port: 1\n");
    let b = context.write("b.conf", "port: 2\nquiet: true\n");

    let mut config = Config::new(test_schema());
    let used = config.load(&[&missing, &a, &b], MergePolicy::FirstMatch, None).unwrap();

    assert_eq!(vec![a], used);
    assert_eq!(Some(1), config.get_i64("port"));
    assert_eq!(Some(false), config.get_bool("quiet"));
}

#[test]
fn test_load_first_match_skips_files_without_scope() {
    let context = TestContext::setup();
    let a = context.write("a.conf", "port: 1\n");
    let b = context.write("b.conf", "myapp:\n  port: 2\n");

    let mut config = Config::new(test_schema());
    let used = config.load(&[&a, &b], MergePolicy::FirstMatch, Some("myapp")).unwrap();

    assert_eq!(vec![b], used);
    assert_eq!(Some(2), config.get_i64("port"));
}

#[test]
fn test_load_layered_first_file_wins() {
    let context = TestContext::setup();
    let a = context.write("a.conf", "port: 1\n");
    let b = context.write("b.conf", "port: 2\nquiet: true\n");
    let c = context.missing("c.conf");

    let mut config = Config::new(test_schema());
    let used = config.load(&[&a, &b, &c], MergePolicy::Layered, None).unwrap();

    assert_eq!(vec![b, a], used);
    assert_eq!(Some(1), config.get_i64("port"));
    assert_eq!(Some(true), config.get_bool("quiet"));
}

#[test]
fn test_load_layered_merges_sections() {
    let context = TestContext::setup();
    let a = context.write("a.conf", "database:\n  file: a.json\n");
    let b = context.write("b.conf", "database:\n  file: b.json\n  autosave: false\n");

    let mut config = Config::new(test_schema());
    config.load(&[&a, &b], MergePolicy::Layered, None).unwrap();

    assert_eq!(Some("a.json"), config.get_str("database.file"));
    assert_eq!(Some(false), config.get_bool("database.autosave"));
}

#[test]
fn test_load_none_exist() {
    let context = TestContext::setup();
    let a = context.missing("a.conf");

    let mut config = Config::new(test_schema());
    for policy in [MergePolicy::FirstMatch, MergePolicy::Layered] {
        assert!(config.load(&[&a], policy, None).unwrap().is_empty());
    }
    assert_eq!(Config::new(test_schema()), config);
}

#[test]
fn test_load_stops_on_malformed_file() {
    let context = TestContext::setup();
    let a = context.write("a.conf", "port: 1\n");
    let b = context.write("b.conf", "port: [2, 3\n");

    let mut config = Config::new(test_schema());
    config.load(&[&a, &b], MergePolicy::Layered, None).unwrap_err();
    assert_eq!(Some(8000), config.get_i64("port"));
}

#[test]
fn test_set_nested_and_unknown() {
    let mut config = Config::new(test_schema());

    config.set("database.backup.copies", 5).unwrap();
    assert_eq!(Some(5), config.get_i64("database.backup.copies"));
    assert_eq!(Some("db.json"), config.get_str("database.file"));

    assert_eq!(
        ConfigError::UnknownOption("database.nope".to_owned()),
        config.set("database.nope", 1).unwrap_err()
    );
    assert_eq!(
        ConfigError::UnknownOption("port.nope".to_owned()),
        config.set("port.nope", 1).unwrap_err()
    );
    assert_eq!(
        ConfigError::InvalidType { name: "quiet".to_owned(), expected: "a boolean" },
        config.set("quiet", "yes").unwrap_err()
    );
}

#[test]
fn test_deserialize() {
    #[derive(Debug, Deserialize, PartialEq)]
    struct Database {
        file: String,
        autosave: bool,
    }

    #[derive(Debug, Deserialize, PartialEq)]
    struct Settings {
        port: u16,
        api_keys: Vec<String>,
        log_file: Option<String>,
        database: Database,
    }

    let mut config = Config::new(test_schema());
    config.set("api_keys", vec!["k1", "k2"]).unwrap();

    let settings = config.deserialize::<Settings>().unwrap();
    assert_eq!(
        Settings {
            port: 8000,
            api_keys: vec!["k1".to_owned(), "k2".to_owned()],
            log_file: None,
            database: Database { file: "db.json".to_owned(), autosave: true },
        },
        settings
    );

    config.set("port", 100000).unwrap();
    match config.deserialize::<Settings>() {
        Err(ConfigError::Conversion(_)) => (),
        e => panic!("{:?}", e),
    }
}
