//! 配置加载集成测试
//!
//! 通过临时目录中的真实文件测试双层合并和加载行为

use jmx_vitals::config::{
    BeanAttribute, BeanAttributeType, ConfigLayer, ConfigLoader, ConfigWarning, LogLevel, Unit,
    YamlConfigLoader,
};
use jmx_vitals::error::{ConfigError, JmxVitalsError};
use std::fs;
use std::path::{Path, PathBuf};
use tempfile::TempDir;

const DEFAULTS: &str = r#"
log:
  file_priority: info
jmx:
  default_beans:
    - query: "java.lang:type=Memory"
      attributes:
        - HeapMemoryUsage
        - {name: NonHeapMemoryUsage, unit: B}
  per_process_beans:
    web:
      pattern: nginx
      beans:
        - query: "web:type=A"
          attributes: [a]
"#;

const USER: &str = r#"
jmx:
  per_process_beans:
    web:
      pattern: nginx
      beans:
        - query: "web:type=B"
          attributes: [b]
    db:
      pattern: postgres
      beans:
        - query: "db:type=C"
          attributes: [c]
"#;

/// 在临时目录中写入两层配置并返回对应的加载器
fn setup(user: Option<&str>, defaults: Option<&str>) -> (TempDir, YamlConfigLoader) {
    let dir = TempDir::new().unwrap();
    let user_path = dir.path().join("jmx-vitals.yaml");
    let defaults_path = dir.path().join("jmx-vitals.default.yaml");

    if let Some(content) = user {
        fs::write(&user_path, content).unwrap();
    }
    if let Some(content) = defaults {
        fs::write(&defaults_path, content).unwrap();
    }

    let loader = YamlConfigLoader::default().with_candidates(
        vec![dir.path().join("missing.yaml"), user_path],
        vec![defaults_path],
    );
    (dir, loader)
}

fn file_in(dir: &Path, name: &str) -> PathBuf {
    dir.join(name)
}

#[test]
fn test_per_process_rules_merge_whole_value_per_key() {
    let (_dir, loader) = setup(Some(USER), Some(DEFAULTS));
    let config = loader.load().unwrap();

    assert_eq!(config.process_rules.len(), 2);

    let web = &config.process_rules["web"];
    assert_eq!(web.queries.len(), 1);
    assert_eq!(web.queries[0].object_name.as_str(), "web:type=B");
    assert_eq!(web.queries[0].attributes, vec![BeanAttribute::named("b")]);

    let db = &config.process_rules["db"];
    assert_eq!(db.pattern, "postgres");
    assert_eq!(db.queries[0].attributes, vec![BeanAttribute::named("c")]);

    // 用户层没有 default_beans，沿用默认层
    assert_eq!(config.default_bean_queries.len(), 1);
    let memory = &config.default_bean_queries[0];
    assert_eq!(memory.attributes[1].unit, Unit::Byte);
}

#[test]
fn test_sources_are_reported() {
    let (dir, loader) = setup(Some(USER), Some(DEFAULTS));
    let outcome = loader.load_outcome().unwrap();

    assert_eq!(
        outcome.sources.user,
        Some(file_in(dir.path(), "jmx-vitals.yaml"))
    );
    assert_eq!(
        outcome.sources.defaults,
        Some(file_in(dir.path(), "jmx-vitals.default.yaml"))
    );
    assert!(outcome.warnings.is_empty());
}

#[test]
fn test_load_is_idempotent() {
    let (_dir, loader) = setup(Some(USER), Some(DEFAULTS));
    let first = loader.load().unwrap();
    let second = loader.load().unwrap();
    assert_eq!(first, second);
}

#[test]
fn test_log_level_resolution() {
    let (_dir, loader) = setup(None, Some("jmx: {}"));
    assert_eq!(loader.load().unwrap().log_level, LogLevel::Info);

    let (_dir, loader) = setup(Some("log: {file_priority: debug}"), Some(DEFAULTS));
    assert_eq!(loader.load().unwrap().log_level, LogLevel::Debug);

    let (_dir, loader) = setup(Some("log: {file_priority: verbose}"), Some(DEFAULTS));
    let outcome = loader.load_outcome().unwrap();
    assert_eq!(outcome.config.log_level, LogLevel::Info);
    // 日志级别回退不产生告警
    assert!(outcome.warnings.is_empty());
}

#[test]
fn test_bogus_attribute_type_is_recovered() {
    let user = r#"
jmx:
  default_beans:
    - query: "java.lang:type=Runtime"
      attributes:
        - {name: x, type: bogus}
        - {name: Uptime, type: Counter, unit: ms}
"#;
    let (_dir, loader) = setup(Some(user), Some(DEFAULTS));
    let outcome = loader.load_outcome().unwrap();

    let attributes = &outcome.config.default_bean_queries[0].attributes;
    assert_eq!(attributes[0], BeanAttribute::named("x"));
    assert_eq!(attributes[1].kind, BeanAttributeType::Counter);
    assert_eq!(attributes[1].unit, Unit::Millisecond);

    assert_eq!(
        outcome.warnings,
        vec![ConfigWarning::MalformedAttributeType {
            attribute: "x".to_string(),
            value: "bogus".to_string(),
        }]
    );
}

#[test]
fn test_malformed_query_pattern_aborts_load() {
    let user = r#"
jmx:
  default_beans:
    - query: "not a valid name"
      attributes: []
"#;
    let (_dir, loader) = setup(Some(user), Some(DEFAULTS));
    let err = loader.load().unwrap_err();
    assert!(matches!(
        err,
        JmxVitalsError::Config(ConfigError::MalformedQueryPattern { .. })
    ));
}

#[test]
fn test_list_wildcard_before_keys_loads() {
    let user = r#"
jmx:
  default_beans:
    - query: "java.lang:*,type=Memory"
      attributes: [HeapMemoryUsage]
"#;
    let (_dir, loader) = setup(Some(user), Some(DEFAULTS));
    let config = loader.load().unwrap();

    let query = &config.default_bean_queries[0];
    assert!(query.object_name.is_property_list_pattern());
    assert_eq!(query.object_name.canonical_name(), "java.lang:type=Memory,*");
}

#[test]
fn test_missing_files_yield_empty_config() {
    let (_dir, loader) = setup(None, None);
    let outcome = loader.load_outcome().unwrap();

    assert!(outcome.config.default_bean_queries.is_empty());
    assert!(outcome.config.process_rules.is_empty());
    assert_eq!(outcome.config.log_level, LogLevel::Info);
    assert!(outcome.warnings.contains(&ConfigWarning::ConfigFileMissing {
        layer: ConfigLayer::User
    }));
    assert!(outcome.warnings.contains(&ConfigWarning::ConfigFileMissing {
        layer: ConfigLayer::Default
    }));
}

#[test]
fn test_explicit_paths_override_candidates() {
    let dir = TempDir::new().unwrap();
    let user_path = dir.path().join("custom.yaml");
    fs::write(&user_path, "log: {file_priority: error}").unwrap();

    let loader = YamlConfigLoader::default()
        .with_user_config(&user_path)
        .with_default_config(dir.path().join("nope.yaml"));
    assert!(matches!(
        loader.load().unwrap_err(),
        JmxVitalsError::Config(ConfigError::FileNotFound { .. })
    ));

    let defaults_path = dir.path().join("defaults.yaml");
    fs::write(&defaults_path, DEFAULTS).unwrap();
    let loader = YamlConfigLoader::default()
        .with_user_config(&user_path)
        .with_default_config(&defaults_path);
    let config = loader.load().unwrap();
    assert_eq!(config.log_level, LogLevel::Error);
    assert_eq!(config.default_bean_queries.len(), 1);
}

#[test]
fn test_invalid_yaml_is_parse_error() {
    let (_dir, loader) = setup(Some("jmx: [unclosed"), Some(DEFAULTS));
    assert!(matches!(
        loader.load().unwrap_err(),
        JmxVitalsError::Config(ConfigError::ParseError(_))
    ));
}
