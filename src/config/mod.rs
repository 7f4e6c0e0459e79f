//! 配置管理模块
//!
//! 提供JMX Bean采集配置的解析、双层合并、校验和热重载功能

pub mod attribute;
pub mod layers;
pub mod loader;
pub mod manager;
pub mod object_name;
pub mod process;
pub mod query;
pub mod types;
pub mod unit;
pub mod warning;
pub mod watcher;

// 重新导出主要类型
pub use attribute::{BeanAttribute, BeanAttributeType};
pub use layers::{ConfigLayer, YamlLayers};
pub use loader::{ConfigLoader, ConfigSources, LoadOutcome, YamlConfigLoader};
pub use manager::{ConfigDiff, ConfigManager, ConfigUpdateNotification};
pub use object_name::ObjectNamePattern;
pub use process::ProcessRule;
pub use query::BeanQuery;
pub use types::{Config, LogLevel};
pub use unit::Unit;
pub use warning::ConfigWarning;
pub use watcher::{ConfigChangeEvent, ConfigWatcher};
