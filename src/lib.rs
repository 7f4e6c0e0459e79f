//! JMX Vitals - JMX Bean 采集配置加载器
//!
//! 为指标采集代理加载并校验 JMX Bean 采集配置，支持：
//! - 用户配置与默认配置的双层合并
//! - ObjectName 模式语法校验
//! - 属性类型与单位归一化
//! - 配置热重载
//! - 结构化日志记录

pub mod cli;
pub mod config;
pub mod error;
pub mod logging;

// 重新导出主要类型
pub use config::{BeanAttribute, BeanQuery, Config, ConfigLoader, ProcessRule, YamlConfigLoader};
pub use error::JmxVitalsError;

/// 应用程序版本信息
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// 应用程序名称
pub const APP_NAME: &str = env!("CARGO_PKG_NAME");

/// 应用程序描述
pub const APP_DESCRIPTION: &str = env!("CARGO_PKG_DESCRIPTION");
