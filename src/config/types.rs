//! 配置数据结构定义
//!
//! 定义配置根结构、日志级别以及从合并后的配置层构造它们的逻辑

use crate::config::layers::YamlLayers;
use crate::config::process::ProcessRule;
use crate::config::query::BeanQuery;
use crate::config::warning::ConfigWarning;
use crate::error::ConfigError;
use serde::Serialize;
use std::collections::BTreeMap;
use std::fmt;

/// 日志级别配置键
pub const LOG_LEVEL_KEY: &str = "log.file_priority";
/// 默认 Bean 查询配置键
pub const DEFAULT_BEANS_KEY: &str = "jmx.default_beans";
/// 按进程覆盖的查询配置键
pub const PER_PROCESS_BEANS_KEY: &str = "jmx.per_process_beans";

/// 配置中的日志级别，按严重程度排序
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum LogLevel {
    Error,
    Warning,
    #[default]
    Info,
    Debug,
}

impl LogLevel {
    /// 解析配置值，无法识别时静默回退为 `info`
    pub fn from_config_str(text: &str) -> Self {
        match text {
            "error" => LogLevel::Error,
            "warning" => LogLevel::Warning,
            "info" => LogLevel::Info,
            "debug" => LogLevel::Debug,
            _ => LogLevel::Info,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            LogLevel::Error => "error",
            LogLevel::Warning => "warning",
            LogLevel::Info => "info",
            LogLevel::Debug => "debug",
        }
    }
}

impl From<LogLevel> for log::LevelFilter {
    fn from(level: LogLevel) -> Self {
        match level {
            LogLevel::Error => log::LevelFilter::Error,
            LogLevel::Warning => log::LevelFilter::Warn,
            LogLevel::Info => log::LevelFilter::Info,
            LogLevel::Debug => log::LevelFilter::Debug,
        }
    }
}

impl fmt::Display for LogLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// 主配置结构
///
/// 启动时构造一次，之后只读；重载时整体替换
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct Config {
    /// 日志级别
    pub log_level: LogLevel,
    /// 对所有进程生效的查询，顺序即采集顺序
    pub default_bean_queries: Vec<BeanQuery>,
    /// 规则名到进程规则的映射
    pub process_rules: BTreeMap<String, ProcessRule>,
}

impl Config {
    /// 从合并后的配置层构造配置
    ///
    /// # 参数
    /// * `layers` - 用户层与默认层
    /// * `warnings` - 可恢复问题的收集器
    ///
    /// # 返回
    /// * `Result<Config, ConfigError>` - 任一查询无效都会中止整个构造
    pub fn from_layers(
        layers: &YamlLayers,
        warnings: &mut Vec<ConfigWarning>,
    ) -> Result<Self, ConfigError> {
        let log_level = LogLevel::from_config_str(
            layers.get_single_or(LOG_LEVEL_KEY, LogLevel::default().as_str()),
        );

        let default_bean_queries = layers
            .get_merged_sequence(DEFAULT_BEANS_KEY, |node| BeanQuery::from_node(node, warnings))?;

        let process_rules = layers.get_merged_map(PER_PROCESS_BEANS_KEY, |name, node| {
            ProcessRule::from_node(name, node, warnings)
        })?;

        Ok(Self {
            log_level,
            default_bean_queries,
            process_rules,
        })
    }

    /// 查询总数（默认查询加所有规则的查询）
    pub fn query_count(&self) -> usize {
        self.default_bean_queries.len()
            + self
                .process_rules
                .values()
                .map(|rule| rule.queries.len())
                .sum::<usize>()
    }

    /// 不采集任何属性的查询，合法但无用
    pub fn queries_without_attributes(&self) -> Vec<(Option<&str>, &BeanQuery)> {
        let defaults = self.default_bean_queries.iter().map(|query| (None, query));
        let per_rule = self.process_rules.iter().flat_map(|(name, rule)| {
            rule.queries
                .iter()
                .map(move |query| (Some(name.as_str()), query))
        });

        defaults
            .chain(per_rule)
            .filter(|(_, query)| query.attributes.is_empty())
            .collect()
    }
}
