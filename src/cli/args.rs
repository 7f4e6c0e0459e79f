//! 命令行参数定义
//!
//! 使用clap定义应用程序的命令行接口

use crate::config::{LogLevel, YamlConfigLoader};
use crate::logging::LogConfig;
use clap::{Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

/// JMX Vitals - JMX Bean 采集配置工具
#[derive(Parser, Debug, Clone)]
#[command(
    name = "jmx-vitals",
    version = crate::VERSION,
    about = crate::APP_DESCRIPTION,
    long_about = None
)]
pub struct Args {
    /// 用户配置文件路径，替代默认的候选路径
    #[arg(
        short,
        long,
        value_name = "FILE",
        help = "用户配置文件路径",
        env = "JMX_VITALS_CONFIG",
        global = true
    )]
    pub config: Option<PathBuf>,

    /// 默认配置文件路径，替代默认的候选路径
    #[arg(
        long,
        value_name = "FILE",
        help = "默认配置文件路径",
        env = "JMX_VITALS_DEFAULTS",
        global = true
    )]
    pub defaults: Option<PathBuf>,

    /// 日志级别，未指定时使用配置文件中的 log.file_priority
    #[arg(
        short,
        long,
        value_enum,
        help = "日志级别（覆盖配置文件）",
        env = "JMX_VITALS_LOG_LEVEL",
        global = true
    )]
    pub log_level: Option<LogLevelArg>,

    /// 日志写入文件而不是控制台
    #[arg(long, value_name = "FILE", help = "日志文件路径", global = true)]
    pub log_file: Option<PathBuf>,

    /// 以JSON格式输出日志
    #[arg(long, help = "以JSON格式输出日志", global = true)]
    pub log_json: bool,

    /// 是否替换配置中的 ${VAR} 环境变量
    #[arg(long, help = "启用环境变量替换", global = true)]
    pub env_substitution: bool,

    /// 子命令
    #[command(subcommand)]
    pub command: Commands,
}

impl Args {
    /// 按命令行参数构造配置加载器
    pub fn loader(&self) -> YamlConfigLoader {
        let mut loader = YamlConfigLoader::new(self.env_substitution);
        if let Some(path) = &self.config {
            loader = loader.with_user_config(path);
        }
        if let Some(path) = &self.defaults {
            loader = loader.with_default_config(path);
        }
        loader
    }

    /// 按命令行参数和已解析的日志级别构造日志配置
    pub fn log_config(&self, level: LogLevel) -> LogConfig {
        LogConfig {
            file_path: self.log_file.clone(),
            console: self.log_file.is_none(),
            json_format: self.log_json,
            ..LogConfig::for_level(level)
        }
    }
}

/// 日志级别枚举
#[derive(ValueEnum, Clone, Copy, Debug, PartialEq)]
pub enum LogLevelArg {
    /// 错误级别
    Error,
    /// 警告级别
    Warning,
    /// 信息级别
    Info,
    /// 调试级别
    Debug,
}

impl From<LogLevelArg> for LogLevel {
    fn from(level: LogLevelArg) -> Self {
        match level {
            LogLevelArg::Error => LogLevel::Error,
            LogLevelArg::Warning => LogLevel::Warning,
            LogLevelArg::Info => LogLevel::Info,
            LogLevelArg::Debug => LogLevel::Debug,
        }
    }
}

/// 子命令定义
#[derive(Subcommand, Debug, Clone)]
pub enum Commands {
    /// 加载并校验配置
    Validate {
        /// 显示详细信息
        #[arg(short, long, help = "显示详细信息")]
        verbose: bool,
    },

    /// 输出合并后的配置
    Show {
        /// 输出格式
        #[arg(
            short,
            long,
            value_enum,
            default_value = "text",
            help = "输出格式"
        )]
        format: OutputFormat,
    },

    /// 列出支持的单位标记
    Units {
        /// 输出格式
        #[arg(
            short,
            long,
            value_enum,
            default_value = "text",
            help = "输出格式"
        )]
        format: OutputFormat,
    },

    /// 监控配置文件并在变更时重载
    Watch {
        /// 防抖动延迟（毫秒）
        #[arg(
            long,
            value_name = "MILLIS",
            default_value = "500",
            help = "防抖动延迟（毫秒）"
        )]
        debounce_ms: u64,
    },

    /// 显示版本信息
    Version {
        /// 输出格式
        #[arg(
            short,
            long,
            value_enum,
            default_value = "text",
            help = "输出格式"
        )]
        format: OutputFormat,
    },
}

/// 输出格式
#[derive(ValueEnum, Clone, Copy, Debug, PartialEq)]
pub enum OutputFormat {
    /// 纯文本格式
    Text,
    /// JSON格式
    Json,
    /// YAML格式
    Yaml,
}
