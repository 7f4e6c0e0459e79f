//! 错误处理模块
//!
//! 定义应用程序的统一错误类型

use thiserror::Error;

/// JMX Vitals 应用程序的主要错误类型
#[derive(Error, Debug)]
pub enum JmxVitalsError {
    /// 配置相关错误
    #[error("配置错误: {0}")]
    Config(#[from] ConfigError),

    /// IO错误
    #[error("IO错误: {0}")]
    Io(#[from] std::io::Error),

    /// YAML序列化/反序列化错误
    #[error("YAML错误: {0}")]
    Yaml(#[from] serde_yaml::Error),

    /// JSON序列化/反序列化错误
    #[error("JSON错误: {0}")]
    Json(#[from] serde_json::Error),

    /// 其他错误
    #[error("其他错误: {0}")]
    Other(#[from] anyhow::Error),
}

/// 配置错误类型
#[derive(Error, Debug)]
pub enum ConfigError {
    /// 配置文件解析错误
    #[error("配置文件解析失败: {0}")]
    ParseError(String),

    /// 配置文件不存在
    #[error("配置文件不存在: {path}")]
    FileNotFound { path: String },

    /// 查询模式不符合 ObjectName 语法
    #[error("无效的Bean查询模式 {pattern:?}: {reason}")]
    MalformedQueryPattern { pattern: String, reason: String },

    /// 属性声明既不是字符串也不是合法的记录
    #[error("查询 {query:?} 的第 {index} 个属性无效: {reason}")]
    MalformedAttribute {
        query: String,
        index: usize,
        reason: String,
    },

    /// 缺少必需字段
    #[error("{context} 缺少必需字段 `{field}`")]
    MissingField { context: String, field: String },

    /// 配置节点类型不匹配
    #[error("配置项 {path} 类型错误，期望 {expected}")]
    InvalidShape { path: String, expected: String },

    /// 环境变量替换错误
    #[error("环境变量替换失败: {var}")]
    EnvVarError { var: String },
}

/// 结果类型别名
pub type Result<T> = std::result::Result<T, JmxVitalsError>;
