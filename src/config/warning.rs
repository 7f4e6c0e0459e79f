//! 配置加载告警
//!
//! 可恢复的问题不会中断加载，而是以告警形式返回给调用方

use crate::config::layers::ConfigLayer;
use serde::Serialize;
use std::fmt;

/// 加载过程中被吸收的问题
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ConfigWarning {
    /// 属性 `type` 无法识别，已回退为 `rate`
    MalformedAttributeType { attribute: String, value: String },
    /// 某一层配置文件在候选路径中均不存在
    ConfigFileMissing { layer: ConfigLayer },
}

impl fmt::Display for ConfigWarning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigWarning::MalformedAttributeType { attribute, value } => write!(
                f,
                "JMX属性 {attribute} 的类型无效: {value}，可选值: counter, rate；使用默认值 rate"
            ),
            ConfigWarning::ConfigFileMissing { layer } => {
                write!(f, "未找到{layer}配置文件，使用空配置")
            }
        }
    }
}
