//! 双层 YAML 配置合并
//!
//! 用户层覆盖默认层，合并粒度为整键：
//! - 序列：用户层存在该键时整体替换默认层
//! - 映射：按子键合并，同名子键取用户层的完整值

use crate::error::ConfigError;
use serde::Serialize;
use serde_yaml::Value;
use std::collections::BTreeMap;
use std::fmt;

/// 配置层
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ConfigLayer {
    /// 用户配置，可选
    User,
    /// 随程序发布的默认配置
    Default,
}

impl fmt::Display for ConfigLayer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigLayer::User => f.write_str("用户"),
            ConfigLayer::Default => f.write_str("默认"),
        }
    }
}

/// 已解析的两层配置文档
#[derive(Debug, Clone, Default, PartialEq)]
pub struct YamlLayers {
    user: Value,
    defaults: Value,
}

impl YamlLayers {
    /// 由已解析的文档构造，缺失的层为空
    pub fn new(user: Option<Value>, defaults: Option<Value>) -> Self {
        Self {
            user: user.unwrap_or(Value::Null),
            defaults: defaults.unwrap_or(Value::Null),
        }
    }

    /// 由 YAML 文本构造
    pub fn from_strings(user: Option<&str>, defaults: Option<&str>) -> Result<Self, ConfigError> {
        Ok(Self::new(
            user.map(|text| parse_document(text, ConfigLayer::User)).transpose()?,
            defaults
                .map(|text| parse_document(text, ConfigLayer::Default))
                .transpose()?,
        ))
    }

    fn layer(&self, layer: ConfigLayer) -> &Value {
        match layer {
            ConfigLayer::User => &self.user,
            ConfigLayer::Default => &self.defaults,
        }
    }

    /// 查找点分路径，值为 null 视为不存在
    pub fn lookup(&self, layer: ConfigLayer, path: &str) -> Option<&Value> {
        path.split('.')
            .try_fold(self.layer(layer), |node, key| node.get(key))
            .filter(|node| !node.is_null())
    }

    /// 读取单个字符串值，用户层优先
    pub fn get_single(&self, path: &str) -> Option<&str> {
        self.lookup(ConfigLayer::User, path)
            .or_else(|| self.lookup(ConfigLayer::Default, path))
            .and_then(Value::as_str)
    }

    /// 读取字符串值，缺失时返回默认值
    pub fn get_single_or<'a>(&'a self, path: &str, default: &'a str) -> &'a str {
        self.get_single(path).unwrap_or(default)
    }

    /// 读取合并后的序列并逐项转换
    ///
    /// 用户层存在该键时整体替换默认层的序列
    pub fn get_merged_sequence<T, F>(&self, path: &str, mut parse: F) -> Result<Vec<T>, ConfigError>
    where
        F: FnMut(&Value) -> Result<T, ConfigError>,
    {
        let node = self
            .lookup(ConfigLayer::User, path)
            .or_else(|| self.lookup(ConfigLayer::Default, path));

        match node {
            None => Ok(Vec::new()),
            Some(Value::Sequence(items)) => items.iter().map(&mut parse).collect(),
            Some(_) => Err(ConfigError::InvalidShape {
                path: path.to_string(),
                expected: "列表".to_string(),
            }),
        }
    }

    /// 读取合并后的映射并逐项转换
    ///
    /// 两层同名键取用户层的完整值，仅存在于一层的键原样保留
    pub fn get_merged_map<T, F>(
        &self,
        path: &str,
        mut parse: F,
    ) -> Result<BTreeMap<String, T>, ConfigError>
    where
        F: FnMut(&str, &Value) -> Result<T, ConfigError>,
    {
        let mut merged: BTreeMap<String, &Value> = BTreeMap::new();

        for layer in [ConfigLayer::Default, ConfigLayer::User] {
            let Some(node) = self.lookup(layer, path) else {
                continue;
            };
            let Value::Mapping(entries) = node else {
                return Err(ConfigError::InvalidShape {
                    path: path.to_string(),
                    expected: "映射".to_string(),
                });
            };
            for (key, value) in entries {
                let Some(key) = key.as_str() else {
                    return Err(ConfigError::InvalidShape {
                        path: format!("{path} 的键"),
                        expected: "字符串".to_string(),
                    });
                };
                merged.insert(key.to_string(), value);
            }
        }

        merged
            .into_iter()
            .map(|(key, value)| parse(&key, value).map(|parsed| (key, parsed)))
            .collect()
    }
}

/// 解析单层文档，空文档视为空层
fn parse_document(text: &str, layer: ConfigLayer) -> Result<Value, ConfigError> {
    let blank = text
        .lines()
        .map(str::trim)
        .all(|line| line.is_empty() || line.starts_with('#'));
    if blank {
        return Ok(Value::Null);
    }

    let document: Value = serde_yaml::from_str(text)
        .map_err(|e| ConfigError::ParseError(format!("{layer}配置YAML解析失败: {e}")))?;

    match document {
        Value::Null | Value::Mapping(_) => Ok(document),
        _ => Err(ConfigError::InvalidShape {
            path: format!("{layer}配置根节点"),
            expected: "映射".to_string(),
        }),
    }
}
