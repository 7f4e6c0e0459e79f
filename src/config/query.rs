//! Bean 查询解析

use crate::config::attribute::BeanAttribute;
use crate::config::object_name::ObjectNamePattern;
use crate::config::warning::ConfigWarning;
use crate::error::ConfigError;
use serde::Serialize;
use serde_yaml::Value;

/// 一个 ObjectName 模式及其需要采集的属性列表
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct BeanQuery {
    #[serde(rename = "query")]
    pub object_name: ObjectNamePattern,
    pub attributes: Vec<BeanAttribute>,
}

impl BeanQuery {
    /// 由查询模式和属性节点构造
    ///
    /// 模式语法错误会中止整个配置加载；属性列表缺失视为空列表
    pub fn parse(
        query_pattern: &str,
        attribute_nodes: Option<&[Value]>,
        warnings: &mut Vec<ConfigWarning>,
    ) -> Result<Self, ConfigError> {
        let object_name = ObjectNamePattern::parse(query_pattern).map_err(|e| {
            ConfigError::MalformedQueryPattern {
                pattern: query_pattern.to_string(),
                reason: e.to_string(),
            }
        })?;

        let attributes = attribute_nodes
            .unwrap_or_default()
            .iter()
            .enumerate()
            .map(|(index, node)| BeanAttribute::from_node(node, query_pattern, index, warnings))
            .collect::<Result<Vec<_>, _>>()?;

        Ok(Self {
            object_name,
            attributes,
        })
    }

    /// 从 `{query, attributes}` 节点构造
    pub fn from_node(node: &Value, warnings: &mut Vec<ConfigWarning>) -> Result<Self, ConfigError> {
        let Value::Mapping(entry) = node else {
            return Err(ConfigError::InvalidShape {
                path: "bean query".to_string(),
                expected: "包含 query 和 attributes 的记录".to_string(),
            });
        };

        let query = match entry.get("query") {
            Some(Value::String(query)) => query,
            Some(_) => {
                return Err(ConfigError::InvalidShape {
                    path: "query".to_string(),
                    expected: "字符串".to_string(),
                })
            }
            None => {
                return Err(ConfigError::MissingField {
                    context: "Bean查询".to_string(),
                    field: "query".to_string(),
                })
            }
        };

        let attributes = match entry.get("attributes") {
            None | Some(Value::Null) => None,
            Some(Value::Sequence(nodes)) => Some(nodes.as_slice()),
            Some(_) => {
                return Err(ConfigError::InvalidShape {
                    path: format!("{query}.attributes"),
                    expected: "列表".to_string(),
                })
            }
        };

        Self::parse(query, attributes, warnings)
    }
}
