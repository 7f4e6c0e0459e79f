//! Bean 属性解析
//!
//! 属性声明有两种写法：
//! - 字符串简写 `HeapMemoryUsage`
//! - 记录 `{name, type?, unit?}`

use crate::config::unit::Unit;
use crate::config::warning::ConfigWarning;
use crate::error::ConfigError;
use serde::Serialize;
use serde_yaml::Value;
use std::fmt;
use tracing::error;

/// 属性值类型
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum BeanAttributeType {
    /// 单调递增的原始计数
    Counter,
    /// 已按周期计算好的值
    #[default]
    Rate,
}

impl BeanAttributeType {
    /// 大小写不敏感地解析类型名
    pub fn parse(text: &str) -> Option<Self> {
        match text.to_lowercase().as_str() {
            "counter" => Some(Self::Counter),
            "rate" => Some(Self::Rate),
            _ => None,
        }
    }
}

impl fmt::Display for BeanAttributeType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Counter => f.write_str("counter"),
            Self::Rate => f.write_str("rate"),
        }
    }
}

/// 单个需要采集的 Bean 属性
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct BeanAttribute {
    pub name: String,
    #[serde(rename = "type")]
    pub kind: BeanAttributeType,
    pub unit: Unit,
}

/// 属性声明节点的两种形态
#[derive(Debug, Clone, Copy)]
pub enum AttributeNode<'a> {
    /// 字符串简写
    ScalarName(&'a str),
    /// 结构化记录
    Record {
        name: Option<&'a Value>,
        kind: Option<&'a Value>,
        unit: Option<&'a Value>,
    },
}

impl<'a> AttributeNode<'a> {
    /// 按节点形态分类，数字、布尔、列表等返回 `None`
    pub fn classify(node: &'a Value) -> Option<Self> {
        match node {
            Value::String(name) => Some(Self::ScalarName(name)),
            Value::Mapping(record) => Some(Self::Record {
                name: record.get("name"),
                kind: record.get("type"),
                unit: record.get("unit"),
            }),
            _ => None,
        }
    }
}

impl BeanAttribute {
    /// 仅有名称的属性：`rate` 类型，无单位
    pub fn named(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            kind: BeanAttributeType::Rate,
            unit: Unit::None,
        }
    }

    /// 解析一个属性声明节点
    ///
    /// # 参数
    /// * `node` - 属性节点
    /// * `query` - 所属查询（用于错误信息）
    /// * `index` - 属性在列表中的位置
    /// * `warnings` - 可恢复问题的收集器
    ///
    /// # 返回
    /// * `Result<Self, ConfigError>` - 无法识别的节点形态或缺少 `name` 时返回错误
    pub fn from_node(
        node: &Value,
        query: &str,
        index: usize,
        warnings: &mut Vec<ConfigWarning>,
    ) -> Result<Self, ConfigError> {
        let malformed = |reason: &str| ConfigError::MalformedAttribute {
            query: query.to_string(),
            index,
            reason: reason.to_string(),
        };

        let Some(shape) = AttributeNode::classify(node) else {
            return Err(malformed("属性必须是字符串或包含 name 的记录"));
        };

        match shape {
            AttributeNode::ScalarName(name) => {
                if name.is_empty() {
                    return Err(malformed("属性名不能为空"));
                }
                Ok(Self::named(name))
            }
            AttributeNode::Record { name, kind, unit } => {
                let name = match name {
                    Some(Value::String(name)) if !name.is_empty() => name.clone(),
                    Some(Value::String(_)) => return Err(malformed("属性名不能为空")),
                    Some(_) => return Err(malformed("name 字段必须是字符串")),
                    None => return Err(malformed("缺少 name 字段")),
                };

                let kind = match kind {
                    None => BeanAttributeType::Rate,
                    Some(value) => {
                        let parsed = match value {
                            Value::String(text) => BeanAttributeType::parse(text),
                            _ => None,
                        };
                        parsed.unwrap_or_else(|| {
                            let warning = ConfigWarning::MalformedAttributeType {
                                attribute: name.clone(),
                                value: render_scalar(value),
                            };
                            error!("{}", warning);
                            warnings.push(warning);
                            BeanAttributeType::Rate
                        })
                    }
                };

                let unit = unit
                    .map(|value| Unit::resolve(&render_scalar(value)))
                    .unwrap_or(Unit::None);

                Ok(Self { name, kind, unit })
            }
        }
    }
}

/// 标量节点转文本，非标量为空串
fn render_scalar(value: &Value) -> String {
    match value {
        Value::String(text) => text.clone(),
        Value::Number(number) => number.to_string(),
        Value::Bool(flag) => flag.to_string(),
        Value::Null => "null".to_string(),
        Value::Tagged(tagged) => render_scalar(&tagged.value),
        Value::Sequence(_) | Value::Mapping(_) => String::new(),
    }
}
