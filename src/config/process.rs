//! 按进程覆盖的 Bean 查询规则

use crate::config::query::BeanQuery;
use crate::config::warning::ConfigWarning;
use crate::error::ConfigError;
use serde::Serialize;
use serde_yaml::Value;

/// 进程匹配模式及其专属查询
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ProcessRule {
    /// 进程匹配串，由进程匹配模块使用，此处不校验
    pub pattern: String,
    #[serde(rename = "beans")]
    pub queries: Vec<BeanQuery>,
}

impl ProcessRule {
    /// 由匹配串和查询节点构造，查询缺失时为空列表
    pub fn parse(
        pattern: &str,
        query_nodes: Option<&[Value]>,
        warnings: &mut Vec<ConfigWarning>,
    ) -> Result<Self, ConfigError> {
        let queries = query_nodes
            .unwrap_or_default()
            .iter()
            .map(|node| BeanQuery::from_node(node, warnings))
            .collect::<Result<Vec<_>, _>>()?;

        Ok(Self {
            pattern: pattern.to_string(),
            queries,
        })
    }

    /// 从 `{pattern, beans}` 节点构造
    pub fn from_node(
        rule_name: &str,
        node: &Value,
        warnings: &mut Vec<ConfigWarning>,
    ) -> Result<Self, ConfigError> {
        let shape_error = |path: String, expected: &str| ConfigError::InvalidShape {
            path,
            expected: expected.to_string(),
        };

        let Value::Mapping(entry) = node else {
            return Err(shape_error(rule_name.to_string(), "包含 pattern 和 beans 的记录"));
        };

        let pattern = match entry.get("pattern") {
            Some(Value::String(pattern)) => pattern,
            Some(_) => return Err(shape_error(format!("{rule_name}.pattern"), "字符串")),
            None => {
                return Err(ConfigError::MissingField {
                    context: format!("进程规则 {rule_name}"),
                    field: "pattern".to_string(),
                })
            }
        };

        let beans = match entry.get("beans") {
            None | Some(Value::Null) => None,
            Some(Value::Sequence(nodes)) => Some(nodes.as_slice()),
            Some(_) => return Err(shape_error(format!("{rule_name}.beans"), "列表")),
        };

        Self::parse(pattern, beans, warnings)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn from_yaml(yaml: &str) -> Result<ProcessRule, ConfigError> {
        let node: Value = serde_yaml::from_str(yaml).unwrap();
        ProcessRule::from_node("web", &node, &mut Vec::new())
    }

    #[test]
    fn test_rule_with_beans() {
        let rule = from_yaml(
            r#"
pattern: "tomcat"
beans:
  - query: "Catalina:type=GlobalRequestProcessor,name=*"
    attributes: [requestCount, {name: errorCount, type: counter}]
  - query: "Catalina:type=Manager,*"
"#,
        )
        .unwrap();
        assert_eq!(rule.pattern, "tomcat");
        assert_eq!(rule.queries.len(), 2);
        assert_eq!(rule.queries[0].attributes.len(), 2);
        assert!(rule.queries[1].attributes.is_empty());
    }

    #[test]
    fn test_rule_without_beans() {
        let rule = from_yaml("pattern: kafka").unwrap();
        assert!(rule.queries.is_empty());
    }

    #[test]
    fn test_pattern_is_not_validated() {
        let rule = from_yaml(r#"pattern: "([unbalanced""#).unwrap();
        assert_eq!(rule.pattern, "([unbalanced");
    }

    #[test]
    fn test_bad_query_aborts_rule() {
        let err = from_yaml(
            r#"
pattern: nginx
beans:
  - query: "broken"
"#,
        )
        .unwrap_err();
        assert!(matches!(err, ConfigError::MalformedQueryPattern { .. }));
    }

    #[test]
    fn test_rule_without_pattern() {
        let err = from_yaml("beans: []").unwrap_err();
        assert!(err.to_string().contains("pattern"));
    }
}
