//! Bean ObjectName 模式解析
//!
//! 语法: `domain:key=value[,key=value...]`，支持通配符:
//! - 域名中的 `*` / `?`
//! - 属性值中的 `*` / `?`
//! - 属性列表中的单个 `*`，位置不限

use serde::{Serialize, Serializer};
use std::fmt;
use std::str::FromStr;

/// 已通过语法校验的 ObjectName 模式
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ObjectNamePattern {
    /// 原始文本
    raw: String,
    /// 域名部分
    domain: String,
    /// 键属性，保持声明顺序
    properties: Vec<(String, String)>,
    /// 属性列表中是否含有通配符 `*`
    property_list_pattern: bool,
    /// 是否有属性值包含通配符
    property_value_pattern: bool,
}

/// 语法错误描述
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ObjectNameSyntaxError(pub String);

impl fmt::Display for ObjectNameSyntaxError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl std::error::Error for ObjectNameSyntaxError {}

fn syntax_error<T>(msg: impl Into<String>) -> Result<T, ObjectNameSyntaxError> {
    Err(ObjectNameSyntaxError(msg.into()))
}

impl ObjectNamePattern {
    /// 解析并校验 ObjectName 模式
    pub fn parse(text: &str) -> Result<Self, ObjectNameSyntaxError> {
        let Some(colon) = text.find(':') else {
            return syntax_error("缺少域名分隔符 ':'");
        };

        let domain = &text[..colon];
        if domain.contains('\n') {
            return syntax_error("域名不能包含换行符");
        }

        let list = &text[colon + 1..];
        if list.is_empty() {
            return syntax_error("键属性列表不能为空");
        }

        let chars: Vec<char> = list.chars().collect();
        let mut pos = 0;
        let mut properties: Vec<(String, String)> = Vec::new();
        let mut property_list_pattern = false;
        let mut property_value_pattern = false;

        while pos < chars.len() {
            if chars[pos] == '*' {
                // 通配符可以出现在列表任意位置，但只能有一个
                if property_list_pattern {
                    return syntax_error("属性列表中只能有一个 '*'");
                }
                property_list_pattern = true;
                pos += 1;
            } else {
                let key = Self::read_key(&chars, &mut pos)?;
                if properties.iter().any(|(existing, _)| *existing == key) {
                    return syntax_error(format!("重复的键: {key}"));
                }

                let (value, is_pattern) = if chars.get(pos) == Some(&'"') {
                    Self::read_quoted_value(&chars, &mut pos)?
                } else {
                    Self::read_unquoted_value(&chars, &mut pos)?
                };
                property_value_pattern |= is_pattern;
                properties.push((key, value));
            }

            match chars.get(pos) {
                None => break,
                Some(',') => {
                    pos += 1;
                    if pos == chars.len() {
                        return syntax_error("属性列表不能以 ',' 结尾");
                    }
                }
                Some(c) => return syntax_error(format!("属性后出现意外字符 {c:?}")),
            }
        }

        Ok(Self {
            raw: text.to_string(),
            domain: domain.to_string(),
            properties,
            property_list_pattern,
            property_value_pattern,
        })
    }

    fn read_key(chars: &[char], pos: &mut usize) -> Result<String, ObjectNameSyntaxError> {
        let start = *pos;
        while let Some(&c) = chars.get(*pos) {
            match c {
                '=' => break,
                ':' | ',' | '*' | '?' | '\n' => {
                    return syntax_error(format!("键中包含非法字符 {c:?}"));
                }
                _ => *pos += 1,
            }
        }
        if *pos >= chars.len() {
            return syntax_error("键属性缺少 '='");
        }
        if *pos == start {
            return syntax_error("键不能为空");
        }
        let key: String = chars[start..*pos].iter().collect();
        *pos += 1;
        Ok(key)
    }

    fn read_unquoted_value(
        chars: &[char],
        pos: &mut usize,
    ) -> Result<(String, bool), ObjectNameSyntaxError> {
        let start = *pos;
        let mut is_pattern = false;
        while let Some(&c) = chars.get(*pos) {
            match c {
                ',' => break,
                ':' | '"' | '=' | '\n' => {
                    return syntax_error(format!("属性值中包含非法字符 {c:?}"));
                }
                '*' | '?' => {
                    is_pattern = true;
                    *pos += 1;
                }
                _ => *pos += 1,
            }
        }
        if *pos == start {
            return syntax_error("属性值不能为空");
        }
        Ok((chars[start..*pos].iter().collect(), is_pattern))
    }

    /// 引号值保留两侧引号和转义序列原样
    fn read_quoted_value(
        chars: &[char],
        pos: &mut usize,
    ) -> Result<(String, bool), ObjectNameSyntaxError> {
        let start = *pos;
        let mut is_pattern = false;
        *pos += 1;
        loop {
            match chars.get(*pos) {
                None => return syntax_error("引号值未闭合"),
                Some('"') => {
                    *pos += 1;
                    break;
                }
                Some('\\') => match chars.get(*pos + 1) {
                    Some('\\' | '"' | '*' | '?' | 'n') => *pos += 2,
                    Some(c) => return syntax_error(format!("引号值中的非法转义 \\{c}")),
                    None => return syntax_error("引号值未闭合"),
                },
                Some('\n') => return syntax_error("引号值中不能包含换行符"),
                Some('*' | '?') => {
                    is_pattern = true;
                    *pos += 1;
                }
                Some(_) => *pos += 1,
            }
        }
        Ok((chars[start..*pos].iter().collect(), is_pattern))
    }

    /// 域名部分
    pub fn domain(&self) -> &str {
        &self.domain
    }

    /// 键属性（声明顺序）
    pub fn properties(&self) -> &[(String, String)] {
        &self.properties
    }

    /// 按键查找属性值
    pub fn key_property(&self, key: &str) -> Option<&str> {
        self.properties
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.as_str())
    }

    pub fn is_domain_pattern(&self) -> bool {
        self.domain.contains(['*', '?'])
    }

    pub fn is_property_list_pattern(&self) -> bool {
        self.property_list_pattern
    }

    pub fn is_property_value_pattern(&self) -> bool {
        self.property_value_pattern
    }

    /// 是否为模式（可匹配多个Bean）
    pub fn is_pattern(&self) -> bool {
        self.is_domain_pattern() || self.property_list_pattern || self.property_value_pattern
    }

    /// 规范名称：键按字典序排列
    pub fn canonical_name(&self) -> String {
        let mut sorted: Vec<&(String, String)> = self.properties.iter().collect();
        sorted.sort_by(|a, b| a.0.cmp(&b.0));

        let mut list = sorted
            .iter()
            .map(|(k, v)| format!("{k}={v}"))
            .collect::<Vec<_>>()
            .join(",");
        if self.property_list_pattern {
            if list.is_empty() {
                list.push('*');
            } else {
                list.push_str(",*");
            }
        }
        format!("{}:{}", self.domain, list)
    }

    /// 原始文本
    pub fn as_str(&self) -> &str {
        &self.raw
    }
}

impl FromStr for ObjectNamePattern {
    type Err = ObjectNameSyntaxError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl fmt::Display for ObjectNamePattern {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.raw)
    }
}

impl Serialize for ObjectNamePattern {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.raw)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_simple_name() {
        let name = ObjectNamePattern::parse("java.lang:type=Memory").unwrap();
        assert_eq!(name.domain(), "java.lang");
        assert_eq!(name.key_property("type"), Some("Memory"));
        assert!(!name.is_pattern());
        assert_eq!(name.to_string(), "java.lang:type=Memory");
    }

    #[test]
    fn test_value_and_list_patterns() {
        let gc = ObjectNamePattern::parse("java.lang:type=GarbageCollector,name=*").unwrap();
        assert!(gc.is_property_value_pattern());
        assert!(!gc.is_property_list_pattern());
        assert!(gc.is_pattern());

        let all = ObjectNamePattern::parse("java.lang:*").unwrap();
        assert!(all.is_property_list_pattern());
        assert!(all.properties().is_empty());

        let trailing = ObjectNamePattern::parse("Catalina:type=Manager,*").unwrap();
        assert!(trailing.is_property_list_pattern());
        assert_eq!(trailing.properties().len(), 1);

        let domain = ObjectNamePattern::parse("*:type=Foo").unwrap();
        assert!(domain.is_domain_pattern());
    }

    #[test]
    fn test_quoted_values() {
        let name = ObjectNamePattern::parse(r#"Catalina:type=ThreadPool,name="http-nio-8080""#)
            .unwrap();
        assert_eq!(name.key_property("name"), Some(r#""http-nio-8080""#));
        assert!(!name.is_pattern());

        let with_comma = ObjectNamePattern::parse(r#"d:k="a,b\"c""#).unwrap();
        assert_eq!(with_comma.key_property("k"), Some(r#""a,b\"c""#));

        assert!(ObjectNamePattern::parse(r#"d:k="open"#).is_err());
        assert!(ObjectNamePattern::parse(r#"d:k="bad\x""#).is_err());
        assert!(ObjectNamePattern::parse(r#"d:k="a"b"#).is_err());
    }

    #[test]
    fn test_malformed_names() {
        for text in [
            "not a valid name",
            "",
            "java.lang:",
            "java.lang:type",
            "java.lang:=Memory",
            "java.lang:type=",
            "java.lang:type=Memory,",
            "java.lang:type=Memory,type=Heap",
            "java.lang:ty*pe=Memory",
            "java.lang:type=a:b",
            "java.lang:type=Memory,,name=x",
            "d:*,*",
            "d:type=Memory,*,*",
            "d:*x",
            "d:*,",
        ] {
            assert!(ObjectNamePattern::parse(text).is_err(), "{text:?} should fail");
        }
    }

    #[test]
    fn test_list_wildcard_in_any_position() {
        let leading = ObjectNamePattern::parse("java.lang:*,type=Memory").unwrap();
        assert!(leading.is_property_list_pattern());
        assert_eq!(leading.key_property("type"), Some("Memory"));
        assert_eq!(leading.canonical_name(), "java.lang:type=Memory,*");
        assert_eq!(leading.as_str(), "java.lang:*,type=Memory");

        let middle = ObjectNamePattern::parse("d:type=Memory,*,name=x").unwrap();
        assert!(middle.is_property_list_pattern());
        assert_eq!(middle.properties().len(), 2);
        assert_eq!(middle.canonical_name(), "d:name=x,type=Memory,*");
    }

    #[test]
    fn test_canonical_name_sorts_keys() {
        let name = ObjectNamePattern::parse("d:type=Foo,name=Bar,*").unwrap();
        assert_eq!(name.canonical_name(), "d:name=Bar,type=Foo,*");
        assert_eq!(name.as_str(), "d:type=Foo,name=Bar,*");

        let all = ObjectNamePattern::parse("d:*").unwrap();
        assert_eq!(all.canonical_name(), "d:*");
    }

    #[test]
    fn test_empty_domain_is_allowed() {
        let name: ObjectNamePattern = ":type=Foo".parse().unwrap();
        assert_eq!(name.domain(), "");
    }
}
