//! 属性单位注册表
//!
//! 短单位标记（如 `ms`、`KiB`、`%1`）与语义单位枚举之间的双向映射。
//! 未知标记一律解析为 [`Unit::None`]，不会失败。

use serde::{de, Deserialize, Deserializer, Serialize, Serializer};
use std::collections::HashMap;
use std::fmt;
use std::sync::OnceLock;

/// 属性单位
///
/// 序列化为稳定的整数ID（见 [`Unit::id`]），名称只用于显示
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub enum Unit {
    #[default]
    None,

    Second,
    Millisecond,
    Microsecond,
    Nanosecond,
    Minute,
    Hour,
    Day,

    Byte,
    Kilobyte,
    Megabyte,
    Gigabyte,
    Terabyte,
    Kibibyte,
    Mebibyte,
    Gibibyte,
    Tebibyte,

    Kilo,
    Mega,
    Giga,
    Tera,

    /// 以100为基准的百分比
    Percent,
    /// 归一化到1的百分比
    PercentNorm,
}

/// 单位别名表，`None` 没有别名
const ALIASES: &[(&str, Unit)] = &[
    ("s", Unit::Second),
    ("ms", Unit::Millisecond),
    ("us", Unit::Microsecond),
    ("ns", Unit::Nanosecond),
    ("m", Unit::Minute),
    ("h", Unit::Hour),
    ("d", Unit::Day),
    ("B", Unit::Byte),
    ("kB", Unit::Kilobyte),
    ("MB", Unit::Megabyte),
    ("GB", Unit::Gigabyte),
    ("TB", Unit::Terabyte),
    ("KiB", Unit::Kibibyte),
    ("MiB", Unit::Mebibyte),
    ("GiB", Unit::Gibibyte),
    ("TiB", Unit::Tebibyte),
    ("K", Unit::Kilo),
    ("M", Unit::Mega),
    ("G", Unit::Giga),
    ("T", Unit::Tera),
    ("%100", Unit::Percent),
    ("%1", Unit::PercentNorm),
];

static ALIAS_TABLE: OnceLock<HashMap<&'static str, Unit>> = OnceLock::new();

fn alias_table() -> &'static HashMap<&'static str, Unit> {
    ALIAS_TABLE.get_or_init(|| ALIASES.iter().copied().collect())
}

impl Unit {
    /// 所有单位，按ID排序
    pub const ALL: [Unit; 23] = [
        Unit::None,
        Unit::Second,
        Unit::Millisecond,
        Unit::Microsecond,
        Unit::Nanosecond,
        Unit::Minute,
        Unit::Hour,
        Unit::Day,
        Unit::Byte,
        Unit::Kilobyte,
        Unit::Megabyte,
        Unit::Gigabyte,
        Unit::Terabyte,
        Unit::Kibibyte,
        Unit::Mebibyte,
        Unit::Gibibyte,
        Unit::Tebibyte,
        Unit::Kilo,
        Unit::Mega,
        Unit::Giga,
        Unit::Tera,
        Unit::Percent,
        Unit::PercentNorm,
    ];

    /// 解析单位标记
    ///
    /// 精确匹配，不做大小写转换或去空白；未知标记返回 `Unit::None`
    pub fn resolve(token: &str) -> Unit {
        alias_table().get(token).copied().unwrap_or(Unit::None)
    }

    /// 稳定的整数ID
    pub fn id(self) -> u32 {
        match self {
            Unit::None => 0,
            Unit::Second => 1,
            Unit::Millisecond => 2,
            Unit::Microsecond => 3,
            Unit::Nanosecond => 4,
            Unit::Minute => 5,
            Unit::Hour => 6,
            Unit::Day => 7,
            Unit::Byte => 8,
            Unit::Kilobyte => 9,
            Unit::Megabyte => 10,
            Unit::Gigabyte => 11,
            Unit::Terabyte => 12,
            Unit::Kibibyte => 13,
            Unit::Mebibyte => 14,
            Unit::Gibibyte => 15,
            Unit::Tebibyte => 16,
            Unit::Kilo => 17,
            Unit::Mega => 18,
            Unit::Giga => 19,
            Unit::Tera => 20,
            Unit::Percent => 21,
            Unit::PercentNorm => 22,
        }
    }

    /// 根据ID查找单位
    pub fn from_id(id: u32) -> Option<Unit> {
        Self::ALL.iter().copied().find(|unit| unit.id() == id)
    }

    /// 单位的短标记（`None` 没有）
    pub fn alias(self) -> Option<&'static str> {
        ALIASES
            .iter()
            .find(|(_, unit)| *unit == self)
            .map(|(alias, _)| *alias)
    }

    /// 单位名称
    pub fn name(self) -> &'static str {
        match self {
            Unit::None => "NONE",
            Unit::Second => "SECOND",
            Unit::Millisecond => "MILLISECOND",
            Unit::Microsecond => "MICROSECOND",
            Unit::Nanosecond => "NANOSECOND",
            Unit::Minute => "MINUTE",
            Unit::Hour => "HOUR",
            Unit::Day => "DAY",
            Unit::Byte => "BYTE",
            Unit::Kilobyte => "KILOBYTE",
            Unit::Megabyte => "MEGABYTE",
            Unit::Gigabyte => "GIGABYTE",
            Unit::Terabyte => "TERABYTE",
            Unit::Kibibyte => "KIBIBYTE",
            Unit::Mebibyte => "MEBIBYTE",
            Unit::Gibibyte => "GIBIBYTE",
            Unit::Tebibyte => "TEBIBYTE",
            Unit::Kilo => "KILO",
            Unit::Mega => "MEGA",
            Unit::Giga => "GIGA",
            Unit::Tera => "TERA",
            Unit::Percent => "PERCENT",
            Unit::PercentNorm => "PERCENT_NORM",
        }
    }
}

impl fmt::Display for Unit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl Serialize for Unit {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_u32(self.id())
    }
}

impl<'de> Deserialize<'de> for Unit {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let id = u32::deserialize(deserializer)?;
        Unit::from_id(id).ok_or_else(|| de::Error::custom(format!("未知的单位ID: {id}")))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn test_resolve_documented_aliases() {
        assert_eq!(Unit::resolve("s"), Unit::Second);
        assert_eq!(Unit::resolve("ms"), Unit::Millisecond);
        assert_eq!(Unit::resolve("us"), Unit::Microsecond);
        assert_eq!(Unit::resolve("ns"), Unit::Nanosecond);
        assert_eq!(Unit::resolve("m"), Unit::Minute);
        assert_eq!(Unit::resolve("h"), Unit::Hour);
        assert_eq!(Unit::resolve("d"), Unit::Day);
        assert_eq!(Unit::resolve("B"), Unit::Byte);
        assert_eq!(Unit::resolve("kB"), Unit::Kilobyte);
        assert_eq!(Unit::resolve("MB"), Unit::Megabyte);
        assert_eq!(Unit::resolve("GB"), Unit::Gigabyte);
        assert_eq!(Unit::resolve("TB"), Unit::Terabyte);
        assert_eq!(Unit::resolve("KiB"), Unit::Kibibyte);
        assert_eq!(Unit::resolve("MiB"), Unit::Mebibyte);
        assert_eq!(Unit::resolve("GiB"), Unit::Gibibyte);
        assert_eq!(Unit::resolve("TiB"), Unit::Tebibyte);
        assert_eq!(Unit::resolve("K"), Unit::Kilo);
        assert_eq!(Unit::resolve("M"), Unit::Mega);
        assert_eq!(Unit::resolve("G"), Unit::Giga);
        assert_eq!(Unit::resolve("T"), Unit::Tera);
        assert_eq!(Unit::resolve("%100"), Unit::Percent);
        assert_eq!(Unit::resolve("%1"), Unit::PercentNorm);
    }

    #[test]
    fn test_resolve_is_exact() {
        for token in ["", "kb", "KB", " ms", "ms ", "MS", "seconds", "%", "NONE", "%10"] {
            assert_eq!(Unit::resolve(token), Unit::None, "token {token:?}");
        }
    }

    #[test]
    fn test_alias_round_trip() {
        for (alias, unit) in ALIASES {
            assert_eq!(unit.alias(), Some(*alias));
            assert_eq!(Unit::resolve(alias), *unit);
        }
        assert_eq!(Unit::None.alias(), None);
    }

    #[test]
    fn test_ids_are_unique_and_stable() {
        let ids: HashSet<u32> = Unit::ALL.iter().map(|u| u.id()).collect();
        assert_eq!(ids.len(), Unit::ALL.len());

        assert_eq!(Unit::None.id(), 0);
        assert_eq!(Unit::Millisecond.id(), 2);
        assert_eq!(Unit::Tebibyte.id(), 16);
        assert_eq!(Unit::PercentNorm.id(), 22);

        for unit in Unit::ALL {
            assert_eq!(Unit::from_id(unit.id()), Some(unit));
        }
        assert_eq!(Unit::from_id(23), None);
    }

    #[test]
    fn test_unit_serialization() {
        let json = serde_json::to_string(&Unit::PercentNorm).unwrap();
        assert_eq!(json, "22");
        assert_eq!(Unit::Kibibyte.to_string(), "KIBIBYTE");

        let unit: Unit = serde_json::from_str("13").unwrap();
        assert_eq!(unit, Unit::Kibibyte);
        assert!(serde_json::from_str::<Unit>("23").is_err());
        assert!(serde_json::from_str::<Unit>("\"BYTE\"").is_err());
    }
}
