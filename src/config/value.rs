//! Setting values and the tree they live in.

use serde::{Deserialize, Deserializer, Serialize};
use serde_yaml::Value as Yaml;
use std::collections::BTreeMap;
use std::fmt;

/// A mapping from keys to values.
///
/// At the top level, entries whose value is a [`SettingValue::Mapping`] are
/// sections; any other top-level entry is a bare key.
pub type ConfigTree = BTreeMap<String, SettingValue>;

/// Numeric setting value.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(untagged)]
pub enum Number {
    Int(i64),
    Float(f64),
}

impl Number {
    pub fn as_f64(&self) -> f64 {
        match *self {
            Number::Int(i) => i as f64,
            Number::Float(f) => f,
        }
    }

    pub fn is_zero(&self) -> bool {
        self.as_f64() == 0.0
    }
}

impl fmt::Display for Number {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Number::Int(i) => write!(f, "{}", i),
            Number::Float(x) => write!(f, "{}", x),
        }
    }
}

/// A single setting value.
///
/// Deserializes from any self-describing format. Scalar mapping keys
/// (`80: http`, `true: on`) are stored as their text form.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum SettingValue {
    Null,
    Bool(bool),
    Number(Number),
    String(String),
    List(Vec<SettingValue>),
    Mapping(ConfigTree),
}

impl SettingValue {
    pub fn as_str(&self) -> Option<&str> {
        match self {
            SettingValue::String(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            SettingValue::Bool(b) => Some(*b),
            _ => None,
        }
    }

    pub fn as_i64(&self) -> Option<i64> {
        match self {
            SettingValue::Number(Number::Int(i)) => Some(*i),
            _ => None,
        }
    }

    pub fn as_f64(&self) -> Option<f64> {
        match self {
            SettingValue::Number(n) => Some(n.as_f64()),
            _ => None,
        }
    }

    pub fn as_mapping(&self) -> Option<&ConfigTree> {
        match self {
            SettingValue::Mapping(m) => Some(m),
            _ => None,
        }
    }

    /// Whether this value switches a flag on.
    ///
    /// Null, `false`, zero, the empty string, `"0"` and empty collections
    /// are falsy; everything else is truthy.
    pub fn is_truthy(&self) -> bool {
        match self {
            SettingValue::Null => false,
            SettingValue::Bool(b) => *b,
            SettingValue::Number(n) => !n.is_zero(),
            SettingValue::String(s) => !(s.is_empty() || s == "0"),
            SettingValue::List(items) => !items.is_empty(),
            SettingValue::Mapping(map) => !map.is_empty(),
        }
    }
}

impl TryFrom<Yaml> for SettingValue {
    type Error = String;

    fn try_from(value: Yaml) -> Result<Self, Self::Error> {
        Ok(match value {
            Yaml::Null => SettingValue::Null,
            Yaml::Bool(b) => SettingValue::Bool(b),
            Yaml::Number(n) => match n.as_i64() {
                Some(i) => SettingValue::Number(Number::Int(i)),
                None => n
                    .as_f64()
                    .map(|f| SettingValue::Number(Number::Float(f)))
                    .ok_or_else(|| format!("unsupported number {}", n))?,
            },
            Yaml::String(s) => SettingValue::String(s),
            Yaml::Sequence(items) => SettingValue::List(
                items
                    .into_iter()
                    .map(SettingValue::try_from)
                    .collect::<Result<_, _>>()?,
            ),
            Yaml::Mapping(map) => {
                let mut tree = ConfigTree::new();
                for (key, value) in map {
                    tree.insert(mapping_key(key)?, SettingValue::try_from(value)?);
                }
                SettingValue::Mapping(tree)
            }
            Yaml::Tagged(tagged) => {
                let serde_yaml::value::TaggedValue { value, .. } = *tagged;
                SettingValue::try_from(value)?
            }
        })
    }
}

/// Text form of a mapping key; only scalars can be keys.
fn mapping_key(key: Yaml) -> Result<String, String> {
    match key {
        Yaml::String(s) => Ok(s),
        Yaml::Number(n) => Ok(n.to_string()),
        Yaml::Bool(b) => Ok(b.to_string()),
        Yaml::Tagged(tagged) => {
            let serde_yaml::value::TaggedValue { value, .. } = *tagged;
            mapping_key(value)
        }
        Yaml::Null => Err("null mapping key is not supported".to_string()),
        Yaml::Sequence(_) | Yaml::Mapping(_) => {
            Err("mapping keys must be strings, numbers or booleans".to_string())
        }
    }
}

impl<'de> Deserialize<'de> for SettingValue {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let value = Yaml::deserialize(deserializer)?;
        SettingValue::try_from(value).map_err(serde::de::Error::custom)
    }
}

impl fmt::Display for SettingValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SettingValue::Null => Ok(()),
            SettingValue::Bool(b) => write!(f, "{}", b),
            SettingValue::Number(n) => write!(f, "{}", n),
            SettingValue::String(s) => f.write_str(s),
            // Collections print as compact JSON
            SettingValue::List(_) | SettingValue::Mapping(_) => {
                let json = serde_json::to_string(self).map_err(|_| fmt::Error)?;
                f.write_str(&json)
            }
        }
    }
}

impl From<&str> for SettingValue {
    fn from(s: &str) -> Self {
        SettingValue::String(s.to_string())
    }
}

impl From<String> for SettingValue {
    fn from(s: String) -> Self {
        SettingValue::String(s)
    }
}

impl From<bool> for SettingValue {
    fn from(b: bool) -> Self {
        SettingValue::Bool(b)
    }
}

impl From<i64> for SettingValue {
    fn from(i: i64) -> Self {
        SettingValue::Number(Number::Int(i))
    }
}

impl From<f64> for SettingValue {
    fn from(f: f64) -> Self {
        SettingValue::Number(Number::Float(f))
    }
}

impl From<ConfigTree> for SettingValue {
    fn from(map: ConfigTree) -> Self {
        SettingValue::Mapping(map)
    }
}

impl From<Vec<SettingValue>> for SettingValue {
    fn from(items: Vec<SettingValue>) -> Self {
        SettingValue::List(items)
    }
}
