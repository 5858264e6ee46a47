use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};

/// A block attribute value.
///
/// Editors store arbitrary JSON under a block's attributes; this is the closed
/// set of shapes that JSON can take. Use the `as_*` helpers to extract a
/// specific shape, they fail with [`ValueError`] instead of coercing.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum AttrValue {
    Null,
    Bool(bool),
    Number(f64),
    String(String),
    List(Vec<AttrValue>),
    Map(BTreeMap<String, AttrValue>),
}

/// Shape names used in [`ValueError`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ValueKind {
    Null,
    Bool,
    Number,
    String,
    List,
    Map,
}

impl fmt::Display for ValueKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            ValueKind::Null => "null",
            ValueKind::Bool => "boolean",
            ValueKind::Number => "number",
            ValueKind::String => "string",
            ValueKind::List => "list",
            ValueKind::Map => "map",
        };
        f.write_str(s)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("expected {expected}, found {found}")]
pub struct ValueError {
    pub expected: ValueKind,
    pub found: ValueKind,
}

impl AttrValue {
    pub fn kind(&self) -> ValueKind {
        match self {
            AttrValue::Null => ValueKind::Null,
            AttrValue::Bool(_) => ValueKind::Bool,
            AttrValue::Number(_) => ValueKind::Number,
            AttrValue::String(_) => ValueKind::String,
            AttrValue::List(_) => ValueKind::List,
            AttrValue::Map(_) => ValueKind::Map,
        }
    }

    fn mismatch(&self, expected: ValueKind) -> ValueError {
        ValueError {
            expected,
            found: self.kind(),
        }
    }

    pub fn as_str(&self) -> Result<&str, ValueError> {
        match self {
            AttrValue::String(s) => Ok(s),
            other => Err(other.mismatch(ValueKind::String)),
        }
    }

    pub fn as_bool(&self) -> Result<bool, ValueError> {
        match self {
            AttrValue::Bool(b) => Ok(*b),
            other => Err(other.mismatch(ValueKind::Bool)),
        }
    }

    pub fn as_f64(&self) -> Result<f64, ValueError> {
        match self {
            AttrValue::Number(n) => Ok(*n),
            other => Err(other.mismatch(ValueKind::Number)),
        }
    }

    /// Non-negative integral number.
    pub fn as_u64(&self) -> Result<u64, ValueError> {
        match self {
            AttrValue::Number(n) if *n >= 0.0 && n.fract() == 0.0 && *n <= u64::MAX as f64 => {
                Ok(*n as u64)
            }
            other => Err(other.mismatch(ValueKind::Number)),
        }
    }

    pub fn as_list(&self) -> Result<&[AttrValue], ValueError> {
        match self {
            AttrValue::List(items) => Ok(items),
            other => Err(other.mismatch(ValueKind::List)),
        }
    }

    pub fn as_map(&self) -> Result<&BTreeMap<String, AttrValue>, ValueError> {
        match self {
            AttrValue::Map(map) => Ok(map),
            other => Err(other.mismatch(ValueKind::Map)),
        }
    }

    /// Key used to look this value up in a class map.
    ///
    /// Only scalar values have a key. Integral numbers print without a
    /// fraction so `2.0` and `2` both match a `"2"` entry.
    pub fn class_key(&self) -> Option<String> {
        match self {
            AttrValue::String(s) => Some(s.clone()),
            AttrValue::Bool(b) => Some(b.to_string()),
            // `-0.0 == 0.0`, and `{:.0}` would print it as `-0`.
            AttrValue::Number(n) if *n == 0.0 => Some("0".to_string()),
            AttrValue::Number(n) if n.is_finite() && n.fract() == 0.0 => Some(format!("{n:.0}")),
            AttrValue::Number(n) if n.is_finite() => Some(n.to_string()),
            _ => None,
        }
    }
}

impl From<&str> for AttrValue {
    fn from(s: &str) -> Self {
        AttrValue::String(s.to_string())
    }
}

impl From<String> for AttrValue {
    fn from(s: String) -> Self {
        AttrValue::String(s)
    }
}

impl From<bool> for AttrValue {
    fn from(b: bool) -> Self {
        AttrValue::Bool(b)
    }
}

impl From<f64> for AttrValue {
    fn from(n: f64) -> Self {
        AttrValue::Number(n)
    }
}

impl From<i64> for AttrValue {
    fn from(n: i64) -> Self {
        AttrValue::Number(n as f64)
    }
}

impl<T: Into<AttrValue>> From<Vec<T>> for AttrValue {
    fn from(items: Vec<T>) -> Self {
        AttrValue::List(items.into_iter().map(Into::into).collect())
    }
}
