use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, TimeZone, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::{Error, Result};

/// Column types declared in a table schema.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "&'static str")]
pub enum FieldType {
    IntNumber,
    FloatNumber,
    Str,
    LongText,
    Time,
    Link,
    Label,
    Labels,
    Image,
    Images,
}

impl FieldType {
    pub fn as_str(&self) -> &'static str {
        match self {
            FieldType::IntNumber => "INT_NUMBER",
            FieldType::FloatNumber => "FLOAT_NUMBER",
            FieldType::Str => "STR",
            FieldType::LongText => "LONG_TEXT",
            FieldType::Time => "TIME",
            FieldType::Link => "LINK",
            FieldType::Label => "LABEL",
            FieldType::Labels => "LABELS",
            FieldType::Image => "IMAGE",
            FieldType::Images => "IMAGES",
        }
    }
}

impl FromStr for FieldType {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        let ty = match s {
            "INT_NUMBER" => FieldType::IntNumber,
            "FLOAT_NUMBER" => FieldType::FloatNumber,
            "STR" => FieldType::Str,
            "LONG_TEXT" => FieldType::LongText,
            "TIME" => FieldType::Time,
            "LINK" => FieldType::Link,
            "LABEL" => FieldType::Label,
            "LABELS" => FieldType::Labels,
            "IMAGE" => FieldType::Image,
            "IMAGES" => FieldType::Images,
            other => return Err(Error::InvalidFieldType(other.to_string())),
        };
        Ok(ty)
    }
}

impl TryFrom<String> for FieldType {
    type Error = Error;

    fn try_from(value: String) -> Result<Self> {
        value.parse()
    }
}

impl From<FieldType> for &'static str {
    fn from(ty: FieldType) -> Self {
        ty.as_str()
    }
}

impl fmt::Display for FieldType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A record cell decoded against its declared [`FieldType`].
#[derive(Debug, Clone, PartialEq)]
pub enum FieldValue {
    Int(i64),
    Float(f64),
    Str(String),
    LongText(String),
    Time(i64),
    Link(String),
    Label(String),
    Labels(Vec<String>),
    Image(String),
    Images(Vec<String>),
    Null,
}

fn type_mismatch(ty: FieldType, expected: &str, got: &Value) -> Error {
    Error::InvalidValue {
        msg: format!("invalid value {got}, {ty} should be {expected}"),
    }
}

fn string_list(ty: FieldType, data: &Value) -> Result<Vec<String>> {
    let items = data
        .as_array()
        .ok_or_else(|| type_mismatch(ty, "a list of str", data))?;
    items
        .iter()
        .map(|item| {
            item.as_str()
                .map(str::to_string)
                .ok_or_else(|| type_mismatch(ty, "a list of str", data))
        })
        .collect()
}

impl FieldValue {
    /// Decodes a raw cell. JSON `null` and the service's `{"null": true}`
    /// marker both decode to [`FieldValue::Null`].
    pub fn decode(ty: FieldType, data: &Value) -> Result<FieldValue> {
        if data.is_null() || data.get("null").and_then(Value::as_bool) == Some(true) {
            return Ok(FieldValue::Null);
        }
        let text = || {
            data.as_str()
                .map(str::to_string)
                .ok_or_else(|| type_mismatch(ty, "str", data))
        };
        let value = match ty {
            FieldType::IntNumber => match (data.as_i64(), data.as_f64()) {
                (Some(i), _) => FieldValue::Int(i),
                (None, Some(f)) => FieldValue::Int(f.trunc() as i64),
                _ => return Err(type_mismatch(ty, "int", data)),
            },
            FieldType::FloatNumber => data
                .as_f64()
                .map(FieldValue::Float)
                .ok_or_else(|| type_mismatch(ty, "float", data))?,
            FieldType::Time => data
                .as_i64()
                .map(FieldValue::Time)
                .ok_or_else(|| type_mismatch(ty, "an int timestamp", data))?,
            FieldType::Str => FieldValue::Str(text()?),
            FieldType::LongText => FieldValue::LongText(text()?),
            FieldType::Link => FieldValue::Link(text()?),
            FieldType::Label => FieldValue::Label(text()?),
            FieldType::Image => FieldValue::Image(text()?),
            FieldType::Labels => FieldValue::Labels(string_list(ty, data)?),
            FieldType::Images => FieldValue::Images(string_list(ty, data)?),
        };
        Ok(value)
    }

    /// Declared type of this value, `None` for [`FieldValue::Null`]
    pub fn field_type(&self) -> Option<FieldType> {
        let ty = match self {
            FieldValue::Int(_) => FieldType::IntNumber,
            FieldValue::Float(_) => FieldType::FloatNumber,
            FieldValue::Str(_) => FieldType::Str,
            FieldValue::LongText(_) => FieldType::LongText,
            FieldValue::Time(_) => FieldType::Time,
            FieldValue::Link(_) => FieldType::Link,
            FieldValue::Label(_) => FieldType::Label,
            FieldValue::Labels(_) => FieldType::Labels,
            FieldValue::Image(_) => FieldType::Image,
            FieldValue::Images(_) => FieldType::Images,
            FieldValue::Null => return None,
        };
        Some(ty)
    }

    pub fn to_json(&self) -> Value {
        match self {
            FieldValue::Int(i) | FieldValue::Time(i) => Value::from(*i),
            FieldValue::Float(f) => Value::from(*f),
            FieldValue::Str(s)
            | FieldValue::LongText(s)
            | FieldValue::Link(s)
            | FieldValue::Label(s)
            | FieldValue::Image(s) => Value::from(s.as_str()),
            FieldValue::Labels(items) | FieldValue::Images(items) => Value::from(items.clone()),
            FieldValue::Null => Value::Null,
        }
    }

    /// Timestamp cells as UTC datetimes
    pub fn as_datetime(&self) -> Option<DateTime<Utc>> {
        match self {
            FieldValue::Time(secs) => Utc.timestamp_opt(*secs, 0).single(),
            _ => None,
        }
    }

    pub fn is_null(&self) -> bool {
        matches!(self, FieldValue::Null)
    }
}

impl From<DateTime<Utc>> for FieldValue {
    fn from(dt: DateTime<Utc>) -> Self {
        FieldValue::Time(dt.timestamp())
    }
}

impl From<FieldValue> for Value {
    fn from(value: FieldValue) -> Self {
        value.to_json()
    }
}
