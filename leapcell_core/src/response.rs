//! Shapes of the `data` payloads returned by each endpoint.

use std::collections::BTreeMap;

use serde::de::DeserializeOwned;
use serde::Deserialize;
use serde_json::Value;

use crate::error::{Error, Result};
use crate::file::LeapcellFile;
use crate::meta::FieldMeta;
use crate::request::Fields;

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct RecordData {
    pub record_id: String,
    #[serde(default)]
    pub fields: Fields,
    #[serde(default)]
    pub create_time: Option<i64>,
    #[serde(default)]
    pub update_time: Option<i64>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct RecordsPayload {
    #[serde(default)]
    pub records: Option<Vec<RecordData>>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct RecordPayload {
    #[serde(default)]
    pub record: Option<RecordData>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct AffectPayload {
    #[serde(default)]
    pub affect_count: Option<u64>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct MetricValue {
    pub value: u64,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct MetricPayload {
    #[serde(default)]
    pub metric: Option<MetricValue>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct MetaPayload {
    #[serde(default)]
    pub fields: BTreeMap<String, FieldMeta>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct FilePayload {
    #[serde(default)]
    pub file: LeapcellFile,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct FilesPayload {
    #[serde(default)]
    pub files: Vec<LeapcellFile>,
}

/// Decodes a `data` payload; `null` yields `None`.
pub fn decode<D: DeserializeOwned>(data: Value) -> Result<Option<D>> {
    if data.is_null() {
        return Ok(None);
    }
    serde_json::from_value(data)
        .map(Some)
        .map_err(|e| Error::UnexpectedShape(e.to_string()))
}
