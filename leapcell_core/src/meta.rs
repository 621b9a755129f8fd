use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

use crate::config::NameType;
use crate::value::FieldType;

/// Schema entry of one column.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FieldMeta {
    pub id: String,
    pub name: String,
    #[serde(rename = "type")]
    pub field_type: FieldType,
}

impl fmt::Display for FieldMeta {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "<field id: {} name: {}, type: {}>",
            self.id, self.name, self.field_type
        )
    }
}

/// Table schema as reported by the service.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TableMeta {
    repository: String,
    table_id: String,
    name_type: NameType,
    by_id: BTreeMap<String, FieldMeta>,
    by_name: BTreeMap<String, FieldMeta>,
}

impl TableMeta {
    pub fn new(
        repository: impl Into<String>,
        table_id: impl Into<String>,
        name_type: NameType,
        fields: BTreeMap<String, FieldMeta>,
    ) -> Self {
        let by_name = fields
            .values()
            .map(|meta| (meta.name.clone(), meta.clone()))
            .collect();
        Self {
            repository: repository.into(),
            table_id: table_id.into(),
            name_type,
            by_id: fields,
            by_name,
        }
    }

    pub fn repository(&self) -> &str {
        &self.repository
    }

    pub fn table_id(&self) -> &str {
        &self.table_id
    }

    pub fn name_type(&self) -> NameType {
        self.name_type
    }

    /// Fields keyed the way records of this table are keyed.
    pub fn field_metas(&self) -> &BTreeMap<String, FieldMeta> {
        match self.name_type {
            NameType::Id => &self.by_id,
            NameType::Name => &self.by_name,
        }
    }

    pub fn field_id_metas(&self) -> &BTreeMap<String, FieldMeta> {
        &self.by_id
    }

    pub fn display_field_metas(&self) -> &BTreeMap<String, FieldMeta> {
        &self.by_name
    }

    /// Looks a field up by record key.
    pub fn field(&self, key: &str) -> Option<&FieldMeta> {
        self.field_metas().get(key)
    }

    pub fn to_json(&self) -> Value {
        json!({
            "resource": self.repository,
            "table_id": self.table_id,
            "fields": self.field_metas(),
        })
    }
}

impl fmt::Display for TableMeta {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "<repo: {}, table: {}>", self.repository, self.table_id)
    }
}
