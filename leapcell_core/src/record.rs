use std::collections::BTreeMap;
use std::fmt;

use serde_json::{json, Value};
use tracing::debug;

use crate::error::Result;
use crate::meta::TableMeta;
use crate::request::{Fields, RecordUpdateRequest};
use crate::requester::Requester;
use crate::response::RecordData;
use crate::transport::Transport;
use crate::value::FieldValue;

/// One row of a table.
///
/// Writes through [`Record::set`] are tracked separately so [`Record::save`]
/// only sends what changed.
pub struct Record<T> {
    requester: Requester<T>,
    record_id: Option<String>,
    data: Fields,
    updated: Fields,
    create_time: Option<i64>,
    update_time: Option<i64>,
}

impl<T> Clone for Record<T> {
    fn clone(&self) -> Self {
        Self {
            requester: self.requester.clone(),
            record_id: self.record_id.clone(),
            data: self.data.clone(),
            updated: self.updated.clone(),
            create_time: self.create_time,
            update_time: self.update_time,
        }
    }
}

impl<T: Transport> Record<T> {
    /// An unsaved record; `save` and `delete` are no-ops until it has an id.
    pub fn new(requester: Requester<T>, fields: Fields) -> Self {
        Self {
            requester,
            record_id: None,
            data: fields,
            updated: Fields::new(),
            create_time: None,
            update_time: None,
        }
    }

    pub fn from_data(requester: Requester<T>, data: RecordData) -> Self {
        Self {
            requester,
            record_id: Some(data.record_id),
            data: data.fields,
            updated: Fields::new(),
            create_time: data.create_time,
            update_time: data.update_time,
        }
    }

    pub fn record_id(&self) -> Option<&str> {
        self.record_id.as_deref()
    }

    pub fn create_time(&self) -> Option<i64> {
        self.create_time
    }

    pub fn update_time(&self) -> Option<i64> {
        self.update_time
    }

    pub fn get(&self, key: &str) -> Option<&Value> {
        self.data.get(key)
    }

    pub fn get_or<'a>(&'a self, key: &str, default: &'a Value) -> &'a Value {
        self.data.get(key).unwrap_or(default)
    }

    pub fn set(&mut self, key: impl Into<String>, value: impl Into<Value>) {
        let key = key.into();
        let value = value.into();
        self.data.insert(key.clone(), value.clone());
        self.updated.insert(key, value);
    }

    pub fn remove(&mut self, key: &str) -> Option<Value> {
        self.updated.remove(key);
        self.data.remove(key)
    }

    pub fn contains_key(&self, key: &str) -> bool {
        self.data.contains_key(key)
    }

    pub fn len(&self) -> usize {
        self.data.len()
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    pub fn iter(&self) -> serde_json::map::Iter<'_> {
        self.data.iter()
    }

    /// All current values
    pub fn data(&self) -> &Fields {
        &self.data
    }

    /// Values changed since construction or the last successful save
    pub fn updated(&self) -> &Fields {
        &self.updated
    }

    /// Decodes every known field against the table schema.
    pub fn decode(&self, meta: &TableMeta) -> Result<BTreeMap<String, FieldValue>> {
        self.data
            .iter()
            .filter_map(|(key, raw)| meta.field(key).map(|field| (key, field, raw)))
            .map(|(key, field, raw)| -> Result<(String, FieldValue)> {
                Ok((key.clone(), FieldValue::decode(field.field_type, raw)?))
            })
            .collect()
    }

    /// Sends the changed fields. Does nothing for a record without id.
    pub fn save(&mut self) -> Result<()> {
        let Some(record_id) = self.record_id.as_deref() else {
            debug!("skipping save of a record without id");
            return Ok(());
        };
        let body = RecordUpdateRequest {
            fields: self.updated.clone(),
        };
        self.requester.update_record(record_id, &body)?;
        self.updated.clear();
        Ok(())
    }

    /// Deletes the record by id. The instance stays usable afterwards.
    pub fn delete(&self) -> Result<()> {
        let Some(record_id) = self.record_id.as_deref() else {
            debug!("skipping delete of a record without id");
            return Ok(());
        };
        self.requester.delete_record(record_id)?;
        Ok(())
    }

    pub fn to_json(&self) -> Value {
        json!({
            "record_id": self.record_id,
            "data": self.data,
            "create_time": self.create_time,
            "update_time": self.update_time,
        })
    }
}

impl<T> fmt::Debug for Record<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Record")
            .field("record_id", &self.record_id)
            .field("data", &self.data)
            .field("updated", &self.updated)
            .field("create_time", &self.create_time)
            .field("update_time", &self.update_time)
            .finish()
    }
}

impl<T> fmt::Display for Record<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let fields = Value::Object(self.data.clone());
        write!(
            f,
            "<record_id: {}, data: {}, create_time: {}, update_time: {}>",
            self.record_id.as_deref().unwrap_or("None"),
            fields,
            fmt_time(self.create_time),
            fmt_time(self.update_time)
        )
    }
}

fn fmt_time(time: Option<i64>) -> String {
    time.map_or_else(|| "None".to_string(), |t| t.to_string())
}
