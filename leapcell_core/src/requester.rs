use std::sync::Arc;

use serde::Serialize;
use serde_json::Value;
use tracing::{debug, trace};

use crate::config::NameType;
use crate::error::{Error, Result};
use crate::file::{FilePart, LeapcellFile};
use crate::request::{
    AggregateRequest, BulkCreateRequest, CreateRequest, DeleteRequest, QueryRequest,
    RecordUpdateRequest, SearchRequest, UpdateRequest,
};
use crate::response::{
    decode, AffectPayload, FilePayload, FilesPayload, MetaPayload, MetricPayload, RecordPayload,
    RecordsPayload,
};
use crate::transport::{ApiRequest, Transport};

/// Endpoint prefix of one table, `/api/{version}/{repository}/table/{table_id}`.
pub fn endpoint(version: &str, repository: &str, table_id: &str) -> String {
    let segments = [version, repository, "table", table_id];
    let path: Vec<&str> = segments.iter().map(|s| s.trim_matches('/')).collect();
    format!("/api/{}", path.join("/"))
}

/// Table-scoped endpoint calls over a shared [`Transport`].
pub struct Requester<T> {
    transport: Arc<T>,
    prefix: String,
    name_type: NameType,
}

impl<T> Clone for Requester<T> {
    fn clone(&self) -> Self {
        Self {
            transport: Arc::clone(&self.transport),
            prefix: self.prefix.clone(),
            name_type: self.name_type,
        }
    }
}

impl<T: Transport> Requester<T> {
    pub fn new(transport: Arc<T>, prefix: String, name_type: NameType) -> Self {
        Self {
            transport,
            prefix,
            name_type,
        }
    }

    pub fn prefix(&self) -> &str {
        &self.prefix
    }

    pub fn name_type(&self) -> NameType {
        self.name_type
    }

    pub fn transport(&self) -> &T {
        &self.transport
    }

    fn path(&self, suffix: &str) -> String {
        format!("{}{}", self.prefix, suffix)
    }

    /// Serializes a body and tags it with the table's `name_type`.
    fn body<B: Serialize>(&self, body: &B) -> Result<Value> {
        let mut value = serde_json::to_value(body)?;
        match &mut value {
            Value::Object(map) => {
                map.insert("name_type".to_string(), Value::from(self.name_type.as_str()));
            }
            other => {
                return Err(Error::UnexpectedShape(format!(
                    "request body should be an object, got {other}"
                )))
            }
        }
        trace!("request body: {value}");
        Ok(value)
    }

    fn dispatch(&self, request: ApiRequest) -> Result<Value> {
        debug!("{} {}", request.method, request.path);
        self.transport.send(request)
    }

    pub fn table_meta(&self) -> Result<Option<MetaPayload>> {
        let request =
            ApiRequest::get(self.path("")).with_param("name_type", self.name_type.as_str());
        decode(self.dispatch(request)?)
    }

    pub fn create_record(&self, body: &CreateRequest) -> Result<Option<RecordPayload>> {
        let request = ApiRequest::post(self.path("/record")).with_json(self.body(body)?);
        decode(self.dispatch(request)?)
    }

    pub fn create_records(&self, body: &BulkCreateRequest) -> Result<Option<RecordsPayload>> {
        let request = ApiRequest::post(self.path("/record")).with_json(self.body(body)?);
        decode(self.dispatch(request)?)
    }

    pub fn get_record(&self, record_id: &str) -> Result<Option<RecordPayload>> {
        let request = ApiRequest::get(self.path(&format!("/record/{record_id}")))
            .with_param("name_type", self.name_type.as_str());
        decode(self.dispatch(request)?)
    }

    pub fn get_records(&self, body: &QueryRequest) -> Result<Option<RecordsPayload>> {
        let request = ApiRequest::post(self.path("/record/query")).with_json(self.body(body)?);
        decode(self.dispatch(request)?)
    }

    pub fn update_records(&self, body: &UpdateRequest) -> Result<Option<AffectPayload>> {
        let request = ApiRequest::put(self.path("/record")).with_json(self.body(body)?);
        decode(self.dispatch(request)?)
    }

    pub fn update_record(&self, record_id: &str, body: &RecordUpdateRequest) -> Result<Value> {
        let request = ApiRequest::put(self.path(&format!("/record/{record_id}")))
            .with_json(self.body(body)?);
        self.dispatch(request)
    }

    pub fn delete_records(&self, body: &DeleteRequest) -> Result<Option<AffectPayload>> {
        let request = ApiRequest::delete(self.path("/record")).with_json(self.body(body)?);
        decode(self.dispatch(request)?)
    }

    pub fn delete_record(&self, record_id: &str) -> Result<Value> {
        let request = ApiRequest::delete(self.path(&format!("/record/{record_id}")));
        self.dispatch(request)
    }

    pub fn aggr_record(&self, body: &AggregateRequest) -> Result<Option<MetricPayload>> {
        let request = ApiRequest::post(self.path("/record/metrics")).with_json(self.body(body)?);
        decode(self.dispatch(request)?)
    }

    pub fn search(&self, body: &SearchRequest) -> Result<Option<RecordsPayload>> {
        let request = ApiRequest::post(self.path("/record/search")).with_json(self.body(body)?);
        decode(self.dispatch(request)?)
    }

    pub fn upload(&self, file: FilePart) -> Result<LeapcellFile> {
        let request = ApiRequest::post(self.path("/upload")).with_files("file", vec![file]);
        let payload: Option<FilePayload> = decode(self.dispatch(request)?)?;
        Ok(payload.unwrap_or_default().file)
    }

    pub fn upload_multi(&self, files: Vec<FilePart>) -> Result<Vec<LeapcellFile>> {
        let request = ApiRequest::post(self.path("/upload_multi")).with_files("files", files);
        let payload: Option<FilesPayload> = decode(self.dispatch(request)?)?;
        Ok(payload.unwrap_or_default().files)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builds_table_prefix() {
        assert_eq!(
            endpoint("v1", "salamer/myblog", "tbl1700559237082210304"),
            "/api/v1/salamer/myblog/table/tbl1700559237082210304"
        );
        assert_eq!(endpoint("/v1/", "/me/blog/", "t1"), "/api/v1/me/blog/table/t1");
    }
}
