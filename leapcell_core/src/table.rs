use std::collections::BTreeMap;
use std::fmt;

use bytes::Bytes;

use crate::config::NameType;
use crate::error::{Error, Result};
use crate::file::{FilePart, LeapcellFile};
use crate::filter::{Field, Filter, IntoFilter};
use crate::meta::TableMeta;
use crate::order::OrderSpec;
use crate::query::Query;
use crate::record::Record;
use crate::request::{BulkCreateRequest, CreateAction, CreateRequest, Fields, Pagination, QuerySpec};
use crate::requester::Requester;
use crate::transport::Transport;

pub const DEFAULT_SEARCH_LIMIT: u32 = 10;

/// Options of [`Table::search`].
#[derive(Debug, Clone, PartialEq)]
pub struct SearchOptions {
    /// Fields the keyword is matched against, empty for all
    pub search_fields: Vec<String>,
    /// Projection of the returned records
    pub fields: Vec<String>,
    /// Relevance weight per field
    pub boost_fields: BTreeMap<String, i64>,
    pub offset: u64,
    pub limit: u32,
    pub filter: Option<Filter>,
    pub orders: OrderSpec,
}

impl Default for SearchOptions {
    fn default() -> Self {
        SearchOptions {
            search_fields: Vec::new(),
            fields: Vec::new(),
            boost_fields: BTreeMap::new(),
            offset: 0,
            limit: DEFAULT_SEARCH_LIMIT,
            filter: None,
            orders: OrderSpec::new(),
        }
    }
}

/// Handle on one table of a repository.
pub struct Table<T> {
    requester: Requester<T>,
    repository: String,
    table_id: String,
}

impl<T> Clone for Table<T> {
    fn clone(&self) -> Self {
        Self {
            requester: self.requester.clone(),
            repository: self.repository.clone(),
            table_id: self.table_id.clone(),
        }
    }
}

fn conflict_fields(on_conflict: &[&str]) -> Vec<String> {
    on_conflict.iter().map(|s| s.to_string()).collect()
}

impl<T: Transport> Table<T> {
    pub fn new(requester: Requester<T>, repository: String, table_id: String) -> Self {
        Self {
            requester,
            repository,
            table_id,
        }
    }

    pub fn requester(&self) -> &Requester<T> {
        &self.requester
    }

    pub fn repository(&self) -> &str {
        &self.repository
    }

    pub fn table_id(&self) -> &str {
        &self.table_id
    }

    pub fn name_type(&self) -> NameType {
        self.requester.name_type()
    }

    /// Fetches the table schema.
    pub fn meta(&self) -> Result<TableMeta> {
        let payload = self.requester.table_meta()?.unwrap_or_default();
        Ok(TableMeta::new(
            self.repository.clone(),
            self.table_id.clone(),
            self.name_type(),
            payload.fields,
        ))
    }

    /// A column handle for building filters and orders.
    pub fn field(&self, name: impl Into<String>) -> Field {
        Field::new(name)
    }

    /// A record that is not persisted yet.
    pub fn new_record(&self, fields: Fields) -> Record<T> {
        Record::new(self.requester.clone(), fields)
    }

    fn create_with(
        &self,
        record: Fields,
        on_conflict: &[&str],
        action: CreateAction,
    ) -> Result<Record<T>> {
        let body = CreateRequest::new(record, conflict_fields(on_conflict), action);
        let data = self
            .requester
            .create_record(&body)?
            .and_then(|payload| payload.record)
            .ok_or_else(|| Error::UnexpectedShape("create response has no record".to_string()))?;
        Ok(Record::from_data(self.requester.clone(), data))
    }

    /// Creates one record. With conflict fields, nothing is created when a
    /// record with the same values exists.
    pub fn create(&self, record: Fields, on_conflict: &[&str]) -> Result<Record<T>> {
        self.create_with(record, on_conflict, CreateAction::CreateIfNotExists)
    }

    /// Creates one record, or updates the one matching the conflict fields.
    pub fn upsert(&self, record: Fields, on_conflict: &[&str]) -> Result<Record<T>> {
        self.create_with(record, on_conflict, CreateAction::Upsert)
    }

    fn bulk_with(
        &self,
        records: Vec<Fields>,
        on_conflict: &[&str],
        action: CreateAction,
    ) -> Result<Vec<Record<T>>> {
        let body = BulkCreateRequest::new(records, conflict_fields(on_conflict), action);
        let created = self
            .requester
            .create_records(&body)?
            .and_then(|payload| payload.records)
            .unwrap_or_default();
        Ok(created
            .into_iter()
            .map(|data| Record::from_data(self.requester.clone(), data))
            .collect())
    }

    pub fn bulk_create(
        &self,
        records: Vec<Fields>,
        on_conflict: &[&str],
    ) -> Result<Vec<Record<T>>> {
        self.bulk_with(records, on_conflict, CreateAction::CreateIfNotExists)
    }

    pub fn bulk_upsert(
        &self,
        records: Vec<Fields>,
        on_conflict: &[&str],
    ) -> Result<Vec<Record<T>>> {
        self.bulk_with(records, on_conflict, CreateAction::Upsert)
    }

    pub fn get_by_id(&self, id: &str) -> Result<Option<Record<T>>> {
        let record = self
            .requester
            .get_record(id)?
            .and_then(|payload| payload.record)
            .map(|data| Record::from_data(self.requester.clone(), data));
        Ok(record)
    }

    /// A query over the records matching `conditions`, which must not be empty.
    fn matching(&self, conditions: impl IntoFilter) -> Result<Query<T>> {
        let filter = conditions
            .into_filter()
            .ok_or(Error::MissingArgument("conditions"))?;
        let mut query = Query::new(self.requester.clone());
        query.filter(filter);
        Ok(query)
    }

    /// First record matching the conditions.
    pub fn get(
        &self,
        conditions: impl IntoFilter,
        orders: impl Into<OrderSpec>,
    ) -> Result<Option<Record<T>>> {
        self.matching(conditions)?.order_by(orders).first()
    }

    /// Starts a query projecting the given fields (empty for all).
    pub fn select<I, S>(&self, fields: I) -> Query<T>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let mut query = Query::new(self.requester.clone());
        query.select(fields);
        query
    }

    /// Deletes matching records. Empty conditions are rejected; clearing the
    /// whole table goes through `select(..).delete()`.
    pub fn delete(&self, conditions: impl IntoFilter) -> Result<Option<u64>> {
        self.matching(conditions)?.delete()
    }

    pub fn delete_by_id(&self, id: &str) -> Result<()> {
        self.requester.delete_record(id)?;
        Ok(())
    }

    pub fn count(&self, conditions: impl IntoFilter) -> Result<Option<u64>> {
        Query::new(self.requester.clone())
            .filter_by(conditions)
            .count(false)
    }

    pub fn search(&self, keyword: &str, options: SearchOptions) -> Result<Vec<Record<T>>> {
        let SearchOptions {
            search_fields,
            fields,
            boost_fields,
            offset,
            limit,
            filter,
            orders,
        } = options;
        let spec = QuerySpec {
            fields,
            filter,
            orders,
            pagination: Pagination { offset, limit },
            aggregation: None,
        };
        Query::with_spec(self.requester.clone(), spec).search(
            keyword,
            &search_fields,
            &boost_fields,
        )
    }

    pub fn upload_file(
        &self,
        file: impl Into<Bytes>,
        filename: Option<&str>,
    ) -> Result<LeapcellFile> {
        let part = FilePart::new(filename.unwrap_or("file"), file)?;
        self.requester.upload(part)
    }

    /// Uploads several files in one request; every file is size-checked first.
    pub fn upload_files<B: Into<Bytes>>(&self, files: Vec<B>) -> Result<Vec<LeapcellFile>> {
        let parts = files
            .into_iter()
            .enumerate()
            .map(|(i, bytes)| FilePart::new(format!("file{i}"), bytes))
            .collect::<Result<Vec<_>>>()?;
        self.requester.upload_multi(parts)
    }
}

impl<T> fmt::Display for Table<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "table instance <table: {}, resource: {}>",
            self.table_id, self.repository
        )
    }
}
