use std::collections::BTreeMap;
use std::fmt;

use tracing::debug;

use crate::error::Result;
use crate::filter::{Filter, IntoFilter};
use crate::order::OrderSpec;
use crate::record::Record;
use crate::request::{
    Aggregation, AggregateRequest, DeleteRequest, Fields, QueryRequest, QuerySpec, SearchRequest,
    UpdateRequest,
};
use crate::requester::Requester;
use crate::response::RecordData;
use crate::transport::Transport;

/// Fluent accumulator for one logical query against a table.
///
/// Configuration calls mutate the builder in place and return it for
/// chaining; terminal calls compile the current state and dispatch it. A
/// terminal call can be repeated on the same state.
///
/// ```ignore
/// let records = table
///     .select(["title", "author"])
///     .filter(table.field("author").eq("sam"))
///     .order_by(table.field("title").asc())
///     .limit(10)
///     .query()?;
/// ```
pub struct Query<T> {
    requester: Requester<T>,
    spec: QuerySpec,
}

impl<T> Clone for Query<T> {
    fn clone(&self) -> Self {
        Self {
            requester: self.requester.clone(),
            spec: self.spec.clone(),
        }
    }
}

impl<T: Transport> Query<T> {
    pub fn new(requester: Requester<T>) -> Self {
        Self::with_spec(requester, QuerySpec::default())
    }

    pub fn with_spec(requester: Requester<T>, spec: QuerySpec) -> Self {
        Self { requester, spec }
    }

    pub fn spec(&self) -> &QuerySpec {
        &self.spec
    }

    /// Sets the projection; an empty list selects every field.
    pub fn select<I, S>(&mut self, fields: I) -> &mut Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.spec.fields = fields.into_iter().map(Into::into).collect();
        self
    }

    /// Adds a condition. A second call is joined as `new AND existing`.
    pub fn filter(&mut self, filter: Filter) -> &mut Self {
        self.spec.filter = Some(match self.spec.filter.take() {
            Some(existing) => filter.and(existing),
            None => filter,
        });
        self
    }

    /// Like [`Query::filter`] for any selector; an empty selector changes nothing.
    pub fn filter_by(&mut self, conditions: impl IntoFilter) -> &mut Self {
        if let Some(filter) = conditions.into_filter() {
            self.filter(filter);
        }
        self
    }

    /// Appends one or more sort keys.
    pub fn order_by(&mut self, orders: impl Into<OrderSpec>) -> &mut Self {
        let orders: OrderSpec = orders.into();
        self.spec.orders.extend(orders);
        self
    }

    pub fn limit(&mut self, limit: u32) -> &mut Self {
        self.spec.pagination.limit = limit;
        self
    }

    pub fn take(&mut self, limit: u32) -> &mut Self {
        self.limit(limit)
    }

    pub fn offset(&mut self, offset: u64) -> &mut Self {
        self.spec.pagination.offset = offset;
        self
    }

    pub fn skip(&mut self, offset: u64) -> &mut Self {
        self.offset(offset)
    }

    pub fn aggregate(&mut self, aggregation: Aggregation) -> &mut Self {
        self.spec.aggregation = Some(aggregation);
        self
    }

    pub fn compile_query(&self) -> Result<QueryRequest> {
        self.spec.compile_query()
    }

    pub fn compile_search(
        &self,
        keyword: &str,
        search_fields: &[String],
        boost_fields: &BTreeMap<String, i64>,
    ) -> Result<SearchRequest> {
        self.spec.compile_search(keyword, search_fields, boost_fields)
    }

    pub fn compile_update(&self, values: Fields) -> UpdateRequest {
        self.spec.compile_update(values)
    }

    pub fn compile_delete(&self) -> DeleteRequest {
        self.spec.compile_delete()
    }

    pub fn compile_count(&self, distinct: bool) -> AggregateRequest {
        self.spec.compile_count(distinct)
    }

    fn records(&self, data: Option<Vec<RecordData>>) -> Vec<Record<T>> {
        data.unwrap_or_default()
            .into_iter()
            .map(|data| Record::from_data(self.requester.clone(), data))
            .collect()
    }

    /// Runs the query. No matches is an empty list, not an error.
    pub fn query(&self) -> Result<Vec<Record<T>>> {
        let request = self.compile_query()?;
        let payload = self.requester.get_records(&request)?;
        let records = self.records(payload.and_then(|p| p.records));
        debug!("query matched {} record(s)", records.len());
        Ok(records)
    }

    /// Runs the query with `limit = 1`; the limit stays set afterwards.
    pub fn first(&mut self) -> Result<Option<Record<T>>> {
        self.limit(1);
        Ok(self.query()?.into_iter().next())
    }

    /// Full-text search restricted by the current filter, order, projection
    /// and pagination.
    pub fn search(
        &self,
        keyword: &str,
        search_fields: &[String],
        boost_fields: &BTreeMap<String, i64>,
    ) -> Result<Vec<Record<T>>> {
        let request = self.compile_search(keyword, search_fields, boost_fields)?;
        let payload = self.requester.search(&request)?;
        Ok(self.records(payload.and_then(|p| p.records)))
    }

    /// Updates every matching record; returns the affected count if reported.
    pub fn update(&self, values: Fields) -> Result<Option<u64>> {
        let request = self.compile_update(values);
        let payload = self.requester.update_records(&request)?;
        Ok(payload.and_then(|p| p.affect_count))
    }

    /// Deletes every matching record; returns the affected count if reported.
    pub fn delete(&self) -> Result<Option<u64>> {
        let request = self.compile_delete();
        let payload = self.requester.delete_records(&request)?;
        Ok(payload.and_then(|p| p.affect_count))
    }

    /// Counts matching records, optionally only distinct ones.
    pub fn count(&self, distinct: bool) -> Result<Option<u64>> {
        let request = self.compile_count(distinct);
        let payload = self.requester.aggr_record(&request)?;
        Ok(payload.and_then(|p| p.metric).map(|m| m.value))
    }
}

impl<T> fmt::Display for Query<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let filter = self
            .spec
            .filter
            .as_ref()
            .map_or_else(|| "None".to_string(), ToString::to_string);
        let orders: Vec<String> = self.spec.orders.iter().map(ToString::to_string).collect();
        write!(
            f,
            "<filter: {}, orders: [{}], offset: {}, limit: {}, aggr: {}>",
            filter,
            orders.join(", "),
            self.spec.pagination.offset,
            self.spec.pagination.limit,
            self.spec
                .aggregation
                .as_ref()
                .map_or("None", |a| a.function.as_str())
        )
    }
}
