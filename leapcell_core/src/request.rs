//! Wire-level request bodies and the compiler that produces them from a
//! [`QuerySpec`]. Nothing in here performs I/O.

use std::collections::BTreeMap;

use serde::Serialize;
use serde_json::{Map, Value};

use crate::error::{Error, Result};
use crate::filter::{CombinatorKind, Filter, Operator};
use crate::order::{Direction, OrderSpec};

/// Field name to value mapping, as sent in record bodies.
pub type Fields = Map<String, Value>;

pub const DEFAULT_LIMIT: u32 = 20;

/// Compiled filter tree.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum FilterNode {
    Leaf {
        field: String,
        op: Operator,
        val: Option<Value>,
    },
    Group {
        #[serde(rename = "filterType")]
        filter_type: CombinatorKind,
        filters: Vec<FilterNode>,
    },
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SortNode {
    pub field: String,
    #[serde(rename = "sortType")]
    pub sort_type: Direction,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct QueryRequest {
    pub limit: u32,
    pub offset: u64,
    pub filter: Option<FilterNode>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub fields: Vec<String>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub orders: Vec<SortNode>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub aggr: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SearchRequest {
    pub query: String,
    pub search_fields: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub filter: Option<FilterNode>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub orders: Vec<SortNode>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub fields: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub offset: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub limit: Option<u32>,
    #[serde(skip_serializing_if = "BTreeMap::is_empty")]
    pub boost_fields: BTreeMap<String, i64>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct UpdateRequest {
    pub filter: Option<FilterNode>,
    pub fields: Fields,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DeleteRequest {
    pub filter: Option<FilterNode>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AggregateRequest {
    pub filter: Option<FilterNode>,
    pub metric: Metric,
}

/// Single-record update body, `PUT /record/{id}`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RecordUpdateRequest {
    pub fields: Fields,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum CreateAction {
    CreateIfNotExists,
    Upsert,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CreateRequest {
    pub record: Fields,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub on_conflict: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub action: Option<CreateAction>,
}

impl CreateRequest {
    /// The action is only sent alongside conflict fields.
    pub fn new(record: Fields, on_conflict: Vec<String>, action: CreateAction) -> Self {
        let action = (!on_conflict.is_empty()).then_some(action);
        Self {
            record,
            on_conflict,
            action,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BulkCreateRequest {
    pub records: Vec<Fields>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub on_conflict: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub action: Option<CreateAction>,
}

impl BulkCreateRequest {
    pub fn new(records: Vec<Fields>, on_conflict: Vec<String>, action: CreateAction) -> Self {
        let action = match action {
            CreateAction::Upsert if !on_conflict.is_empty() => Some(action),
            _ => None,
        };
        Self {
            records,
            on_conflict,
            action,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum AggrFunction {
    Count,
}

impl AggrFunction {
    pub fn as_str(&self) -> &'static str {
        match self {
            AggrFunction::Count => "count",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum MetricCondition {
    Distinct,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Metric {
    pub field: String,
    pub aggr: AggrFunction,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub condition: Option<MetricCondition>,
}

/// Aggregation intent carried by a query: which field, which function, and
/// whether only distinct values count.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Aggregation {
    pub field: String,
    pub function: AggrFunction,
    pub distinct: bool,
}

impl Aggregation {
    /// `count(*)`, optionally over distinct rows
    pub fn count(distinct: bool) -> Self {
        Self {
            field: "*".to_string(),
            function: AggrFunction::Count,
            distinct,
        }
    }

    pub fn metric(&self) -> Metric {
        Metric {
            field: self.field.clone(),
            aggr: self.function,
            condition: self.distinct.then_some(MetricCondition::Distinct),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Pagination {
    pub offset: u64,
    pub limit: u32,
}

impl Default for Pagination {
    fn default() -> Self {
        Self {
            offset: 0,
            limit: DEFAULT_LIMIT,
        }
    }
}

impl Pagination {
    pub fn validate(&self) -> Result<()> {
        if self.limit == 0 {
            return Err(Error::InvalidPagination {
                msg: "limit must be positive".to_string(),
            });
        }
        Ok(())
    }
}

/// Everything a query builder accumulates before a terminal call.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct QuerySpec {
    pub fields: Vec<String>,
    pub filter: Option<Filter>,
    pub orders: OrderSpec,
    pub pagination: Pagination,
    pub aggregation: Option<Aggregation>,
}

pub fn compile_filter(filter: Option<&Filter>) -> Option<FilterNode> {
    filter.map(Filter::compile)
}

impl QuerySpec {
    fn filter_node(&self) -> Option<FilterNode> {
        compile_filter(self.filter.as_ref())
    }

    pub fn compile_query(&self) -> Result<QueryRequest> {
        self.pagination.validate()?;
        Ok(QueryRequest {
            limit: self.pagination.limit,
            offset: self.pagination.offset,
            filter: self.filter_node(),
            fields: self.fields.clone(),
            orders: self.orders.compile(),
            aggr: self
                .aggregation
                .as_ref()
                .map(|a| a.function.as_str().to_string()),
        })
    }

    pub fn compile_search(
        &self,
        keyword: &str,
        search_fields: &[String],
        boost_fields: &BTreeMap<String, i64>,
    ) -> Result<SearchRequest> {
        self.pagination.validate()?;
        Ok(SearchRequest {
            query: keyword.to_string(),
            search_fields: search_fields.to_vec(),
            filter: self.filter_node(),
            orders: self.orders.compile(),
            fields: self.fields.clone(),
            offset: (self.pagination.offset > 0).then_some(self.pagination.offset),
            limit: Some(self.pagination.limit),
            boost_fields: boost_fields.clone(),
        })
    }

    pub fn compile_update(&self, values: Fields) -> UpdateRequest {
        UpdateRequest {
            filter: self.filter_node(),
            fields: values,
        }
    }

    pub fn compile_delete(&self) -> DeleteRequest {
        DeleteRequest {
            filter: self.filter_node(),
        }
    }

    pub fn compile_count(&self, distinct: bool) -> AggregateRequest {
        AggregateRequest {
            filter: self.filter_node(),
            metric: Aggregation::count(distinct).metric(),
        }
    }
}
