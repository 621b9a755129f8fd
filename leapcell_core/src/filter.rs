use std::fmt;
use std::str::FromStr;

use serde::Serialize;
use serde_json::{Map, Value};

use crate::error::{Error, Result};
use crate::order::{Direction, Order};
use crate::request::FilterNode;

/// Comparison operators understood by the service.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Operator {
    Eq,
    Neq,
    Gt,
    Gte,
    Lt,
    Lte,
    Contain,
    In,
    NotIn,
    IsNull,
    NotNull,
}

impl Operator {
    pub const ALL: [Operator; 11] = [
        Operator::Eq,
        Operator::Neq,
        Operator::Gt,
        Operator::Gte,
        Operator::Lt,
        Operator::Lte,
        Operator::Contain,
        Operator::In,
        Operator::NotIn,
        Operator::IsNull,
        Operator::NotNull,
    ];

    /// Wire name of the operator
    pub fn as_str(&self) -> &'static str {
        match self {
            Operator::Eq => "eq",
            Operator::Neq => "neq",
            Operator::Gt => "gt",
            Operator::Gte => "gte",
            Operator::Lt => "lt",
            Operator::Lte => "lte",
            Operator::Contain => "contain",
            Operator::In => "in",
            Operator::NotIn => "not_in",
            Operator::IsNull => "is_null",
            Operator::NotNull => "not_null",
        }
    }

    /// `is_null` and `not_null` carry no operand.
    pub fn takes_value(&self) -> bool {
        !matches!(self, Operator::IsNull | Operator::NotNull)
    }

    /// `in` and `not_in` compare against a sequence.
    pub fn takes_sequence(&self) -> bool {
        matches!(self, Operator::In | Operator::NotIn)
    }
}

impl FromStr for Operator {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        Operator::ALL
            .iter()
            .find(|op| op.as_str() == s)
            .copied()
            .ok_or_else(|| Error::InvalidOperator(s.to_string()))
    }
}

impl fmt::Display for Operator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Logical combinator kinds.
///
/// `Not` negates the conjunction of its operands.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum CombinatorKind {
    And,
    Or,
    Not,
}

impl CombinatorKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            CombinatorKind::And => "and",
            CombinatorKind::Or => "or",
            CombinatorKind::Not => "not",
        }
    }
}

/// A single `field op value` test.
#[derive(Debug, Clone, PartialEq)]
pub struct Comparison {
    field: String,
    operator: Operator,
    value: Option<Value>,
}

impl Comparison {
    pub fn field(&self) -> &str {
        &self.field
    }

    pub fn operator(&self) -> Operator {
        self.operator
    }

    /// The operand, `None` for `is_null` / `not_null`
    pub fn value(&self) -> Option<&Value> {
        self.value.as_ref()
    }
}

/// A logical node over one or more operands. Only built through [`Filter`]
/// combinators, so the operand list is never empty.
#[derive(Debug, Clone, PartialEq)]
pub struct Combinator {
    kind: CombinatorKind,
    operands: Vec<Filter>,
}

impl Combinator {
    pub fn kind(&self) -> CombinatorKind {
        self.kind
    }

    pub fn operands(&self) -> &[Filter] {
        &self.operands
    }
}

/// Boolean filter expression sent to the service to select records.
#[derive(Debug, Clone, PartialEq)]
pub enum Filter {
    Comparison(Comparison),
    Combinator(Combinator),
}

impl Filter {
    /// Builds a comparison from an operator name, e.g. `"gte"`.
    pub fn comparison(field: impl Into<String>, operator: &str, value: Value) -> Result<Filter> {
        let operator = operator.parse::<Operator>()?;
        Filter::compare(field, operator, value)
    }

    /// Builds a comparison; `in` / `not_in` require an array operand.
    pub fn compare(field: impl Into<String>, operator: Operator, value: Value) -> Result<Filter> {
        let field = field.into();
        if operator.takes_sequence() && !value.is_array() {
            return Err(Error::InvalidValue {
                msg: format!(
                    "operator '{operator}' on field '{field}' requires a list, got {value}"
                ),
            });
        }
        let value = operator.takes_value().then_some(value);
        Ok(Filter::Comparison(Comparison {
            field,
            operator,
            value,
        }))
    }

    /// `self AND other`, appending to an existing AND node instead of nesting.
    pub fn and(self, other: Filter) -> Filter {
        self.combine(CombinatorKind::And, other)
    }

    /// `self OR other`, appending to an existing OR node instead of nesting.
    pub fn or(self, other: Filter) -> Filter {
        self.combine(CombinatorKind::Or, other)
    }

    /// Negates this expression.
    #[allow(clippy::should_implement_trait)]
    pub fn not(self) -> Filter {
        Filter::Combinator(Combinator {
            kind: CombinatorKind::Not,
            operands: vec![self],
        })
    }

    /// Conjunction of every filter, `None` when the iterator is empty.
    pub fn all<I: IntoIterator<Item = Filter>>(filters: I) -> Option<Filter> {
        filters.into_iter().reduce(Filter::and)
    }

    /// Disjunction of every filter, `None` when the iterator is empty.
    pub fn any<I: IntoIterator<Item = Filter>>(filters: I) -> Option<Filter> {
        filters.into_iter().reduce(Filter::or)
    }

    /// Negated conjunction: matches records failing at least one filter.
    pub fn not_all<I: IntoIterator<Item = Filter>>(filters: I) -> Option<Filter> {
        let operands: Vec<Filter> = filters.into_iter().collect();
        if operands.is_empty() {
            return None;
        }
        Some(Filter::Combinator(Combinator {
            kind: CombinatorKind::Not,
            operands,
        }))
    }

    /// Equality per entry, joined with AND. An empty mapping yields no filter.
    pub fn from_conditions<I, K, V>(conditions: I) -> Option<Filter>
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<Value>,
    {
        Filter::all(
            conditions
                .into_iter()
                .map(|(field, value)| Field::new(field).eq(value)),
        )
    }

    fn combine(self, kind: CombinatorKind, other: Filter) -> Filter {
        match (self, other) {
            (Filter::Combinator(mut left), Filter::Combinator(right))
                if left.kind == kind && right.kind == kind =>
            {
                left.operands.extend(right.operands);
                Filter::Combinator(left)
            }
            (Filter::Combinator(mut left), other) if left.kind == kind => {
                left.operands.push(other);
                Filter::Combinator(left)
            }
            (this, Filter::Combinator(mut right)) if right.kind == kind => {
                right.operands.insert(0, this);
                Filter::Combinator(right)
            }
            (this, other) => Filter::Combinator(Combinator {
                kind,
                operands: vec![this, other],
            }),
        }
    }

    /// Compiles the tree into its wire representation.
    pub fn compile(&self) -> FilterNode {
        match self {
            Filter::Comparison(c) => FilterNode::Leaf {
                field: c.field.clone(),
                op: c.operator,
                val: c.value.clone(),
            },
            Filter::Combinator(c) => FilterNode::Group {
                filter_type: c.kind,
                filters: c.operands.iter().map(Filter::compile).collect(),
            },
        }
    }
}

impl fmt::Display for Filter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Filter::Comparison(c) => match &c.value {
                Some(value) => write!(f, "{} {} {}", c.field, c.operator, value),
                None => write!(f, "{} {}", c.field, c.operator),
            },
            Filter::Combinator(c) if c.kind == CombinatorKind::Not => {
                f.write_str("not (")?;
                write_joined(f, &c.operands, " and ")?;
                f.write_str(")")
            }
            Filter::Combinator(c) => {
                let sep = if c.kind == CombinatorKind::And {
                    " and "
                } else {
                    " or "
                };
                f.write_str("(")?;
                write_joined(f, &c.operands, sep)?;
                f.write_str(")")
            }
        }
    }
}

fn write_joined(f: &mut fmt::Formatter<'_>, filters: &[Filter], sep: &str) -> fmt::Result {
    for (i, filter) in filters.iter().enumerate() {
        if i > 0 {
            f.write_str(sep)?;
        }
        write!(f, "{filter}")?;
    }
    Ok(())
}

/// Anything table-level calls accept as a record selector.
pub trait IntoFilter {
    fn into_filter(self) -> Option<Filter>;
}

impl IntoFilter for Filter {
    fn into_filter(self) -> Option<Filter> {
        Some(self)
    }
}

impl IntoFilter for Option<Filter> {
    fn into_filter(self) -> Option<Filter> {
        self
    }
}

impl IntoFilter for Map<String, Value> {
    fn into_filter(self) -> Option<Filter> {
        Filter::from_conditions(self)
    }
}

impl IntoFilter for &Map<String, Value> {
    fn into_filter(self) -> Option<Filter> {
        Filter::from_conditions(self.iter().map(|(k, v)| (k.clone(), v.clone())))
    }
}

impl<K: Into<String>, V: Into<Value>> IntoFilter for Vec<(K, V)> {
    fn into_filter(self) -> Option<Filter> {
        Filter::from_conditions(self)
    }
}

/// Named handle on a table column with one builder method per operator.
#[derive(Debug, Clone)]
pub struct Field {
    name: String,
}

impl Field {
    pub fn new(name: impl Into<String>) -> Self {
        Self { name: name.into() }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    fn leaf(&self, operator: Operator, value: Option<Value>) -> Filter {
        Filter::Comparison(Comparison {
            field: self.name.clone(),
            operator,
            value,
        })
    }

    pub fn eq(&self, value: impl Into<Value>) -> Filter {
        self.leaf(Operator::Eq, Some(value.into()))
    }

    pub fn neq(&self, value: impl Into<Value>) -> Filter {
        self.leaf(Operator::Neq, Some(value.into()))
    }

    pub fn gt(&self, value: impl Into<Value>) -> Filter {
        self.leaf(Operator::Gt, Some(value.into()))
    }

    pub fn gte(&self, value: impl Into<Value>) -> Filter {
        self.leaf(Operator::Gte, Some(value.into()))
    }

    pub fn lt(&self, value: impl Into<Value>) -> Filter {
        self.leaf(Operator::Lt, Some(value.into()))
    }

    pub fn lte(&self, value: impl Into<Value>) -> Filter {
        self.leaf(Operator::Lte, Some(value.into()))
    }

    pub fn contain(&self, value: impl Into<Value>) -> Filter {
        self.leaf(Operator::Contain, Some(value.into()))
    }

    pub fn in_<I, V>(&self, values: I) -> Filter
    where
        I: IntoIterator<Item = V>,
        V: Into<Value>,
    {
        let values = values.into_iter().map(Into::into).collect();
        self.leaf(Operator::In, Some(Value::Array(values)))
    }

    pub fn not_in<I, V>(&self, values: I) -> Filter
    where
        I: IntoIterator<Item = V>,
        V: Into<Value>,
    {
        let values = values.into_iter().map(Into::into).collect();
        self.leaf(Operator::NotIn, Some(Value::Array(values)))
    }

    pub fn is_null(&self) -> Filter {
        self.leaf(Operator::IsNull, None)
    }

    pub fn not_null(&self) -> Filter {
        self.leaf(Operator::NotNull, None)
    }

    pub fn asc(&self) -> Order {
        Order::new(self.name.clone(), Direction::Asc)
    }

    pub fn desc(&self) -> Order {
        Order::new(self.name.clone(), Direction::Desc)
    }

    pub fn order(&self, direction: Direction) -> Order {
        Order::new(self.name.clone(), direction)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn parses_every_operator() {
        for op in Operator::ALL {
            assert_eq!(op.as_str().parse::<Operator>().unwrap(), op);
        }
        assert!(matches!(
            "like".parse::<Operator>(),
            Err(Error::InvalidOperator(name)) if name == "like"
        ));
    }

    #[test]
    fn null_checks_drop_their_operand() {
        let f = Filter::comparison("title", "is_null", json!("ignored")).unwrap();
        let Filter::Comparison(c) = f else {
            panic!("expected comparison");
        };
        assert_eq!(c.value(), None);
    }

    #[test]
    fn display_is_readable() {
        let f = Field::new("age")
            .gt(3)
            .and(Field::new("name").eq("sam"))
            .or(Field::new("vip").not_null());
        assert_eq!(f.to_string(), "((age gt 3 and name eq \"sam\") or vip not_null)");
        assert_eq!(Field::new("a").eq(1).not().to_string(), "not (a eq 1)");
    }
}
