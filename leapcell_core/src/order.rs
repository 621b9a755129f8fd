use std::fmt;
use std::str::FromStr;

use serde::Serialize;

use crate::error::{Error, Result};
use crate::request::SortNode;

/// Sort direction; serialized as the service's `sortType`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize)]
pub enum Direction {
    #[serde(rename = "ASC")]
    Asc,
    #[default]
    #[serde(rename = "DESC")]
    Desc,
}

impl FromStr for Direction {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "asc" => Ok(Direction::Asc),
            "desc" => Ok(Direction::Desc),
            other => Err(Error::InvalidDirection(other.to_string())),
        }
    }
}

impl fmt::Display for Direction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Direction::Asc => f.write_str("asc"),
            Direction::Desc => f.write_str("desc"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Order {
    field: String,
    direction: Direction,
}

impl Order {
    pub fn new(field: impl Into<String>, direction: Direction) -> Self {
        Self {
            field: field.into(),
            direction,
        }
    }

    /// Parses the direction eagerly so a bad value never reaches a request.
    pub fn parse(field: impl Into<String>, direction: &str) -> Result<Self> {
        Ok(Self::new(field, direction.parse()?))
    }

    pub fn field(&self) -> &str {
        &self.field
    }

    pub fn direction(&self) -> Direction {
        self.direction
    }
}

impl fmt::Display for Order {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.field, self.direction)
    }
}

impl<S: Into<String>> From<(S, Direction)> for Order {
    fn from((field, direction): (S, Direction)) -> Self {
        Order::new(field, direction)
    }
}

impl TryFrom<(&str, &str)> for Order {
    type Error = Error;

    fn try_from((field, direction): (&str, &str)) -> Result<Self> {
        Order::parse(field, direction)
    }
}

/// Ordered list of sort keys. Repeated fields are kept; the service decides
/// which one wins.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct OrderSpec {
    orders: Vec<Order>,
}

impl OrderSpec {
    pub fn new() -> Self {
        Self::default()
    }

    /// Parses `(field, "asc" | "desc")` pairs, failing on the first bad direction.
    pub fn parse<'a, I>(pairs: I) -> Result<Self>
    where
        I: IntoIterator<Item = (&'a str, &'a str)>,
    {
        pairs.into_iter().map(Order::try_from).collect()
    }

    pub fn push(&mut self, order: Order) -> &mut Self {
        self.orders.push(order);
        self
    }

    pub fn add(&mut self, field: impl Into<String>, direction: &str) -> Result<&mut Self> {
        let order = Order::parse(field, direction)?;
        Ok(self.push(order))
    }

    pub fn is_empty(&self) -> bool {
        self.orders.is_empty()
    }

    pub fn len(&self) -> usize {
        self.orders.len()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Order> {
        self.orders.iter()
    }

    pub fn compile(&self) -> Vec<SortNode> {
        self.orders
            .iter()
            .map(|order| SortNode {
                field: order.field.clone(),
                sort_type: order.direction,
            })
            .collect()
    }
}

impl From<Order> for OrderSpec {
    fn from(order: Order) -> Self {
        Self {
            orders: vec![order],
        }
    }
}

impl From<Vec<Order>> for OrderSpec {
    fn from(orders: Vec<Order>) -> Self {
        Self { orders }
    }
}

impl<S: Into<String>> From<(S, Direction)> for OrderSpec {
    fn from(pair: (S, Direction)) -> Self {
        Order::from(pair).into()
    }
}

impl FromIterator<Order> for OrderSpec {
    fn from_iter<I: IntoIterator<Item = Order>>(iter: I) -> Self {
        Self {
            orders: iter.into_iter().collect(),
        }
    }
}

impl Extend<Order> for OrderSpec {
    fn extend<I: IntoIterator<Item = Order>>(&mut self, iter: I) {
        self.orders.extend(iter);
    }
}

impl<'a> IntoIterator for &'a OrderSpec {
    type Item = &'a Order;
    type IntoIter = std::slice::Iter<'a, Order>;

    fn into_iter(self) -> Self::IntoIter {
        self.orders.iter()
    }
}

impl IntoIterator for OrderSpec {
    type Item = Order;
    type IntoIter = std::vec::IntoIter<Order>;

    fn into_iter(self) -> Self::IntoIter {
        self.orders.into_iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rejects_unknown_direction_on_insert() {
        let mut spec = OrderSpec::new();
        assert!(spec.add("name", "asc").is_ok());
        assert!(matches!(
            spec.add("name", "up"),
            Err(Error::InvalidDirection(d)) if d == "up"
        ));
        assert_eq!(spec.len(), 1);
    }

    #[test]
    fn keeps_duplicate_fields() {
        let spec: OrderSpec = vec![
            Order::new("age", Direction::Asc),
            Order::new("age", Direction::Desc),
        ]
        .into();
        let compiled = spec.compile();
        assert_eq!(compiled.len(), 2);
        assert_eq!(compiled[1].sort_type, Direction::Desc);
    }
}
