use anyhow::Result;
use leapcell_core::{Error, Field, Filter, FilterNode, Operator, Order, OrderSpec};
use pretty_assertions::assert_eq;
use serde_json::{json, Map, Value};

fn leaf(field: &str, op: Operator, val: Value) -> FilterNode {
    FilterNode::Leaf {
        field: field.to_string(),
        op,
        val: Some(val),
    }
}

#[test]
fn test_leaf_compiles_to_field_op_val() -> Result<()> {
    let filter = Filter::comparison("author", "eq", json!("sam"))?;
    assert_eq!(filter.compile(), leaf("author", Operator::Eq, json!("sam")));
    assert_eq!(
        serde_json::to_value(filter.compile())?,
        json!({"field": "author", "op": "eq", "val": "sam"})
    );
    Ok(())
}

#[test]
fn test_every_operator_compiles_to_wire_object() -> Result<()> {
    for op in Operator::ALL {
        let value = if op.takes_sequence() {
            json!(["a", "b"])
        } else {
            json!(7)
        };
        let filter = Filter::comparison("score", op.as_str(), value.clone())?;
        let expected_val = if op.takes_value() { value } else { Value::Null };
        assert_eq!(
            serde_json::to_value(filter.compile())?,
            json!({"field": "score", "op": op.as_str(), "val": expected_val}),
            "operator {op}"
        );
    }
    Ok(())
}

#[test]
fn test_unknown_operator_is_rejected() {
    let err = Filter::comparison("author", "like", json!("sam")).unwrap_err();
    assert!(err.is_configuration_error());
}

#[test]
fn test_and_flattening_keeps_every_operand() -> Result<()> {
    let title = Field::new("title");
    let left = title.eq("a").and(title.eq("b"));
    let right = title.eq("c").and(title.eq("d")).and(title.eq("e"));
    let combined = left.and(right);
    match &combined {
        Filter::Combinator(group) => assert_eq!(group.operands().len(), 5),
        other => panic!("expected a group, got {other}"),
    }
    let wire = serde_json::to_value(combined.compile())?;
    assert_eq!(wire["filterType"], json!("and"));
    assert_eq!(wire["filters"].as_array().map(Vec::len), Some(5));
    Ok(())
}

#[test]
fn test_mixed_combinators_nest() -> Result<()> {
    let age = Field::new("age");
    let filter = age.gt(3).and(Field::new("name").eq("sam")).or(Field::new("vip").not_null());
    assert_eq!(
        filter.to_string(),
        r#"((age gt 3 and name eq "sam") or vip not_null)"#
    );
    assert_eq!(
        serde_json::to_value(filter.compile())?,
        json!({
            "filterType": "or",
            "filters": [
                {
                    "filterType": "and",
                    "filters": [
                        {"field": "age", "op": "gt", "val": 3},
                        {"field": "name", "op": "eq", "val": "sam"},
                    ],
                },
                {"field": "vip", "op": "not_null", "val": null},
            ],
        })
    );
    Ok(())
}

#[test]
fn test_not_wraps_its_operand() -> Result<()> {
    let filter = Field::new("a").eq(1).not();
    assert_eq!(
        serde_json::to_value(filter.compile())?,
        json!({"filterType": "not", "filters": [{"field": "a", "op": "eq", "val": 1}]})
    );
    Ok(())
}

#[test]
fn test_membership_requires_sequence() -> Result<()> {
    let filter = Field::new("tag").in_(["rust", "go"]);
    assert_eq!(
        filter.compile(),
        leaf("tag", Operator::In, json!(["rust", "go"]))
    );
    assert!(matches!(
        Filter::comparison("tag", "in", json!("rust")),
        Err(Error::InvalidValue { .. })
    ));
    assert!(matches!(
        Filter::comparison("tag", "not_in", json!("rust")),
        Err(Error::InvalidValue { .. })
    ));
    Ok(())
}

#[test]
fn test_conditions_mapping() {
    let mut conditions = Map::new();
    conditions.insert("a".to_string(), json!(1));
    conditions.insert("b".to_string(), json!(2));
    let filter = Filter::from_conditions(conditions).expect("two conditions");
    match filter {
        Filter::Combinator(group) => {
            assert_eq!(group.operands().len(), 2);
            for operand in group.operands() {
                match operand {
                    Filter::Comparison(c) => assert_eq!(c.operator(), Operator::Eq),
                    other => panic!("expected a comparison, got {other}"),
                }
            }
        }
        other => panic!("expected a group, got {other}"),
    }

    let single = Filter::from_conditions([("a", 1)]).expect("one condition");
    assert!(matches!(single, Filter::Comparison(_)));
    assert!(Filter::from_conditions(Vec::<(String, Value)>::new()).is_none());
}

#[test]
fn test_order_compile_preserves_order() -> Result<()> {
    let spec: OrderSpec = vec![
        Field::new("b").asc(),
        Field::new("a").desc(),
        Order::parse("c", "asc")?,
    ]
    .into();
    assert_eq!(
        serde_json::to_value(spec.compile())?,
        json!([
            {"field": "b", "sortType": "ASC"},
            {"field": "a", "sortType": "DESC"},
            {"field": "c", "sortType": "ASC"},
        ])
    );
    assert!(Order::parse("c", "up").is_err());
    Ok(())
}
