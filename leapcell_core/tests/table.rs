mod common;

use std::collections::BTreeMap;
use std::fs;
use std::io::Write;

use anyhow::Result;
use common::{record_json, table_with, MockTransport, PREFIX, REPOSITORY, TABLE_ID};
use leapcell_core::{
    Body, ClientOptions, Error, FieldType, Leapcell, Method, NameType, OrderSpec, SearchOptions,
    FILE_UPLOAD_MAX_SIZE,
};
use pretty_assertions::assert_eq;
use serde_json::{json, Map, Value};
use tempfile::NamedTempFile;

fn fields(value: Value) -> Map<String, Value> {
    match value {
        Value::Object(map) => map,
        _ => Map::new(),
    }
}

#[test]
fn test_table_requires_identifiers() {
    let client = Leapcell::with_transport(MockTransport::default(), ClientOptions::default());
    assert!(matches!(
        client.table("", TABLE_ID, NameType::Name),
        Err(Error::MissingArgument("repository"))
    ));
    assert!(matches!(
        client.table(REPOSITORY, "", NameType::Name),
        Err(Error::MissingArgument("table_id"))
    ));
}

#[test]
fn test_meta() -> Result<()> {
    let table = table_with(vec![json!({
        "fields": {
            "fld1": {"id": "fld1", "name": "title", "type": "STR"},
            "fld2": {"id": "fld2", "name": "views", "type": "INT_NUMBER"},
        }
    })])?;
    let meta = table.meta()?;
    assert_eq!(meta.field("title").map(|f| f.field_type), Some(FieldType::Str));
    assert_eq!(meta.field_id_metas().len(), 2);
    assert!(meta.field_metas().contains_key("views"));

    let request = table.requester().transport().last();
    assert_eq!(request.method, Method::Get);
    assert_eq!(request.path, PREFIX);
    assert_eq!(request.params, vec![("name_type".to_string(), "name".to_string())]);
    Ok(())
}

#[test]
fn test_create_without_conflicts() -> Result<()> {
    let table = table_with(vec![json!({
        "record": record_json("rec1", json!({"title": "hello"}))
    })])?;
    let record = table.create(fields(json!({"title": "hello"})), &[])?;
    assert_eq!(record.record_id(), Some("rec1"));
    assert_eq!(record.create_time(), Some(1700000000));
    assert_eq!(
        table.requester().transport().last_body(),
        json!({"record": {"title": "hello"}, "name_type": "name"})
    );
    Ok(())
}

#[test]
fn test_upsert_sends_action() -> Result<()> {
    let table = table_with(vec![json!({
        "record": record_json("rec1", json!({"email": "a@b.c"}))
    })])?;
    table.upsert(fields(json!({"email": "a@b.c"})), &["email"])?;
    assert_eq!(
        table.requester().transport().last_body(),
        json!({
            "record": {"email": "a@b.c"},
            "on_conflict": ["email"],
            "action": "upsert",
            "name_type": "name",
        })
    );
    Ok(())
}

#[test]
fn test_create_without_record_is_unexpected() -> Result<()> {
    let table = table_with(vec![json!({})])?;
    let err = table.create(fields(json!({"title": "x"})), &[]).unwrap_err();
    assert!(matches!(err, Error::UnexpectedShape(_)));
    Ok(())
}

#[test]
fn test_bulk_create_and_upsert() -> Result<()> {
    let table = table_with(vec![
        json!({"records": [record_json("r1", json!({"n": 1})), record_json("r2", json!({"n": 2}))]}),
        json!({"records": []}),
    ])?;
    let rows = vec![fields(json!({"n": 1})), fields(json!({"n": 2}))];

    let created = table.bulk_create(rows.clone(), &["n"])?;
    assert_eq!(created.len(), 2);
    assert_eq!(
        table.requester().transport().last_body(),
        json!({"records": [{"n": 1}, {"n": 2}], "on_conflict": ["n"], "name_type": "name"})
    );

    let upserted = table.bulk_upsert(rows, &["n"])?;
    assert!(upserted.is_empty());
    assert_eq!(table.requester().transport().last_body()["action"], json!("upsert"));
    Ok(())
}

#[test]
fn test_get_by_id() -> Result<()> {
    let table = table_with(vec![json!({"record": record_json("rec9", json!({"title": "t"}))})])?;
    let record = table.get_by_id("rec9")?;
    assert_eq!(record.as_ref().and_then(|r| r.record_id()), Some("rec9"));

    let request = table.requester().transport().last();
    assert_eq!(request.method, Method::Get);
    assert_eq!(request.path, format!("{PREFIX}/record/rec9"));

    assert!(table.get_by_id("missing")?.is_none());
    Ok(())
}

#[test]
fn test_get_uses_limit_one_and_conditions() -> Result<()> {
    let table = table_with(vec![])?;
    let found = table.get(vec![("a", 1), ("b", 2)], table.field("a").desc())?;
    assert!(found.is_none());
    assert_eq!(
        table.requester().transport().last_body(),
        json!({
            "limit": 1,
            "offset": 0,
            "filter": {
                "filterType": "and",
                "filters": [
                    {"field": "a", "op": "eq", "val": 1},
                    {"field": "b", "op": "eq", "val": 2},
                ],
            },
            "orders": [{"field": "a", "sortType": "DESC"}],
            "name_type": "name",
        })
    );
    Ok(())
}

#[test]
fn test_empty_conditions_are_rejected() -> Result<()> {
    let table = table_with(vec![json!({"affect_count": 7})])?;
    let err = table.delete(Map::new()).unwrap_err();
    assert!(matches!(err, Error::MissingArgument("conditions")));
    let err = table
        .get(Vec::<(String, Value)>::new(), OrderSpec::new())
        .unwrap_err();
    assert!(matches!(err, Error::MissingArgument("conditions")));
    assert!(table.requester().transport().requests().is_empty());
    Ok(())
}

#[test]
fn test_clearing_the_table_goes_through_a_query() -> Result<()> {
    let table = table_with(vec![json!({"affect_count": 7})])?;
    let deleted = table.select(Vec::<String>::new()).delete()?;
    assert_eq!(deleted, Some(7));
    assert_eq!(
        table.requester().transport().last_body(),
        json!({"filter": null, "name_type": "name"})
    );
    Ok(())
}

#[test]
fn test_delete_by_conditions() -> Result<()> {
    let table = table_with(vec![json!({"affect_count": 2})])?;
    let deleted = table.delete(vec![("author", "sam")])?;
    assert_eq!(deleted, Some(2));
    let request = table.requester().transport().last();
    assert_eq!(request.method, Method::Delete);
    assert_eq!(request.path, format!("{PREFIX}/record"));
    assert_eq!(
        request.json().cloned(),
        Some(json!({
            "filter": {"field": "author", "op": "eq", "val": "sam"},
            "name_type": "name",
        }))
    );
    Ok(())
}

#[test]
fn test_delete_by_id() -> Result<()> {
    let table = table_with(vec![])?;
    table.delete_by_id("rec1")?;
    let request = table.requester().transport().last();
    assert_eq!(request.method, Method::Delete);
    assert_eq!(request.path, format!("{PREFIX}/record/rec1"));
    assert_eq!(request.body, Body::Empty);
    Ok(())
}

#[test]
fn test_count_by_filter() -> Result<()> {
    let table = table_with(vec![json!({"metric": {"value": 3}})])?;
    let count = table.count(table.field("age").gte(18))?;
    assert_eq!(count, Some(3));
    assert_eq!(
        table.requester().transport().last_body()["filter"],
        json!({"field": "age", "op": "gte", "val": 18})
    );
    Ok(())
}

#[test]
fn test_search_options() -> Result<()> {
    let table = table_with(vec![json!({
        "records": [record_json("rec1", json!({"title": "rust book"}))]
    })])?;
    let mut boost_fields = BTreeMap::new();
    boost_fields.insert("title".to_string(), 3);
    let options = SearchOptions {
        search_fields: vec!["title".to_string()],
        boost_fields,
        offset: 10,
        ..SearchOptions::default()
    };
    let records = table.search("rust", options)?;
    assert_eq!(records.len(), 1);

    let request = table.requester().transport().last();
    assert_eq!(request.path, format!("{PREFIX}/record/search"));
    assert_eq!(
        request.json().cloned(),
        Some(json!({
            "query": "rust",
            "search_fields": ["title"],
            "offset": 10,
            "limit": 10,
            "boost_fields": {"title": 3},
            "name_type": "name",
        }))
    );
    Ok(())
}

#[test]
fn test_upload_file() -> Result<()> {
    let table = table_with(vec![json!({
        "file": {"id": "f1", "link": "https://cdn/f1.png", "meta": {"width": 4, "height": 2}}
    })])?;
    let file = table.upload_file(vec![1u8, 2, 3], Some("pic.png"))?;
    assert_eq!(file.link(), "https://cdn/f1.png");
    assert_eq!(file.width(), 4);

    let request = table.requester().transport().last();
    assert_eq!(request.path, format!("{PREFIX}/upload"));
    match request.body {
        Body::Multipart { field, files } => {
            assert_eq!(field, "file");
            assert_eq!(files.len(), 1);
            assert_eq!(files[0].file_name, "pic.png");
        }
        other => panic!("expected multipart body, got {other:?}"),
    }
    Ok(())
}

#[test]
fn test_upload_files() -> Result<()> {
    let table = table_with(vec![json!({
        "files": [{"id": "f1", "link": "l1"}, {"id": "f2", "link": "l2"}]
    })])?;
    let files = table.upload_files(vec![vec![1u8], vec![2u8]])?;
    assert_eq!(files.iter().map(|f| f.id()).collect::<Vec<_>>(), vec!["f1", "f2"]);
    let request = table.requester().transport().last();
    assert_eq!(request.path, format!("{PREFIX}/upload_multi"));
    assert!(matches!(request.body, Body::Multipart { ref field, .. } if field == "files"));
    Ok(())
}

#[test]
fn test_upload_from_disk() -> Result<()> {
    let table = table_with(vec![json!({"file": {"id": "f3", "link": "l3"}})])?;
    let mut tmp = NamedTempFile::new()?;
    tmp.write_all(b"\x89PNG fake image")?;
    let bytes = fs::read(tmp.path())?;
    let file = table.upload_file(bytes, Some("cover.png"))?;
    assert_eq!(file.id(), "f3");
    match table.requester().transport().last().body {
        Body::Multipart { files, .. } => {
            assert_eq!(&files[0].bytes[..], b"\x89PNG fake image");
        }
        other => panic!("expected multipart body, got {other:?}"),
    }
    Ok(())
}

#[test]
fn test_oversized_upload_is_rejected_locally() -> Result<()> {
    let table = table_with(vec![])?;
    let payload = vec![0u8; FILE_UPLOAD_MAX_SIZE + 1];
    let err = table.upload_file(payload, None).unwrap_err();
    assert!(matches!(err, Error::FileTooLarge { .. }));
    assert!(table.requester().transport().requests().is_empty());
    Ok(())
}

#[test]
fn test_id_name_type_is_sent() -> Result<()> {
    let client = Leapcell::with_transport(MockTransport::default(), ClientOptions::default());
    let table = client.table(REPOSITORY, TABLE_ID, NameType::Id)?;
    table.select(["fld1"]).query()?;
    assert_eq!(table.requester().transport().last_body()["name_type"], json!("id"));
    assert_eq!(
        table.to_string(),
        format!("table instance <table: {TABLE_ID}, resource: {REPOSITORY}>")
    );
    Ok(())
}
