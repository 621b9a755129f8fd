#![allow(dead_code)]

use std::cell::RefCell;
use std::collections::VecDeque;

use leapcell_core::{ApiRequest, ClientOptions, Leapcell, NameType, Result, Table, Transport};
use serde_json::{json, Value};

/// Records every request and replays queued `data` payloads in order.
/// Once the queue is empty every call returns `null`.
#[derive(Default)]
pub struct MockTransport {
    requests: RefCell<Vec<ApiRequest>>,
    responses: RefCell<VecDeque<Value>>,
}

impl MockTransport {
    pub fn with_responses<I: IntoIterator<Item = Value>>(responses: I) -> Self {
        Self {
            requests: RefCell::new(Vec::new()),
            responses: RefCell::new(responses.into_iter().collect()),
        }
    }

    pub fn requests(&self) -> Vec<ApiRequest> {
        self.requests.borrow().clone()
    }

    pub fn last(&self) -> ApiRequest {
        self.requests
            .borrow()
            .last()
            .cloned()
            .expect("no request was sent")
    }

    pub fn last_body(&self) -> Value {
        self.last().json().cloned().unwrap_or(Value::Null)
    }
}

impl Transport for MockTransport {
    fn send(&self, request: ApiRequest) -> Result<Value> {
        self.requests.borrow_mut().push(request);
        Ok(self.responses.borrow_mut().pop_front().unwrap_or(Value::Null))
    }
}

pub const REPOSITORY: &str = "salamer/myblog";
pub const TABLE_ID: &str = "tbl1700559237082210304";
pub const PREFIX: &str = "/api/v1/salamer/myblog/table/tbl1700559237082210304";

pub fn init_logger() {
    let _ = env_logger::builder().is_test(true).try_init();
}

pub fn table_with(responses: Vec<Value>) -> Result<Table<MockTransport>> {
    init_logger();
    let client = Leapcell::with_transport(
        MockTransport::with_responses(responses),
        ClientOptions::default(),
    );
    client.table(REPOSITORY, TABLE_ID, NameType::Name)
}

pub fn record_json(id: &str, fields: Value) -> Value {
    json!({
        "record_id": id,
        "fields": fields,
        "create_time": 1700000000,
        "update_time": 1700000100,
    })
}
