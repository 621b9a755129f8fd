use std::fmt;

use serde_json::Value;

use crate::error::{Error, Result};
use crate::file::FilePart;

#[cfg(feature = "http")]
mod http;
#[cfg(feature = "http")]
pub use http::*;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Method {
    Get,
    Post,
    Put,
    Delete,
}

impl Method {
    pub fn as_str(&self) -> &'static str {
        match self {
            Method::Get => "GET",
            Method::Post => "POST",
            Method::Put => "PUT",
            Method::Delete => "DELETE",
        }
    }

    /// Whether sending the request twice has the same effect as sending it once
    pub fn is_idempotent(&self) -> bool {
        !matches!(self, Method::Post)
    }
}

impl fmt::Display for Method {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum Body {
    Empty,
    Json(Value),
    /// Files sent under one multipart field name
    Multipart { field: String, files: Vec<FilePart> },
}

/// One call against the service, relative to the configured base url.
#[derive(Debug, Clone, PartialEq)]
pub struct ApiRequest {
    pub method: Method,
    pub path: String,
    pub params: Vec<(String, String)>,
    pub body: Body,
}

impl ApiRequest {
    pub fn new(method: Method, path: impl Into<String>) -> Self {
        Self {
            method,
            path: path.into(),
            params: Vec::new(),
            body: Body::Empty,
        }
    }

    pub fn get(path: impl Into<String>) -> Self {
        Self::new(Method::Get, path)
    }

    pub fn post(path: impl Into<String>) -> Self {
        Self::new(Method::Post, path)
    }

    pub fn put(path: impl Into<String>) -> Self {
        Self::new(Method::Put, path)
    }

    pub fn delete(path: impl Into<String>) -> Self {
        Self::new(Method::Delete, path)
    }

    pub fn with_param(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.params.push((key.into(), value.into()));
        self
    }

    pub fn with_json(mut self, body: Value) -> Self {
        self.body = Body::Json(body);
        self
    }

    pub fn with_files(mut self, field: impl Into<String>, files: Vec<FilePart>) -> Self {
        self.body = Body::Multipart {
            field: field.into(),
            files,
        };
        self
    }

    /// The JSON body, if this request carries one
    pub fn json(&self) -> Option<&Value> {
        match &self.body {
            Body::Json(value) => Some(value),
            _ => None,
        }
    }
}

/// Sends one request and returns the `data` member of the response envelope.
///
/// Implementations perform exactly one logical round trip per call and do not
/// interpret the payload.
pub trait Transport {
    fn send(&self, request: ApiRequest) -> Result<Value>;
}

impl<T: Transport + ?Sized> Transport for Box<T> {
    fn send(&self, request: ApiRequest) -> Result<Value> {
        (**self).send(request)
    }
}

/// Checks the response envelope and extracts `data`.
pub fn unwrap_envelope(status: u16, body: &[u8]) -> Result<Value> {
    let envelope: Value = serde_json::from_slice(body).map_err(|_| Error::BadResponse {
        status,
        body: String::from_utf8_lossy(body).into_owned(),
    })?;
    let code = envelope_str(&envelope, "code");
    let hint = envelope_str(&envelope, "error");
    if status != 200 {
        return Err(Error::Service { status, code, hint });
    }
    match envelope {
        Value::Object(mut map) if map.contains_key("data") => {
            Ok(map.remove("data").unwrap_or(Value::Null))
        }
        _ => Err(Error::MissingData { status, code, hint }),
    }
}

fn envelope_str(envelope: &Value, key: &str) -> String {
    match envelope.get(key) {
        Some(Value::String(s)) => s.clone(),
        Some(Value::Null) | None => String::new(),
        Some(other) => other.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn extracts_data() {
        let data = unwrap_envelope(200, br#"{"data": {"affect_count": 2}}"#).unwrap();
        assert_eq!(data, json!({"affect_count": 2}));
        let data = unwrap_envelope(200, br#"{"data": null}"#).unwrap();
        assert_eq!(data, Value::Null);
    }

    #[test]
    fn non_json_body_is_bad_response() {
        let err = unwrap_envelope(502, b"<html>bad gateway</html>").unwrap_err();
        assert!(
            matches!(err, Error::BadResponse { status: 502, ref body } if body.contains("gateway"))
        );
    }

    #[test]
    fn error_status_carries_code_and_hint() {
        let err = unwrap_envelope(403, br#"{"code": "forbidden", "error": "token expired"}"#)
            .unwrap_err();
        match err {
            Error::Service { status, code, hint } => {
                assert_eq!(status, 403);
                assert_eq!(code, "forbidden");
                assert_eq!(hint, "token expired");
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn missing_data_is_an_error() {
        let err = unwrap_envelope(200, br#"{"code": 0}"#).unwrap_err();
        assert!(matches!(err, Error::MissingData { status: 200, ref code, .. } if code == "0"));
        assert!(err.is_service_error());
    }
}
