use reqwest::blocking::{multipart, Client, RequestBuilder};
use serde_json::Value;
use tracing::{trace, warn};

use super::{unwrap_envelope, ApiRequest, Body, Method, Transport};
use crate::config::ClientOptions;
use crate::error::{Error, Result};

/// Blocking reqwest transport with bearer auth, a fixed timeout and a fixed
/// retry budget. Connect failures are retried for every method; timeouts only
/// for idempotent ones, since the service may already have applied a POST.
#[derive(Debug, Clone)]
pub struct HttpTransport {
    client: Client,
    base_url: String,
    api_key: String,
    max_retries: u32,
}

impl HttpTransport {
    pub fn new(api_key: impl Into<String>, options: &ClientOptions) -> Result<Self> {
        let client = Client::builder()
            .timeout(options.timeout)
            .user_agent(options.user_agent.clone())
            .gzip(true)
            .build()?;
        Ok(Self {
            client,
            base_url: options.base_url.trim_end_matches('/').to_string(),
            api_key: api_key.into(),
            max_retries: options.max_retries,
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn url(&self, path: &str) -> String {
        format!("{}/{}", self.base_url, path.trim_start_matches('/'))
    }

    fn build(&self, request: &ApiRequest) -> RequestBuilder {
        let method = match request.method {
            Method::Get => reqwest::Method::GET,
            Method::Post => reqwest::Method::POST,
            Method::Put => reqwest::Method::PUT,
            Method::Delete => reqwest::Method::DELETE,
        };
        let builder = self
            .client
            .request(method, self.url(&request.path))
            .bearer_auth(&self.api_key)
            .query(&request.params);
        match &request.body {
            Body::Empty => builder,
            Body::Json(value) => builder.json(value),
            Body::Multipart { field, files } => {
                let form = files.iter().fold(multipart::Form::new(), |form, file| {
                    let part = multipart::Part::bytes(file.bytes.to_vec())
                        .file_name(file.file_name.clone());
                    form.part(field.clone(), part)
                });
                builder.multipart(form)
            }
        }
    }

    fn execute(&self, request: &ApiRequest) -> Result<Value> {
        let response = self.build(request).send()?;
        let status = response.status().as_u16();
        let body = response.bytes()?;
        unwrap_envelope(status, &body)
    }
}

fn retryable(method: Method, error: &reqwest::Error) -> bool {
    error.is_connect() || (error.is_timeout() && method.is_idempotent())
}

impl Transport for HttpTransport {
    fn send(&self, request: ApiRequest) -> Result<Value> {
        let mut attempt = 0;
        loop {
            match self.execute(&request) {
                Err(Error::Transport(e))
                    if attempt < self.max_retries && retryable(request.method, &e) =>
                {
                    attempt += 1;
                    warn!(
                        "{} {} failed ({e}), retrying {attempt}/{}",
                        request.method, request.path, self.max_retries
                    );
                }
                result => {
                    trace!(
                        "{} {} done after {} attempt(s)",
                        request.method,
                        request.path,
                        attempt + 1
                    );
                    return result;
                }
            }
        }
    }
}
