#[cfg(feature = "http")]
use std::env;
use std::sync::Arc;

#[cfg(feature = "http")]
use crate::config::API_TOKEN_ENV;
use crate::config::{ClientOptions, NameType};
use crate::error::{Error, Result};
use crate::requester::{endpoint, Requester};
use crate::table::Table;
use crate::transport::Transport;

#[cfg(feature = "http")]
use crate::transport::HttpTransport;

/// Entry point: holds the transport and hands out [`Table`] handles.
pub struct Leapcell<T> {
    transport: Arc<T>,
    options: ClientOptions,
}

#[cfg(feature = "http")]
impl Leapcell<HttpTransport> {
    /// Client against the configured service. An empty key falls back to
    /// `LEAPCELL_API_TOKEN`.
    pub fn new(api_key: &str) -> Result<Self> {
        Self::with_options(api_key, ClientOptions::from_env())
    }

    pub fn with_options(api_key: &str, options: ClientOptions) -> Result<Self> {
        let api_key = match api_key {
            "" => env::var(API_TOKEN_ENV).unwrap_or_default(),
            key => key.to_string(),
        };
        if api_key.is_empty() {
            return Err(Error::MissingArgument("api_key"));
        }
        let transport = HttpTransport::new(api_key, &options)?;
        Ok(Self::with_transport(transport, options))
    }

    /// Reads the key from `LEAPCELL_API_TOKEN` and the url from `LEAPCELL_API_URL`.
    pub fn from_env() -> Result<Self> {
        Self::new("")
    }
}

impl<T: Transport> Leapcell<T> {
    pub fn with_transport(transport: T, options: ClientOptions) -> Self {
        Self {
            transport: Arc::new(transport),
            options,
        }
    }

    pub fn options(&self) -> &ClientOptions {
        &self.options
    }

    pub fn transport(&self) -> &T {
        &self.transport
    }

    /// Handle on `repository` (`{user}/{repo}`) / `table_id`.
    pub fn table(&self, repository: &str, table_id: &str, name_type: NameType) -> Result<Table<T>> {
        if repository.is_empty() {
            return Err(Error::MissingArgument("repository"));
        }
        if table_id.is_empty() {
            return Err(Error::MissingArgument("table_id"));
        }
        let prefix = endpoint(&self.options.version, repository, table_id);
        let requester = Requester::new(Arc::clone(&self.transport), prefix, name_type);
        Ok(Table::new(
            requester,
            repository.to_string(),
            table_id.to_string(),
        ))
    }
}
