use std::env;
use std::fmt;
use std::str::FromStr;
use std::time::Duration;

use serde::Serialize;

use crate::error::Error;

pub const DEFAULT_BASE_URL: &str = "https://api.leapcell.io";
pub const DEFAULT_API_VERSION: &str = "v1";
pub const API_URL_ENV: &str = "LEAPCELL_API_URL";
pub const API_TOKEN_ENV: &str = "LEAPCELL_API_TOKEN";

pub const TIMEOUT_SECS: u64 = 600;
pub const MAX_CONNECTION_RETRIES: u32 = 2;
/// Upload payloads above this size are rejected before any request is made.
pub const FILE_UPLOAD_MAX_SIZE: usize = 1024 * 1024 * 3;

/// How fields are addressed in requests and responses.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum NameType {
    /// Display names, e.g. `"title"`
    #[default]
    Name,
    /// Stable field ids, e.g. `"13145252145"`
    Id,
}

impl NameType {
    pub fn as_str(&self) -> &'static str {
        match self {
            NameType::Name => "name",
            NameType::Id => "id",
        }
    }
}

impl FromStr for NameType {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Error> {
        match s {
            "name" => Ok(NameType::Name),
            "id" => Ok(NameType::Id),
            other => Err(Error::InvalidValue {
                msg: format!("name type should be 'name' or 'id', got '{other}'"),
            }),
        }
    }
}

impl fmt::Display for NameType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Configuration options for the HTTP client
#[derive(Debug, Clone)]
pub struct ClientOptions {
    /// Service root, without the `/api/...` path
    pub base_url: String,
    /// API version segment of every endpoint
    pub version: String,
    /// Ceiling for a single request, including the response body
    pub timeout: Duration,
    /// Extra attempts after a connect failure, or a timeout on GET/PUT/DELETE
    pub max_retries: u32,
    pub user_agent: String,
}

impl Default for ClientOptions {
    fn default() -> Self {
        ClientOptions {
            base_url: DEFAULT_BASE_URL.to_string(),
            version: DEFAULT_API_VERSION.to_string(),
            timeout: Duration::from_secs(TIMEOUT_SECS),
            max_retries: MAX_CONNECTION_RETRIES,
            user_agent: format!("Leapcell Rust-Client/{}", env!("CARGO_PKG_VERSION")),
        }
    }
}

impl ClientOptions {
    /// Defaults, with the base url taken from `LEAPCELL_API_URL` when set.
    pub fn from_env() -> Self {
        let mut options = Self::default();
        if let Some(url) = env::var(API_URL_ENV).ok().filter(|url| !url.is_empty()) {
            options.base_url = url;
        }
        options
    }

    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    pub fn with_version(mut self, version: impl Into<String>) -> Self {
        self.version = version.into();
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_service() {
        let options = ClientOptions::default();
        assert_eq!(options.base_url, "https://api.leapcell.io");
        assert_eq!(options.version, "v1");
        assert_eq!(options.timeout, Duration::from_secs(600));
        assert_eq!(options.max_retries, 2);
        assert!(options.user_agent.starts_with("Leapcell Rust-Client/"));
    }

    #[test]
    fn parses_name_type() {
        assert_eq!("id".parse::<NameType>().unwrap(), NameType::Id);
        assert!("label".parse::<NameType>().is_err());
    }
}
