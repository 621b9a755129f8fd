use thiserror::Error;

/// The main error type for the Leapcell client library.
/// This enum represents all possible errors that can occur while building or dispatching requests.
#[derive(Debug, Error)]
pub enum Error {
    // Configuration errors, raised before anything is sent
    #[error("Filter operator '{0}' does not exist")]
    InvalidOperator(String),

    #[error("Invalid filter value: {msg}")]
    InvalidValue { msg: String },

    #[error("Invalid order direction '{0}', should be one of ['asc', 'desc']")]
    InvalidDirection(String),

    #[error("Invalid pagination: {msg}")]
    InvalidPagination { msg: String },

    #[error("Field type '{0}' not found")]
    InvalidFieldType(String),

    #[error("{0} can not be empty")]
    MissingArgument(&'static str),

    #[error("File is too large: {size} bytes, should be less than {max} bytes")]
    FileTooLarge { size: usize, max: usize },

    // Transport errors (when http feature is enabled)
    #[cfg(feature = "http")]
    #[error("HTTP client error: {0}")]
    Transport(#[from] reqwest::Error),

    // Service errors
    #[error("Bad request, http code {status}, please check apitoken and params, error code: {code}, hint: {hint}")]
    Service {
        status: u16,
        code: String,
        hint: String,
    },

    #[error("Bad response, body is not json, http code {status}, body: {body}")]
    BadResponse { status: u16, body: String },

    #[error("Bad response, http code {status}, missing data, error code: {code}, hint: {hint}")]
    MissingData {
        status: u16,
        code: String,
        hint: String,
    },

    #[error("Unexpected response shape: {0}")]
    UnexpectedShape(String),

    // IO and serialization errors
    #[error("JSON error: {0}")]
    JsonError(#[from] serde_json::Error),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, Error>;

impl Error {
    /// Returns true if the error was detected locally, while building a request
    pub fn is_configuration_error(&self) -> bool {
        matches!(
            self,
            Error::InvalidOperator(_)
                | Error::InvalidValue { .. }
                | Error::InvalidDirection(_)
                | Error::InvalidPagination { .. }
                | Error::InvalidFieldType(_)
                | Error::MissingArgument(_)
                | Error::FileTooLarge { .. }
        )
    }

    /// Returns true if the request never got a response from the service
    pub fn is_transport_error(&self) -> bool {
        match self {
            #[cfg(feature = "http")]
            Error::Transport(_) => true,
            Error::IoError(_) => true,
            _ => false,
        }
    }

    /// Returns true if the service answered with an error status or a malformed body
    pub fn is_service_error(&self) -> bool {
        matches!(
            self,
            Error::Service { .. }
                | Error::BadResponse { .. }
                | Error::MissingData { .. }
                | Error::UnexpectedShape(_)
        )
    }

    /// The HTTP status reported by the service, if any
    pub fn status(&self) -> Option<u16> {
        match self {
            Error::Service { status, .. }
            | Error::BadResponse { status, .. }
            | Error::MissingData { status, .. } => Some(*status),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn classifies_errors() {
        assert!(Error::InvalidOperator("like".to_string()).is_configuration_error());
        assert!(Error::InvalidDirection("up".to_string()).is_configuration_error());
        let err = Error::Service {
            status: 401,
            code: "unauthorized".to_string(),
            hint: "bad token".to_string(),
        };
        assert!(err.is_service_error());
        assert!(!err.is_configuration_error());
        assert_eq!(err.status(), Some(401));
        assert!(Error::IoError(std::io::Error::other("reset")).is_transport_error());
    }
}
