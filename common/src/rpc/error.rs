use serde_json::Error as SerdeError;
use thiserror::Error;

use super::RpcErrorObject;

#[derive(Error, Debug)]
pub enum RpcError {
    #[error("Request timeout: {0}")]
    Timeout(reqwest::Error),
    #[error("Connection failed: {0}")]
    Connection(reqwest::Error),
    #[error("Network error: {0}")]
    Network(reqwest::Error),
    #[error("HTTP error {status}: {reason}")]
    Http { status: u16, reason: String },
    #[error("Invalid endpoint: {0}")]
    InvalidEndpoint(#[from] url::ParseError),
    #[error("Failed to parse JSON response: {0}")]
    InvalidResponse(#[from] SerdeError),
    #[error("RPC error {code}: {message}")]
    Rpc { code: i64, message: String },
    #[error("No result in response to '{0}'")]
    MissingResult(String),
}

impl RpcError {
    /// Code returned by the node, when the failure came from the node itself
    pub fn code(&self) -> Option<i64> {
        match self {
            Self::Rpc { code, .. } => Some(*code),
            _ => None,
        }
    }
}

impl From<RpcErrorObject> for RpcError {
    fn from(error: RpcErrorObject) -> Self {
        Self::Rpc {
            code: error.code,
            message: error.message,
        }
    }
}

impl From<reqwest::Error> for RpcError {
    fn from(error: reqwest::Error) -> Self {
        if error.is_timeout() {
            Self::Timeout(error)
        } else if error.is_connect() {
            Self::Connection(error)
        } else {
            Self::Network(error)
        }
    }
}
