use rust_decimal::Decimal;
use serde::Deserialize;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ExchangeError {
    #[error("API credentials are required for authenticated endpoints")]
    MissingCredentials,

    #[error("Transport error: {0}")]
    Transport(String),

    #[error("Request rejected by exchange: HTTP {status} - {body}")]
    RemoteRejected { status: u16, body: String },

    #[error("Malformed response: {message}. Response body: {body}")]
    MalformedResponse { message: String, body: String },

    #[error(
        "Timeout fulfilling order {order_id} on {symbol} after {attempts_made} attempts (canceled: {canceled})"
    )]
    FulfillmentTimeout {
        symbol: String,
        order_id: i64,
        attempts_made: u32,
        canceled: bool,
        executed_quantity: Decimal,
    },

    #[error("Order {order_id} on {symbol} timed out and could not be canceled: {source}")]
    CancelFailed {
        symbol: String,
        order_id: i64,
        attempts_made: u32,
        #[source]
        source: Box<ExchangeError>,
    },

    #[error("Authentication error: {0}")]
    AuthError(String),

    #[error("Invalid parameters: {0}")]
    InvalidParameters(String),

    #[error("Configuration error: {0}")]
    ConfigError(#[from] crate::core::config::ConfigError),

    #[error("Other error: {0}")]
    Other(String),
}

/// Structured error payload the exchange returns alongside non-2xx responses
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct RemoteErrorBody {
    pub code: i64,
    pub msg: String,
}

impl ExchangeError {
    /// Only network-layer failures are worth retrying without changing the request.
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::Transport(_))
    }

    /// Parse the exchange's `{code, msg}` payload out of a rejected response.
    ///
    /// Returns `None` for every other variant and for bodies that are not in
    /// the expected shape.
    pub fn remote_code(&self) -> Option<RemoteErrorBody> {
        match self {
            Self::RemoteRejected { body, .. } => serde_json::from_str(body).ok(),
            _ => None,
        }
    }
}

impl From<reqwest::Error> for ExchangeError {
    fn from(err: reqwest::Error) -> Self {
        Self::Transport(err.to_string())
    }
}
