use thiserror::Error;

/// Errors surfaced by `OrderRouter::submit`. None of these are retried by the
/// router itself; retry policy belongs to the caller.
#[derive(Error, Debug)]
pub enum RouterError {
    /// The exchange turned the order away (API error, bad request, filters).
    #[error("Order rejected: {0}")]
    Rejected(String),
}

/// Errors from the exchange gateway beneath the live backend.
#[derive(Error, Debug)]
pub enum GatewayError {
    #[error("Failed to build or send the HTTP request: {0}")]
    Request(#[from] reqwest::Error),

    #[error("Failed to deserialize the exchange response: {0}")]
    Deserialization(String),

    #[error("Exchange error {0}: {1}")]
    Exchange(i32, String),
}
