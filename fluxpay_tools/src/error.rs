use thiserror::Error;

#[derive(Debug, Error)]
pub enum FluxPayApiError {
    #[error("Could not initialize client: {0}")]
    Initialization(String),
    #[error("Could not reach the payment provider: {0}")]
    TransportError(String),
    #[error("Could not deserialize JSON: {0}")]
    JsonError(String),
    #[error("Provider rejected the request. Error {status}. {message}")]
    QueryError { status: u16, message: String },
    #[error("Authentication with the payment provider failed: {0}")]
    AuthenticationFailed(String),
    #[error("Invalid currency amount: {0}")]
    InvalidCurrencyAmount(String),
}

impl FluxPayApiError {
    /// Timeouts and connection errors are transient. The caller may retry later (typically via the pending-order
    /// sweep) rather than treating the payment as failed.
    pub fn is_transient(&self) -> bool {
        matches!(self, FluxPayApiError::TransportError(_))
    }
}
