use rust_decimal::Decimal;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum StrReturnsError {
    #[error("Invalid input: {field} — {reason}")]
    InvalidInput { field: String, reason: String },

    #[error("Degenerate equity: down payment of 0% leaves no invested equity, ROI and IRR are undefined")]
    DegenerateEquity,

    #[error("Convergence failure: {function} did not converge after {iterations} iterations (delta: {last_delta})")]
    ConvergenceFailure {
        function: String,
        iterations: u32,
        last_delta: Decimal,
    },

    #[error("Insufficient data: {0}")]
    InsufficientData(String),

    #[error("Division by zero in {context}")]
    DivisionByZero { context: String },

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Serialization error: {0}")]
    SerializationError(String),
}

impl From<serde_json::Error> for StrReturnsError {
    fn from(e: serde_json::Error) -> Self {
        StrReturnsError::SerializationError(e.to_string())
    }
}

impl From<toml::de::Error> for StrReturnsError {
    fn from(e: toml::de::Error) -> Self {
        StrReturnsError::Config(e.to_string())
    }
}
