//! Error types for Agrivision

/// Result type alias using Agrivision's Error type
pub type Result<T> = std::result::Result<T, Error>;

/// Core error type for Agrivision operations
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// A category string outside the fixed closed set
    #[error("{field} contains previously unseen label: {value:?}")]
    UnknownCategory {
        /// Request field the value came from (`soil_type`, `crop_type`, ...)
        field: &'static str,
        /// The rejected value
        value: String,
    },

    /// A class index with no matching category
    #[error("class index {index} out of range for {field} ({classes} classes)")]
    UnknownClass {
        field: &'static str,
        index: usize,
        classes: usize,
    },

    /// Malformed or out-of-domain request values
    #[error("invalid input: {0}")]
    InvalidInput(String),

    /// Model loading or execution errors
    #[error("model error: {0}")]
    Model(String),

    /// Configuration errors
    #[error("configuration error: {0}")]
    Config(String),
}

impl Error {
    /// Create a new invalid input error
    pub fn invalid_input(msg: impl Into<String>) -> Self {
        Self::InvalidInput(msg.into())
    }

    /// Create a new model error
    pub fn model(msg: impl Into<String>) -> Self {
        Self::Model(msg.into())
    }

    /// Create a new configuration error
    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config(msg.into())
    }

    /// Whether the error was caused by the caller's input rather than the service
    pub fn is_client_error(&self) -> bool {
        matches!(self, Self::UnknownCategory { .. } | Self::InvalidInput(_))
    }
}
