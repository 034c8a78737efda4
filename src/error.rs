//! Error types for carbon-ledger

use thiserror::Error;

#[derive(Error, Debug)]
pub enum LedgerError {
    /// Submission or provisioning input failed presence/positivity checks.
    /// The detail is logged, never shown to the caller.
    #[error("Invalid input parameters. Please enter a valid input.")]
    InvalidInput(String),

    #[error("Environmental factors not found.")]
    FactorNotFound { activity_type: String, date: String },

    #[error("User not found.")]
    UserNotFound(String),

    #[error("User already registered.")]
    UserAlreadyExists(String),

    #[error("Stable map {map_id} holds {found} values, expected {expected}")]
    SchemaMismatch {
        map_id: u8,
        expected: String,
        found: String,
    },

    #[error("Database error: {0}")]
    Database(#[from] sled::Error),

    #[error("Serialization error: {0}")]
    Serialization(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Configuration error: {0}")]
    Config(String),
}

impl LedgerError {
    /// True for failures caused by missing or invalid data, as opposed to
    /// the storage substrate misbehaving.
    pub fn is_domain(&self) -> bool {
        matches!(
            self,
            LedgerError::InvalidInput(_)
                | LedgerError::FactorNotFound { .. }
                | LedgerError::UserNotFound(_)
                | LedgerError::UserAlreadyExists(_)
        )
    }
}

impl From<rmp_serde::encode::Error> for LedgerError {
    fn from(e: rmp_serde::encode::Error) -> Self {
        LedgerError::Serialization(e.to_string())
    }
}

impl From<rmp_serde::decode::Error> for LedgerError {
    fn from(e: rmp_serde::decode::Error) -> Self {
        LedgerError::Serialization(e.to_string())
    }
}
