//! Unified error types and result handling.
//!
//! The taxonomy splits caller mistakes (`Validation`, `InvalidAmount`), missing
//! records (`StudentNotFound`, `InvoiceNotFound`), and data that cannot be
//! normalized (`Consistency`) from infrastructure failures. A `Consistency`
//! error is fatal for the query that raised it: defaulting a balance to zero
//! would understate receivables, so it is never absorbed.

use thiserror::Error;

/// Crate-wide error type
#[derive(Debug, Error)]
pub enum Error {
    /// Input failed validation and the operation was not attempted
    #[error("Validation error: {message}")]
    Validation {
        /// What was wrong with the input
        message: String,
    },

    /// An amount was zero, negative, or not finite
    #[error("Invalid amount: {amount}")]
    InvalidAmount {
        /// The offending amount
        amount: f64,
    },

    /// No student row exists for the given identifier
    #[error("Student not found: {id}")]
    StudentNotFound {
        /// The identifier that was looked up
        id: i64,
    },

    /// No invoice row exists for the given identifier
    #[error("Invoice not found: {id}")]
    InvoiceNotFound {
        /// The identifier that was looked up
        id: i64,
    },

    /// Stored data cannot be normalized (e.g., no recognizable amount pair)
    #[error("Consistency error: {message}")]
    Consistency {
        /// Which record and which expectation failed
        message: String,
    },

    /// Configuration loading or parsing failure
    #[error("Configuration error: {message}")]
    Config {
        /// What failed to load or parse
        message: String,
    },

    /// Underlying database failure
    #[error("Database error: {0}")]
    Database(#[from] sea_orm::DbErr),

    /// I/O failure
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Missing or malformed environment variable
    #[error("Environment variable error: {0}")]
    EnvVar(#[from] std::env::VarError),
}

/// Convenience `Result` type
pub type Result<T> = std::result::Result<T, Error>;
