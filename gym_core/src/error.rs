//! Error types for the gym_core library.

use std::io;

/// Result type alias using our Error type
pub type Result<T> = std::result::Result<T, Error>;

/// Core error type for gym_core operations
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// Malformed or missing input
    #[error("{0}")]
    Validation(String),

    /// Exercise index outside `[0, total)`
    #[error("Invalid exercise index {index} (log has {total} exercises)")]
    InvalidIndex { index: i64, total: usize },

    /// No bearer credential was presented
    #[error("Access token required")]
    MissingCredential,

    /// Credential present but malformed, forged or expired
    #[error("Invalid or expired token: {0}")]
    InvalidCredential(String),

    /// No log with this id owned by the caller
    #[error("Workout log not found")]
    NotFound,

    /// Record store unreachable
    #[error("Database not connected: {0}")]
    Unavailable(String),

    /// Unclassified collaborator failure, message kept for diagnostics
    #[error("Internal error: {0}")]
    Internal(String),

    /// IO error occurred
    #[error("IO error: {0}")]
    Io(#[from] io::Error),

    /// JSON serialization/deserialization error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// CSV error
    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    /// TOML parsing error
    #[error("TOML error: {0}")]
    Toml(#[from] toml::de::Error),

    /// Configuration validation error
    #[error("Configuration error: {0}")]
    Config(String),

    /// Catalog validation error
    #[error("Catalog validation error: {0}")]
    CatalogValidation(String),
}

/// Coarse classification used at the HTTP boundary
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ErrorKind {
    Validation,
    MissingCredential,
    InvalidCredential,
    NotFound,
    Unavailable,
    Internal,
}

impl Error {
    pub fn kind(&self) -> ErrorKind {
        match self {
            Error::Validation(_) | Error::InvalidIndex { .. } => ErrorKind::Validation,
            Error::MissingCredential => ErrorKind::MissingCredential,
            Error::InvalidCredential(_) => ErrorKind::InvalidCredential,
            Error::NotFound => ErrorKind::NotFound,
            Error::Unavailable(_) => ErrorKind::Unavailable,
            Error::Internal(_)
            | Error::Io(_)
            | Error::Json(_)
            | Error::Csv(_)
            | Error::Toml(_)
            | Error::Config(_)
            | Error::CatalogValidation(_) => ErrorKind::Internal,
        }
    }
}
