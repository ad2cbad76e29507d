//! Error handling for the recipe backend

use std::fmt;
use thiserror::Error;

/// Failures surfaced by the core components.
///
/// Provider specific errors (HTTP statuses, PostgREST codes, GoTrue
/// messages) are translated into one of these variants at the adapter
/// boundary. The payload strings are meant for logs only.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum Error {
    /// Bad ingredient count or shape; correctable by the caller
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// Missing or unusable credentials; correctable by the operator
    #[error("Misconfigured: {0}")]
    Misconfigured(String),

    /// The AI provider throttled the request
    #[error("Rate limited by provider (retry after {retry_after_secs:?}s)")]
    RateLimited { retry_after_secs: Option<u64> },

    /// The AI output failed extraction, parsing or schema validation
    #[error("Malformed response: {0}")]
    MalformedResponse(String),

    /// Network fault or non-success answer from the AI provider
    #[error("Provider unavailable: {0}")]
    ProviderUnavailable(String),

    /// Remote store fault on favorites or account operations
    #[error("Persistence error: {0}")]
    Persistence(String),
}

impl Error {
    pub fn invalid_input<T: fmt::Display>(msg: T) -> Self {
        Error::InvalidInput(msg.to_string())
    }

    pub fn misconfigured<T: fmt::Display>(msg: T) -> Self {
        Error::Misconfigured(msg.to_string())
    }

    pub fn malformed<T: fmt::Display>(msg: T) -> Self {
        Error::MalformedResponse(msg.to_string())
    }

    pub fn provider<T: fmt::Display>(msg: T) -> Self {
        Error::ProviderUnavailable(msg.to_string())
    }

    pub fn persistence<T: fmt::Display>(msg: T) -> Self {
        Error::Persistence(msg.to_string())
    }

    /// Short stable name used as a structured log field
    pub fn kind(&self) -> &'static str {
        match self {
            Error::InvalidInput(_) => "invalid_input",
            Error::Misconfigured(_) => "misconfigured",
            Error::RateLimited { .. } => "rate_limited",
            Error::MalformedResponse(_) => "malformed_response",
            Error::ProviderUnavailable(_) => "provider_unavailable",
            Error::Persistence(_) => "persistence",
        }
    }
}

impl From<chefia_postgrest::PostgrestError> for Error {
    fn from(err: chefia_postgrest::PostgrestError) -> Self {
        Error::Persistence(err.to_string())
    }
}

impl From<chefia_auth::AuthError> for Error {
    fn from(err: chefia_auth::AuthError) -> Self {
        Error::Persistence(err.to_string())
    }
}
