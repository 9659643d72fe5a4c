//! EDR API error types.

use thiserror::Error;

use crate::responses::ExceptionResponse;

/// Errors that can occur in EDR API operations.
#[derive(Debug, Error)]
pub enum EdrError {
    /// Location not found.
    #[error("Location not found: {0}")]
    LocationNotFound(String),

    /// Invalid query parameter.
    #[error("Invalid parameter: {0}")]
    InvalidParameter(String),

    /// The upstream data source could not supply a complete answer.
    #[error("Upstream incomplete: {0}")]
    UpstreamIncomplete(String),

    /// Internal server error.
    #[error("Internal error: {0}")]
    InternalError(String),
}

impl EdrError {
    /// Get the HTTP status code for this error.
    pub fn status_code(&self) -> u16 {
        match self {
            EdrError::LocationNotFound(_) => 404,
            EdrError::InvalidParameter(_) => 400,
            EdrError::UpstreamIncomplete(_) => 502,
            EdrError::InternalError(_) => 500,
        }
    }

    /// Convert to an ExceptionResponse.
    pub fn to_exception(&self) -> ExceptionResponse {
        match self {
            EdrError::LocationNotFound(msg) => ExceptionResponse::not_found(msg),
            EdrError::InvalidParameter(msg) => ExceptionResponse::bad_request(msg),
            EdrError::UpstreamIncomplete(msg) => ExceptionResponse::bad_gateway(msg),
            EdrError::InternalError(msg) => ExceptionResponse::internal_error(msg),
        }
    }
}
