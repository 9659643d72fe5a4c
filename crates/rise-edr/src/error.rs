//! Error types for location queries.

use std::fmt;

use edr_protocol::{CoordinateParseError, EdrError};
use rise_client::FetchError;
use thiserror::Error;

/// Which aggregator gave up.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum JoinStage {
    /// Merging the pages of a collection.
    Merge,
    /// Fetching the items referenced by merged resources.
    Join,
}

impl fmt::Display for JoinStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            JoinStage::Merge => write!(f, "merge"),
            JoinStage::Join => write!(f, "join"),
        }
    }
}

/// Errors that can occur resolving a location query.
#[derive(Debug, Error)]
pub enum QueryError {
    /// A member of a fan-out group failed, so no result is returned.
    #[error("incomplete {stage}: {source}")]
    IncompleteJoin {
        stage: JoinStage,
        #[source]
        source: FetchError,
    },

    /// The query was rejected before any upstream call.
    #[error("invalid query: {0}")]
    InvalidQuery(String),

    /// A single-location lookup found nothing.
    #[error("location not found: {0}")]
    NotFound(String),
}

impl QueryError {
    /// Create an IncompleteJoin error for the merge stage.
    pub fn merge(source: FetchError) -> Self {
        Self::IncompleteJoin {
            stage: JoinStage::Merge,
            source,
        }
    }

    /// Create an IncompleteJoin error for the join stage.
    pub fn join(source: FetchError) -> Self {
        Self::IncompleteJoin {
            stage: JoinStage::Join,
            source,
        }
    }

    /// Create an InvalidQuery error.
    pub fn invalid(msg: impl Into<String>) -> Self {
        Self::InvalidQuery(msg.into())
    }

    /// The failing upstream fetch, for incomplete results.
    pub fn fetch_error(&self) -> Option<&FetchError> {
        match self {
            Self::IncompleteJoin { source, .. } => Some(source),
            _ => None,
        }
    }
}

impl From<CoordinateParseError> for QueryError {
    fn from(err: CoordinateParseError) -> Self {
        Self::InvalidQuery(err.to_string())
    }
}

impl From<QueryError> for EdrError {
    fn from(err: QueryError) -> Self {
        match err {
            QueryError::IncompleteJoin { .. } => EdrError::UpstreamIncomplete(err.to_string()),
            QueryError::InvalidQuery(msg) => EdrError::InvalidParameter(msg),
            QueryError::NotFound(id) => EdrError::LocationNotFound(id),
        }
    }
}

/// Result type for location queries.
pub type Result<T> = std::result::Result<T, QueryError>;
