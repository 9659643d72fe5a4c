//! Error types for upstream fetches.

use std::fmt;

use thiserror::Error;

/// Identity of an upstream resource a fetch was aimed at.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum ResourceId {
    /// One page of a paginated collection (zero-based index).
    Page { collection: String, index: usize },
    /// One item of a collection, by id.
    Item { collection: String, id: String },
}

impl ResourceId {
    pub fn page(collection: impl Into<String>, index: usize) -> Self {
        Self::Page {
            collection: collection.into(),
            index,
        }
    }

    pub fn item(collection: impl Into<String>, id: impl Into<String>) -> Self {
        Self::Item {
            collection: collection.into(),
            id: id.into(),
        }
    }

    /// The collection this resource belongs to.
    pub fn collection(&self) -> &str {
        match self {
            Self::Page { collection, .. } | Self::Item { collection, .. } => collection,
        }
    }
}

impl fmt::Display for ResourceId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Page { collection, index } => write!(f, "{} page {}", collection, index),
            Self::Item { collection, id } => write!(f, "{}/{}", collection, id),
        }
    }
}

/// Classification of a fetch failure.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FetchErrorKind {
    Transient,
    UpstreamServer,
    MalformedResponse,
}

/// Errors that can occur fetching a page or an item.
#[derive(Debug, Clone, Error, PartialEq)]
pub enum FetchError {
    /// Network failure or timeout.
    #[error("transient failure fetching {resource}: {message}")]
    Transient {
        resource: ResourceId,
        message: String,
    },

    /// The upstream answered with a non-success status.
    #[error("upstream returned {status} for {resource}: {detail}")]
    UpstreamServer {
        resource: ResourceId,
        status: u16,
        detail: String,
    },

    /// The body did not match the expected JSON:API envelope.
    #[error("malformed response for {resource}: {message}")]
    MalformedResponse {
        resource: ResourceId,
        message: String,
    },
}

impl FetchError {
    /// Create a Transient error.
    pub fn transient(resource: ResourceId, message: impl Into<String>) -> Self {
        Self::Transient {
            resource,
            message: message.into(),
        }
    }

    /// Create an UpstreamServer error.
    pub fn upstream(resource: ResourceId, status: u16, detail: impl Into<String>) -> Self {
        Self::UpstreamServer {
            resource,
            status,
            detail: detail.into(),
        }
    }

    /// Create a MalformedResponse error.
    pub fn malformed(resource: ResourceId, message: impl Into<String>) -> Self {
        Self::MalformedResponse {
            resource,
            message: message.into(),
        }
    }

    pub fn kind(&self) -> FetchErrorKind {
        match self {
            Self::Transient { .. } => FetchErrorKind::Transient,
            Self::UpstreamServer { .. } => FetchErrorKind::UpstreamServer,
            Self::MalformedResponse { .. } => FetchErrorKind::MalformedResponse,
        }
    }

    /// The resource whose fetch failed.
    pub fn resource(&self) -> &ResourceId {
        match self {
            Self::Transient { resource, .. }
            | Self::UpstreamServer { resource, .. }
            | Self::MalformedResponse { resource, .. } => resource,
        }
    }

    /// Whether a caller could reasonably retry. Nothing in this workspace does.
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::Transient { .. })
    }
}

/// Result type for fetch operations.
pub type FetchResult<T> = std::result::Result<T, FetchError>;
