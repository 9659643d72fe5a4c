//! OGC exception documents returned alongside error statuses.

use serde::{Deserialize, Serialize};

const EXCEPTION_BASE: &str = "http://www.opengis.net/def/exceptions/ogcapi-edr-1/1.0/";

/// Exception body for a failed request.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ExceptionResponse {
    /// Exception type URI.
    #[serde(rename = "type")]
    pub type_: String,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub status: Option<u16>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub detail: Option<String>,
}

impl ExceptionResponse {
    fn of_kind(kind: &str, status: u16, title: &str, detail: impl Into<String>) -> Self {
        Self {
            type_: format!("{}{}", EXCEPTION_BASE, kind),
            title: Some(title.to_string()),
            status: Some(status),
            detail: Some(detail.into()),
        }
    }

    /// 404: the requested location does not exist upstream.
    pub fn not_found(detail: impl Into<String>) -> Self {
        Self::of_kind("not-found", 404, "Not Found", detail)
    }

    /// 400: a query parameter was rejected before any upstream call.
    pub fn bad_request(detail: impl Into<String>) -> Self {
        Self::of_kind("invalid-parameter-value", 400, "Bad Request", detail)
    }

    /// 502: a page or joined item could not be fetched, so no partial
    /// result is returned.
    pub fn bad_gateway(detail: impl Into<String>) -> Self {
        Self::of_kind("upstream-incomplete", 502, "Bad Gateway", detail)
    }

    pub fn internal_error(detail: impl Into<String>) -> Self {
        Self::of_kind("server-error", 500, "Internal Server Error", detail)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_not_found_body() {
        let exc = ExceptionResponse::not_found("Location not found: 6902");

        assert_eq!(
            serde_json::to_value(&exc).unwrap(),
            json!({
                "type": "http://www.opengis.net/def/exceptions/ogcapi-edr-1/1.0/not-found",
                "title": "Not Found",
                "status": 404,
                "detail": "Location not found: 6902"
            })
        );
    }

    #[test]
    fn test_status_per_kind() {
        assert_eq!(ExceptionResponse::bad_request("bbox").status, Some(400));
        assert_eq!(ExceptionResponse::internal_error("oops").status, Some(500));

        let exc = ExceptionResponse::bad_gateway("page 2 of location failed");
        assert_eq!(exc.status, Some(502));
        assert!(exc.type_.ends_with("/upstream-incomplete"));
        assert_eq!(exc.title.as_deref(), Some("Bad Gateway"));
    }
}
