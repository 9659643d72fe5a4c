//! JSON:API envelope decoding for RISE responses.
//!
//! Every RISE response is an envelope `{data, links, meta}`. `data` is a
//! list of resource objects for collection pages and a single object for
//! item lookups. Error documents (`{type, title, detail}`) can arrive with a
//! success status, so a body without `data` is rejected.

use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;

use crate::error::{FetchError, FetchResult, ResourceId};

/// Largest page size the upstream accepts.
pub const MAX_PAGE_SIZE: usize = 100;

/// The last path segment of a JSON:API id.
///
/// RISE ids are paths such as `/rise/api/catalog-item/128562`; the local
/// id is `128562`. Plain ids are returned unchanged.
pub fn local_id(id: &str) -> &str {
    id.trim_end_matches('/').rsplit('/').next().unwrap_or(id)
}

/// One upstream resource object with its identifier extracted.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RawItem {
    /// The JSON:API `id` as sent by the upstream.
    pub id: String,
    /// The full resource object (`id`, `type`, `attributes`, `relationships`).
    pub body: Value,
}

impl RawItem {
    /// Build an item from a resource object, which must carry an `id`.
    pub fn from_value(resource: &ResourceId, body: Value) -> FetchResult<Self> {
        let id = match body.get("id") {
            Some(Value::String(s)) if !s.is_empty() => s.clone(),
            Some(Value::Number(n)) => n.to_string(),
            _ => {
                return Err(FetchError::malformed(
                    resource.clone(),
                    "resource object without an id",
                ))
            }
        };
        Ok(Self { id, body })
    }

    /// The id without its path prefix.
    pub fn local_id(&self) -> &str {
        local_id(&self.id)
    }

    /// The `attributes` object, if present.
    pub fn attributes(&self) -> Option<&Value> {
        self.body.get("attributes")
    }

    /// The `relationships` object, if present.
    pub fn relationships(&self) -> Option<&Value> {
        self.body.get("relationships")
    }
}

/// Pagination metadata from the envelope's `meta`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PageMeta {
    #[serde(default)]
    pub total_items: Option<usize>,
    #[serde(default)]
    pub items_per_page: Option<usize>,
    #[serde(default)]
    pub current_page: Option<usize>,
}

/// One page of a paginated collection.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Page {
    pub collection: String,
    /// Zero-based page index.
    pub index: usize,
    pub items: Vec<RawItem>,
    /// `None` when the response carries no pagination metadata.
    pub meta: Option<PageMeta>,
    /// Whether `links.next` points at another page.
    pub has_next: bool,
}

impl Page {
    /// Declared size of the whole collection.
    pub fn total_items(&self) -> Option<usize> {
        self.meta.as_ref()?.total_items
    }

    /// Page size the upstream actually served.
    ///
    /// `itemsPerPage` wins over the requested size, which the upstream
    /// silently caps at [`MAX_PAGE_SIZE`].
    pub fn served_page_size(&self, requested: usize) -> usize {
        self.meta
            .as_ref()
            .and_then(|meta| meta.items_per_page)
            .filter(|&size| size > 0)
            .unwrap_or_else(|| requested.clamp(1, MAX_PAGE_SIZE))
    }

    /// Total number of pages implied by `totalItems`, if declared.
    ///
    /// An empty collection still has one (empty) page.
    pub fn page_count(&self, requested: usize) -> Option<usize> {
        let total = self.total_items()?;
        let page_size = self.served_page_size(requested);
        Some(((total + page_size - 1) / page_size).max(1))
    }

    /// Whether the response is paginated at all.
    pub fn is_paginated(&self) -> bool {
        self.meta.is_some() || self.has_next
    }
}

#[derive(Deserialize)]
struct Envelope {
    /// `Some(Value::Null)` for `"data": null`, `None` when the member is missing.
    #[serde(default, deserialize_with = "present")]
    data: Option<Value>,
    #[serde(default)]
    links: Option<Value>,
    #[serde(default)]
    meta: Option<Value>,
    #[serde(default)]
    title: Option<String>,
    #[serde(default)]
    detail: Option<String>,
}

fn present<'de, D>(deserializer: D) -> Result<Option<Value>, D::Error>
where
    D: Deserializer<'de>,
{
    Value::deserialize(deserializer).map(Some)
}

fn parse_envelope(resource: &ResourceId, body: &[u8]) -> FetchResult<(Value, Envelope)> {
    let envelope: Envelope = serde_json::from_slice(body)
        .map_err(|e| FetchError::malformed(resource.clone(), format!("invalid JSON body: {}", e)))?;

    match envelope.data.clone() {
        Some(data) => Ok((data, envelope)),
        None => {
            let reason = envelope
                .detail
                .or(envelope.title)
                .unwrap_or_else(|| "no data member".to_string());
            Err(FetchError::malformed(
                resource.clone(),
                format!("body is not a data document: {}", reason),
            ))
        }
    }
}

/// Decode a collection page body.
pub fn parse_page(collection: &str, index: usize, body: &[u8]) -> FetchResult<Page> {
    let resource = ResourceId::page(collection, index);
    let (data, envelope) = parse_envelope(&resource, body)?;

    let items = match data {
        Value::Array(objects) => objects
            .into_iter()
            .map(|object| RawItem::from_value(&resource, object))
            .collect::<FetchResult<Vec<_>>>()?,
        Value::Object(_) => vec![RawItem::from_value(&resource, data)?],
        Value::Null => Vec::new(),
        other => {
            return Err(FetchError::malformed(
                resource,
                format!("unexpected data member: {}", other),
            ))
        }
    };

    let meta = match envelope.meta {
        Some(meta) if meta.is_object() => Some(
            serde_json::from_value::<PageMeta>(meta)
                .map_err(|e| FetchError::malformed(resource.clone(), format!("invalid meta: {}", e)))?,
        ),
        _ => None,
    };

    let has_next = envelope
        .links
        .as_ref()
        .and_then(|links| links.get("next"))
        .map_or(false, |next| next.is_string());

    Ok(Page {
        collection: collection.to_string(),
        index,
        items,
        meta,
        has_next,
    })
}

/// Decode a single-item body.
pub fn parse_item(collection: &str, id: &str, body: &[u8]) -> FetchResult<RawItem> {
    let resource = ResourceId::item(collection, id);
    let (data, _) = parse_envelope(&resource, body)?;

    match data {
        Value::Object(_) => RawItem::from_value(&resource, data),
        // Some lookups answer with a one-element list.
        Value::Array(mut objects) if objects.len() == 1 => {
            RawItem::from_value(&resource, objects.remove(0))
        }
        other => Err(FetchError::malformed(
            resource,
            format!("expected a single resource object, got {}", other),
        )),
    }
}

/// Best-effort extraction of a human-readable message from an error body.
pub fn error_detail(body: &[u8]) -> Option<String> {
    let value: Value = match serde_json::from_slice(body) {
        Ok(value) => value,
        Err(_) => {
            let text = String::from_utf8_lossy(body).trim().to_string();
            return (!text.is_empty()).then(|| text.chars().take(200).collect());
        }
    };

    let from_object = |v: &Value| {
        v.get("detail")
            .or_else(|| v.get("title"))
            .and_then(Value::as_str)
            .map(str::to_string)
    };

    from_object(&value).or_else(|| {
        value
            .get("errors")
            .and_then(Value::as_array)
            .and_then(|errors| errors.first())
            .and_then(from_object)
    })
}
