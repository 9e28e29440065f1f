//! Response envelopes and pagination used by the backend API.
//!
//! The backend wraps payloads either as `{ "data": ... }` or as
//! `{ "success": bool, "data": ..., "message": "..." }`. Both shapes decode
//! into [`Envelope`].

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// An envelope could not be unwrapped into its payload.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum EnvelopeError {
    /// The backend reported `success: false`.
    #[error("{0}")]
    Rejected(String),
    /// The envelope carried no `data`.
    #[error("response envelope has no data")]
    MissingData,
}

/// Generic response envelope.
#[derive(Debug, Clone, Deserialize)]
pub struct Envelope<T> {
    pub success: Option<bool>,
    pub data: Option<T>,
    pub message: Option<String>,
}

impl<T> Envelope<T> {
    /// Unwrap the payload.
    ///
    /// # Errors
    ///
    /// Returns [`EnvelopeError::Rejected`] when `success` is `false` and
    /// [`EnvelopeError::MissingData`] when there is no payload.
    pub fn into_result(self) -> Result<T, EnvelopeError> {
        if self.success == Some(false) {
            return Err(EnvelopeError::Rejected(
                self.message
                    .unwrap_or_else(|| "request was not successful".to_string()),
            ));
        }
        self.data.ok_or(EnvelopeError::MissingData)
    }
}

/// Envelope for endpoints that only acknowledge an action.
#[derive(Debug, Clone, Deserialize)]
pub struct Acknowledgement {
    pub success: Option<bool>,
    pub message: Option<String>,
}

impl Acknowledgement {
    /// Check that the action succeeded.
    ///
    /// # Errors
    ///
    /// Returns [`EnvelopeError::Rejected`] when `success` is `false`.
    pub fn into_result(self) -> Result<Option<String>, EnvelopeError> {
        if self.success == Some(false) {
            return Err(EnvelopeError::Rejected(
                self.message
                    .unwrap_or_else(|| "request was not successful".to_string()),
            ));
        }
        Ok(self.message)
    }
}

/// Pagination metadata.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Pagination {
    pub page: u32,
    pub limit: u32,
    pub total: u64,
    pub pages: u32,
}

impl Default for Pagination {
    fn default() -> Self {
        Self {
            page: 1,
            limit: 0,
            total: 0,
            pages: 1,
        }
    }
}

impl Pagination {
    /// Whether a later page exists.
    #[must_use]
    pub const fn has_next(&self) -> bool {
        self.page < self.pages
    }

    /// Whether an earlier page exists.
    #[must_use]
    pub const fn has_prev(&self) -> bool {
        self.page > 1
    }

    /// Next page number, if any.
    #[must_use]
    pub const fn next_page(&self) -> Option<u32> {
        if self.has_next() {
            Some(self.page + 1)
        } else {
            None
        }
    }

    /// Previous page number, if any.
    #[must_use]
    pub const fn prev_page(&self) -> Option<u32> {
        if self.has_prev() {
            Some(self.page - 1)
        } else {
            None
        }
    }
}

/// A page of results.
///
/// Listing endpoints name the collection after the entity (`products`,
/// `orders`); all of them decode into `items`.
#[derive(Debug, Clone, Deserialize)]
pub struct Paginated<T> {
    #[serde(alias = "products", alias = "orders")]
    pub items: Vec<T>,
    #[serde(default)]
    pub pagination: Pagination,
}

impl<T> Paginated<T> {
    /// An empty first page.
    #[must_use]
    pub fn empty() -> Self {
        Self {
            items: Vec::new(),
            pagination: Pagination::default(),
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_data_only_envelope() {
        let env: Envelope<Vec<u32>> = serde_json::from_str(r#"{"data": [1, 2]}"#).unwrap();
        assert_eq!(env.into_result().unwrap(), vec![1, 2]);
    }

    #[test]
    fn test_rejected_envelope_carries_message() {
        let env: Envelope<u32> =
            serde_json::from_str(r#"{"success": false, "message": "Order already shipped"}"#)
                .unwrap();
        assert_eq!(
            env.into_result(),
            Err(EnvelopeError::Rejected("Order already shipped".to_string()))
        );
    }

    #[test]
    fn test_missing_data() {
        let env: Envelope<u32> = serde_json::from_str(r#"{"success": true}"#).unwrap();
        assert_eq!(env.into_result(), Err(EnvelopeError::MissingData));
    }

    #[test]
    fn test_paginated_accepts_entity_named_collection() {
        let page: Paginated<u32> = serde_json::from_str(
            r#"{"products": [3], "pagination": {"page": 2, "limit": 1, "total": 3, "pages": 3}}"#,
        )
        .unwrap();
        assert_eq!(page.items, vec![3]);
        assert_eq!(page.pagination.next_page(), Some(3));
        assert_eq!(page.pagination.prev_page(), Some(1));
    }

    #[test]
    fn test_pagination_defaults_to_single_page() {
        let page: Paginated<u32> = serde_json::from_str(r#"{"items": []}"#).unwrap();
        assert!(!page.pagination.has_next());
        assert!(!page.pagination.has_prev());
    }
}
