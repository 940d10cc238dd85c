//! Shared pagination utilities
//!
//! Common pagination types and helpers used by list queries.

use serde::{Deserialize, Serialize};

/// Pagination parameter validation errors
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum PaginationError {
    #[error("Page must be greater than 0")]
    InvalidPage,
    #[error("Size must be between 1 and 100")]
    InvalidSize,
}

/// Common pagination request parameters
///
/// Used in list queries to specify page and items per page.
/// Provides sensible defaults (page 1, 20 items per page).
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct PaginationParams {
    /// Page number (1-indexed). Defaults to 1.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub page: Option<i64>,

    /// Items per page. Defaults to 20, clamped to 1-100.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub size: Option<i64>,
}

impl PaginationParams {
    pub fn new(page: Option<i64>, size: Option<i64>) -> Self {
        Self { page, size }
    }

    /// Get the page number (1-indexed), defaulting to 1
    pub fn page(&self) -> i64 {
        self.page.unwrap_or(1).max(1)
    }

    /// Get items per page, defaulting to 20 and clamped to 1-100
    pub fn size(&self) -> i64 {
        self.size.unwrap_or(20).clamp(1, 100)
    }

    /// Validate pagination parameters
    pub fn validate(&self) -> Result<(), PaginationError> {
        if let Some(page) = self.page {
            if page < 1 {
                return Err(PaginationError::InvalidPage);
            }
        }
        if let Some(size) = self.size {
            if size < 1 || size > 100 {
                return Err(PaginationError::InvalidSize);
            }
        }
        Ok(())
    }
}

/// Pagination metadata for responses
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PaginationMetadata {
    /// Current page number (1-indexed)
    pub page: i64,

    /// Items per page
    pub size: i64,

    /// Total number of items
    pub total_elements: i64,

    /// Total number of pages
    pub total_pages: i64,

    /// Whether this is the first page
    pub first: bool,

    /// Whether this is the last page
    pub last: bool,
}

impl PaginationMetadata {
    pub fn new(page: i64, size: i64, total_elements: i64) -> Self {
        let total_pages = if total_elements == 0 {
            0
        } else {
            ((total_elements as f64) / (size as f64)).ceil() as i64
        };

        Self {
            page,
            size,
            total_elements,
            total_pages,
            first: page <= 1,
            last: page >= total_pages,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_params_defaults() {
        let params = PaginationParams::default();
        assert_eq!(params.page(), 1);
        assert_eq!(params.size(), 20);
    }

    #[test]
    fn test_params_clamping() {
        let params = PaginationParams::new(Some(-1), Some(200));
        assert_eq!(params.page(), 1);
        assert_eq!(params.size(), 100);
    }

    #[test]
    fn test_params_validation() {
        assert!(PaginationParams::new(Some(1), Some(50)).validate().is_ok());
        assert_eq!(
            PaginationParams::new(Some(0), Some(20)).validate(),
            Err(PaginationError::InvalidPage)
        );
        assert_eq!(
            PaginationParams::new(Some(1), Some(101)).validate(),
            Err(PaginationError::InvalidSize)
        );
    }

    #[test]
    fn test_metadata() {
        let meta = PaginationMetadata::new(2, 10, 25);
        assert_eq!(meta.total_pages, 3);
        assert!(!meta.first);
        assert!(!meta.last);
    }

    #[test]
    fn test_metadata_empty() {
        let meta = PaginationMetadata::new(1, 10, 0);
        assert_eq!(meta.total_pages, 0);
        assert!(meta.first);
        assert!(meta.last);
    }
}
