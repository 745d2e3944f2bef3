//! Offset pagination for list endpoints

use serde::Deserialize;

/// Maximum (and default) number of rows per request
pub const MAX_LIMIT: u32 = 100;

/// Pagination window
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Pagination {
    /// Rows to skip
    pub skip: u32,
    /// Rows to return (1..=100)
    pub limit: u32,
}

impl Pagination {
    /// Create pagination with validation.
    ///
    /// Limit is clamped to 1..=100.
    pub fn new(skip: u32, limit: u32) -> Self {
        Self {
            skip,
            limit: limit.clamp(1, MAX_LIMIT),
        }
    }

    /// SQL OFFSET value.
    pub fn offset(&self) -> i64 {
        i64::from(self.skip)
    }

    /// SQL LIMIT value.
    pub fn limit(&self) -> i64 {
        i64::from(self.limit)
    }

    /// Stable key fragment for response caching.
    pub fn cache_key(&self) -> String {
        format!("skip={}&limit={}", self.skip, self.limit)
    }
}

impl Default for Pagination {
    fn default() -> Self {
        Self {
            skip: 0,
            limit: MAX_LIMIT,
        }
    }
}

/// Query parameters for pagination
#[derive(Debug, Clone, Default, Deserialize)]
pub struct PaginationParams {
    pub skip: Option<u32>,
    pub limit: Option<u32>,
}

impl From<PaginationParams> for Pagination {
    fn from(params: PaginationParams) -> Self {
        Self::new(params.skip.unwrap_or(0), params.limit.unwrap_or(MAX_LIMIT))
    }
}
