//! This modules defines the common functionality for paging data.

use serde::Serialize;

/// The config for pagination
#[derive(Debug, Clone, PartialEq)]
pub struct PaginationConfig {
    /// The page number to default to when not specified in a request.
    pub default_page: u64,
    /// The number of rows per page when not specified in a request.
    pub default_page_size: u64,
    /// The largest page size a client may ask for.
    pub max_page_size: u64,
}

impl Default for PaginationConfig {
    fn default() -> Self {
        Self {
            default_page: 1,
            default_page_size: 10,
            max_page_size: 100,
        }
    }
}

/// A one-based page number and its size.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Page {
    /// The one-based page number.
    pub number: u64,
    /// The maximum number of rows on the page.
    pub size: u64,
}

impl Page {
    /// Resolve the `page` and `limit` query parameters against `config`.
    ///
    /// Absent or zero values fall back to the defaults, and the size is
    /// capped at [PaginationConfig::max_page_size].
    pub fn from_query(page: Option<u64>, limit: Option<u64>, config: &PaginationConfig) -> Self {
        let number = page
            .filter(|&page| page > 0)
            .unwrap_or(config.default_page)
            .max(1);
        let size = limit
            .filter(|&limit| limit > 0)
            .unwrap_or(config.default_page_size)
            .clamp(1, config.max_page_size.max(1));

        Self { number, size }
    }

    /// The number of rows to skip before this page.
    pub fn offset(&self) -> u64 {
        (self.number - 1).saturating_mul(self.size)
    }

    /// The paging metadata for a result set of `total_records` rows.
    pub fn meta(&self, total_records: u64) -> PageMeta {
        PageMeta {
            total_records,
            current_page: self.number,
            total_pages: total_records.div_ceil(self.size),
            page_size: self.size,
        }
    }
}

/// Paging metadata sent alongside a page of results.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PageMeta {
    /// The number of rows matching the filters across all pages.
    pub total_records: u64,
    /// The one-based page that was returned.
    pub current_page: u64,
    /// `ceil(total_records / page_size)`.
    pub total_pages: u64,
    /// The page size that was used.
    pub page_size: u64,
}
