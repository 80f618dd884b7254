//! Pagination query parameters.

use serde::Deserialize;

const DEFAULT_LIMIT: u32 = 10;
const MAX_LIMIT: u32 = 100;

/// `?page=N&limit=M` parameters accepted by list endpoints.
///
/// Out-of-range values are clamped rather than rejected: `page` is at
/// least 1 and `limit` is between 1 and 100.
#[derive(Debug, Clone, Copy, Deserialize)]
#[serde(default)]
pub struct ListParams {
    pub page: u32,
    pub limit: u32,
}

impl Default for ListParams {
    fn default() -> Self {
        Self {
            page: 1,
            limit: DEFAULT_LIMIT,
        }
    }
}

impl ListParams {
    /// Row limit for the query.
    #[must_use]
    pub fn limit(self) -> i64 {
        i64::from(self.limit.clamp(1, MAX_LIMIT))
    }

    /// Row offset for the query.
    #[must_use]
    pub fn offset(self) -> i64 {
        i64::from(self.page.max(1) - 1) * self.limit()
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let params = ListParams::default();
        assert_eq!(params.limit(), 10);
        assert_eq!(params.offset(), 0);
    }

    #[test]
    fn test_offset_from_page() {
        let params = ListParams { page: 3, limit: 20 };
        assert_eq!(params.offset(), 40);
    }

    #[test]
    fn test_clamps_out_of_range() {
        let params = ListParams { page: 0, limit: 0 };
        assert_eq!(params.limit(), 1);
        assert_eq!(params.offset(), 0);

        let params = ListParams {
            page: 1,
            limit: 9999,
        };
        assert_eq!(params.limit(), 100);
    }

    #[test]
    fn test_deserialize_with_missing_fields() {
        let params: ListParams = serde_json::from_str("{}").unwrap();
        assert_eq!(params.page, 1);
        assert_eq!(params.limit, 10);

        let params: ListParams = serde_json::from_str(r#"{"page": 2}"#).unwrap();
        assert_eq!(params.page, 2);
        assert_eq!(params.limit, 10);
    }
}
