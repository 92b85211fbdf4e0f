use serde::{Deserialize, Serialize};

/// Fixed page size for every listing endpoint.
pub const PAGE_SIZE: i64 = 10;

/// Untrusted `?page=` query parameter. Deserialized as a raw string so that
/// garbage input falls back to page 1 instead of rejecting the request.
#[derive(Debug, Default, Deserialize)]
pub struct PageQuery {
    pub page: Option<String>,
}

impl PageQuery {
    /// Requested page number; absent or unparsable values coerce to 1.
    pub fn requested(&self) -> i64 {
        self.page
            .as_deref()
            .and_then(|s| s.parse::<i64>().ok())
            .unwrap_or(1)
    }
}

/// Pagination metadata for a listing response. The page number is already
/// clamped to the valid range, so `offset()` can be fed straight into a
/// LIMIT/OFFSET query.
#[derive(Debug, Serialize, PartialEq, Eq)]
pub struct PageMeta {
    pub number: i64,
    pub total_pages: i64,
    pub has_next: bool,
    pub has_previous: bool,
}

impl PageMeta {
    /// Builds metadata for `total` entities and an untrusted page request.
    /// Out-of-range numbers clamp to the nearest valid page; an empty result
    /// set still has one (empty) page.
    pub fn new(total: i64, query: &PageQuery) -> Self {
        let total_pages = ((total.max(0) + PAGE_SIZE - 1) / PAGE_SIZE).max(1);
        let number = query.requested().clamp(1, total_pages);

        Self {
            number,
            total_pages,
            has_next: number < total_pages,
            has_previous: number > 1,
        }
    }

    pub fn offset(&self) -> i64 {
        (self.number - 1) * PAGE_SIZE
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn query(page: Option<&str>) -> PageQuery {
        PageQuery {
            page: page.map(String::from),
        }
    }

    #[test]
    fn first_page_of_25_items() {
        let meta = PageMeta::new(25, &query(Some("1")));
        assert_eq!(meta.number, 1);
        assert_eq!(meta.total_pages, 3);
        assert!(meta.has_next);
        assert!(!meta.has_previous);
        assert_eq!(meta.offset(), 0);
    }

    #[test]
    fn last_page_of_25_items() {
        let meta = PageMeta::new(25, &query(Some("3")));
        assert_eq!(meta.number, 3);
        assert!(!meta.has_next);
        assert!(meta.has_previous);
        // 20 skipped, 5 remain on the page
        assert_eq!(meta.offset(), 20);
    }

    #[test]
    fn out_of_range_page_clamps_to_last() {
        let meta = PageMeta::new(25, &query(Some("4")));
        assert_eq!(meta.number, 3);
        assert!(!meta.has_next);
    }

    #[test]
    fn zero_and_negative_pages_clamp_to_first() {
        assert_eq!(PageMeta::new(25, &query(Some("0"))).number, 1);
        assert_eq!(PageMeta::new(25, &query(Some("-7"))).number, 1);
    }

    #[test]
    fn missing_or_garbage_page_defaults_to_first() {
        assert_eq!(PageMeta::new(25, &query(None)).number, 1);
        assert_eq!(PageMeta::new(25, &query(Some("abc"))).number, 1);
        assert_eq!(PageMeta::new(25, &query(Some(""))).number, 1);
    }

    #[test]
    fn empty_result_set_has_a_single_empty_page() {
        let meta = PageMeta::new(0, &query(Some("9")));
        assert_eq!(meta.number, 1);
        assert_eq!(meta.total_pages, 1);
        assert!(!meta.has_next);
        assert!(!meta.has_previous);
    }

    #[test]
    fn exact_multiple_of_page_size() {
        let meta = PageMeta::new(20, &query(Some("2")));
        assert_eq!(meta.total_pages, 2);
        assert!(!meta.has_next);
    }
}
