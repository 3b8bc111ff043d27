use serde::Deserialize;

pub const PAGE_SIZE: u64 = 10;
pub const DEFAULT_PENDING_LIMIT: u64 = 10;
pub const MAX_PENDING_LIMIT: u64 = 100;

/// `?page=` is kept as text so junk values fall back to page 1 instead of
/// failing the request.
#[derive(Debug, Default, Deserialize)]
pub struct PageParams {
    pub page: Option<String>,
}

/// Resolved position within a paged listing.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageWindow {
    pub page: u64,
    pub total_pages: u64,
    pub skip: u64,
    pub limit: u64,
}

impl PageParams {
    /// Clamp the requested page into `1..=total_pages` (at least 1).
    pub fn window(&self, total: u64) -> PageWindow {
        let total_pages = total.div_ceil(PAGE_SIZE);
        let requested = self
            .page
            .as_deref()
            .and_then(|p| p.trim().parse::<i64>().ok())
            .unwrap_or(1);

        let page = (requested.max(1) as u64).min(total_pages).max(1);

        PageWindow {
            page,
            total_pages,
            skip: (page - 1) * PAGE_SIZE,
            limit: PAGE_SIZE,
        }
    }
}

#[derive(Debug, Default, Deserialize)]
pub struct PendingParams {
    pub offset: Option<String>,
    pub limit: Option<String>,
}

impl PendingParams {
    /// `(offset, limit)` with defaults applied and the limit capped.
    pub fn resolve(&self) -> (u64, u64) {
        let parse = |value: &Option<String>| value.as_deref().and_then(|v| v.trim().parse::<u64>().ok());
        let offset = parse(&self.offset).unwrap_or(0);
        let limit = parse(&self.limit)
            .unwrap_or(DEFAULT_PENDING_LIMIT)
            .min(MAX_PENDING_LIMIT);
        (offset, limit)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn page(value: Option<&str>) -> PageParams {
        PageParams {
            page: value.map(str::to_string),
        }
    }

    #[test]
    fn page_defaults_to_one() {
        let window = page(None).window(35);
        assert_eq!(window.page, 1);
        assert_eq!(window.total_pages, 4);
        assert_eq!(window.skip, 0);
    }

    #[test]
    fn out_of_range_pages_are_clamped() {
        assert_eq!(page(Some("-3")).window(35).page, 1);
        assert_eq!(page(Some("0")).window(35).page, 1);
        assert_eq!(page(Some("9")).window(35).page, 4);
        assert_eq!(page(Some("9")).window(35).skip, 30);
        assert_eq!(page(Some("abc")).window(35).page, 1);
    }

    #[test]
    fn empty_collection_still_reports_page_one() {
        let window = page(Some("5")).window(0);
        assert_eq!(window.page, 1);
        assert_eq!(window.total_pages, 0);
        assert_eq!(window.skip, 0);
    }

    #[test]
    fn pending_limit_is_capped() {
        let params = PendingParams {
            offset: Some("20".into()),
            limit: Some("1000".into()),
        };
        assert_eq!(params.resolve(), (20, MAX_PENDING_LIMIT));
        assert_eq!(PendingParams::default().resolve(), (0, DEFAULT_PENDING_LIMIT));
    }
}
