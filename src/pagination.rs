use serde::Serialize;
use utoipa::ToSchema;

/// Page metadata derived from a total row count.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct PageInfo {
    pub page: u64,
    pub limit: u64,
    pub total: u64,
    pub total_pages: u64,
    pub has_next: bool,
    pub has_previous: bool,
}

impl PageInfo {
    /// `limit` is clamped to `1..=100` by the query DTOs before it gets here.
    pub fn new(page: u64, limit: u64, total: u64) -> Self {
        let total_pages = if total == 0 {
            0
        } else {
            (total + limit - 1) / limit
        };
        Self {
            page,
            limit,
            total,
            total_pages,
            has_next: page * limit < total,
            has_previous: page > 1,
        }
    }
}

/// One page of results plus its metadata.
#[derive(Debug, Serialize, ToSchema)]
pub struct Page<T> {
    pub data: Vec<T>,
    pub pagination: PageInfo,
}

impl<T> Page<T> {
    pub fn new(data: Vec<T>, page: u64, limit: u64, total: u64) -> Self {
        Self {
            data,
            pagination: PageInfo::new(page, limit, total),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case(1, 20, 0, 0, false, false)]
    #[case(1, 20, 20, 1, false, false)]
    #[case(1, 20, 21, 2, true, false)]
    #[case(2, 2, 25, 13, true, true)]
    #[case(13, 2, 25, 13, false, true)]
    // A page past the end still reports has_next = false.
    #[case(14, 2, 25, 13, false, true)]
    fn page_info_math(
        #[case] page: u64,
        #[case] limit: u64,
        #[case] total: u64,
        #[case] total_pages: u64,
        #[case] has_next: bool,
        #[case] has_previous: bool,
    ) {
        let info = PageInfo::new(page, limit, total);
        assert_eq!(info.total_pages, total_pages);
        assert_eq!(info.has_next, has_next);
        assert_eq!(info.has_previous, has_previous);
    }
}
