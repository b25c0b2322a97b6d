use serde::{Deserialize, Serialize};

/// 1-indexed pagination parameters as they arrive from the query string.
#[derive(Debug, Clone, Copy, Deserialize)]
pub struct PageParams {
    #[serde(default = "default_page")]
    pub page: i64,
    #[serde(default = "default_limit")]
    pub limit: i64,
}

fn default_page() -> i64 {
    1
}

fn default_limit() -> i64 {
    20
}

pub const MAX_LIMIT: i64 = 50;

impl Default for PageParams {
    fn default() -> Self {
        Self { page: 1, limit: 20 }
    }
}

impl PageParams {
    /// Clamps page/limit into valid ranges; page < 1 becomes 1, limit is
    /// bounded to [1, MAX_LIMIT].
    pub fn clamped(self) -> Self {
        Self {
            page: self.page.max(1),
            limit: self.limit.clamp(1, MAX_LIMIT),
        }
    }

    pub fn offset(&self) -> i64 {
        (self.page - 1) * self.limit
    }
}

/// Standard paginated response envelope.
#[derive(Debug, Clone, Serialize)]
pub struct Page<T> {
    pub items: Vec<T>,
    pub total: i64,
    pub page: i64,
    pub limit: i64,
    pub total_pages: i64,
}

impl<T> Page<T> {
    pub fn new(items: Vec<T>, total: i64, params: PageParams) -> Self {
        Self {
            items,
            total,
            page: params.page,
            limit: params.limit,
            total_pages: total_pages(total, params.limit),
        }
    }
}

/// `ceil(total / limit)`, without going through floats.
pub fn total_pages(total: i64, limit: i64) -> i64 {
    if limit <= 0 {
        return 0;
    }
    (total + limit - 1) / limit
}

/// Slices an in-memory-sorted full result set down to one page. Used by the
/// trending and most_popular strategies, which must score the whole filtered
/// set before paginating.
pub fn paginate_in_memory<T>(items: Vec<T>, params: PageParams) -> Vec<T> {
    let start = params.offset().max(0) as usize;
    items
        .into_iter()
        .skip(start)
        .take(params.limit.max(0) as usize)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_offset_is_one_indexed() {
        let p = PageParams { page: 1, limit: 20 };
        assert_eq!(p.offset(), 0);
        let p = PageParams { page: 3, limit: 10 };
        assert_eq!(p.offset(), 20);
    }

    #[test]
    fn test_total_pages_rounds_up() {
        assert_eq!(total_pages(0, 20), 0);
        assert_eq!(total_pages(1, 20), 1);
        assert_eq!(total_pages(20, 20), 1);
        assert_eq!(total_pages(21, 20), 2);
        assert_eq!(total_pages(41, 20), 3);
    }

    #[test]
    fn test_clamped_bounds() {
        let p = PageParams { page: 0, limit: 500 }.clamped();
        assert_eq!(p.page, 1);
        assert_eq!(p.limit, MAX_LIMIT);
        let p = PageParams { page: -2, limit: 0 }.clamped();
        assert_eq!(p.page, 1);
        assert_eq!(p.limit, 1);
    }

    #[test]
    fn test_paginate_in_memory_slices() {
        let items: Vec<i32> = (0..55).collect();
        let page2 = paginate_in_memory(items.clone(), PageParams { page: 2, limit: 20 });
        assert_eq!(page2.first(), Some(&20));
        assert_eq!(page2.len(), 20);

        let page3 = paginate_in_memory(items.clone(), PageParams { page: 3, limit: 20 });
        assert_eq!(page3.len(), 15);

        let past_end = paginate_in_memory(items, PageParams { page: 9, limit: 20 });
        assert!(past_end.is_empty());
    }
}
