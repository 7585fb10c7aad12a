// src/domain/pagination.rs

use std::num::NonZeroUsize;

use serde::Serialize;

pub const PAGE_SIZE_OPTIONS: [usize; 4] = [10, 20, 50, 100];
pub const DEFAULT_PAGE_SIZE: usize = 20;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Page<T> {
    pub items: Vec<T>,
    /// 1-based, exactly as requested (not clamped).
    pub page: usize,
    pub page_size: usize,
    /// `ceil(total_count / page_size)`, never below 1.
    pub total_pages: usize,
    pub total_count: usize,
}

/// Slices `ordered` for the 1-based `page`.
///
/// No clamping: page 0 or a page past the end yields an empty `items`.
/// Callers re-clamp with [`clamp_page`] and reset to page 1 whenever the
/// filter, sort or page size changes.
pub fn paginate<T: Clone>(ordered: &[T], page: usize, page_size: NonZeroUsize) -> Page<T> {
    let size = page_size.get();
    let total_count = ordered.len();
    let total_pages = total_pages(total_count, page_size);

    let items = match page.checked_sub(1) {
        Some(zero_based) => {
            let start = zero_based.saturating_mul(size);
            ordered.iter().skip(start).take(size).cloned().collect()
        }
        None => Vec::new(),
    };

    Page {
        items,
        page,
        page_size: size,
        total_pages,
        total_count,
    }
}

pub fn total_pages(total_count: usize, page_size: NonZeroUsize) -> usize {
    total_count.div_ceil(page_size.get()).max(1)
}

/// Pins `page` into `[1, total_pages]`.
pub fn clamp_page(page: usize, total_pages: usize) -> usize {
    page.clamp(1, total_pages.max(1))
}

/// Accepts only the offered sizes; anything else falls back to the default.
pub fn page_size_or_default(requested: Option<usize>) -> NonZeroUsize {
    let size = requested
        .filter(|s| PAGE_SIZE_OPTIONS.contains(s))
        .unwrap_or(DEFAULT_PAGE_SIZE);
    NonZeroUsize::new(size).unwrap_or(NonZeroUsize::MIN)
}
