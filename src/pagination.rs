//! This modules defines the common functionality for paging data.

/// The config for pagination
#[derive(Debug, Clone)]
pub struct PaginationConfig {
    /// The number of transactions shown on each page.
    pub page_size: u64,
    /// The maximum number of pages to show in the pagination indicator.
    pub max_pages: u64,
}

impl Default for PaginationConfig {
    fn default() -> Self {
        Self {
            page_size: 10,
            max_pages: 5,
        }
    }
}

/// The number of pages needed to show `len` items, `page_size` at a time.
///
/// A page size of zero is treated as one.
pub fn page_count(len: usize, page_size: u64) -> u64 {
    (len as u64).div_ceil(page_size.max(1))
}

/// The items on the 1-based `page`.
///
/// Pages outside `[1, page_count]` are empty. The page is not clamped, see
/// [clamp_page].
pub fn page_slice<T>(items: &[T], page: u64, page_size: u64) -> &[T] {
    let page_size = page_size.max(1);

    let Some(start) = page
        .checked_sub(1)
        .and_then(|index| index.checked_mul(page_size))
        .and_then(|start| usize::try_from(start).ok())
    else {
        return &[];
    };

    if start >= items.len() {
        return &[];
    }

    let end = usize::try_from(page_size)
        .ok()
        .and_then(|page_size| start.checked_add(page_size))
        .map_or(items.len(), |end| end.min(items.len()));

    &items[start..end]
}

/// Bring `page` back into `[1, page_count]`.
///
/// Used after the collection shrinks, e.g. when the last row on the last page
/// is deleted. An empty collection still has page 1.
pub fn clamp_page(page: u64, page_count: u64) -> u64 {
    page.min(page_count).max(1)
}

#[derive(Debug, PartialEq, Eq)]
pub enum PaginationIndicator {
    Page(u64),
    CurrPage(u64),
    Ellipsis,
    NextButton(u64),
    BackButton(u64),
}

pub fn create_pagination_indicators(
    curr_page: u64,
    page_count: u64,
    max_pages: u64,
) -> Vec<PaginationIndicator> {
    let map_page = |page| {
        if page == curr_page {
            PaginationIndicator::CurrPage(page)
        } else {
            PaginationIndicator::Page(page)
        }
    };

    let mut indicators: Vec<PaginationIndicator> = if page_count <= max_pages {
        (1..=page_count).map(map_page).collect()
    } else if curr_page <= (max_pages / 2) {
        (1..=max_pages).map(map_page).collect()
    } else if curr_page > (page_count - max_pages / 2) {
        ((page_count - max_pages + 1)..=page_count)
            .map(map_page)
            .collect()
    } else {
        ((curr_page - max_pages / 2)..=(curr_page + max_pages / 2))
            .map(map_page)
            .collect()
    };

    if page_count > max_pages {
        if curr_page > (max_pages / 2) + 1 {
            indicators.insert(0, PaginationIndicator::Page(1));
            indicators.insert(1, PaginationIndicator::Ellipsis);
        }

        if curr_page < (page_count - max_pages / 2) {
            indicators.push(PaginationIndicator::Ellipsis);
            indicators.push(PaginationIndicator::Page(page_count));
        }
    }

    if curr_page > 1 {
        indicators.insert(0, PaginationIndicator::BackButton(curr_page - 1));
    }

    if curr_page < page_count {
        indicators.push(PaginationIndicator::NextButton(curr_page + 1));
    }

    indicators
}
