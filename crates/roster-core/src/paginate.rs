//! Paginator: a bounded window over an ordered result set, plus the page
//! links shown under the table.

use serde::Serialize;
use std::fmt;

/// Number of consecutive page numbers shown around the current page.
pub const MAX_VISIBLE_PAGES: u32 = 5;

/// One entry in the pagination bar.
///
/// Serializes as the page number, or the string `"..."` for a gap.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PageLink {
    Page(u32),
    Ellipsis,
}

impl Serialize for PageLink {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            Self::Page(n) => serializer.serialize_u32(*n),
            Self::Ellipsis => serializer.serialize_str("..."),
        }
    }
}

impl fmt::Display for PageLink {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Page(n) => write!(f, "{n}"),
            Self::Ellipsis => f.write_str("..."),
        }
    }
}

/// The visible slice of an ordered result set.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PageWindow<'a, T> {
    /// Requested page after clamping into `1..=total_pages`.
    pub page: u32,
    /// Always at least 1, even for an empty result.
    pub total_pages: u32,
    pub total_items: usize,
    pub window: &'a [T],
    pub page_links: Vec<PageLink>,
}

impl<T> PageWindow<'_, T> {
    #[must_use]
    pub const fn has_previous(&self) -> bool {
        self.page > 1
    }

    #[must_use]
    pub const fn has_next(&self) -> bool {
        self.page < self.total_pages
    }
}

/// Number of pages needed for `total_items`; 1 when there are none.
#[must_use]
pub fn total_pages(total_items: usize, page_size: usize) -> u32 {
    let pages = total_items.div_ceil(page_size.max(1)).max(1);
    u32::try_from(pages).unwrap_or(u32::MAX)
}

/// Clamp any requested page into `1..=total_pages`.
#[must_use]
pub fn clamp_page(requested: i64, total_pages: u32) -> u32 {
    let clamped = requested.clamp(1, i64::from(total_pages.max(1)));
    u32::try_from(clamped).unwrap_or(1)
}

/// Slice `ordered` into the page closest to `requested`.
///
/// Out-of-range requests are clamped, never rejected. A `page_size` of 0 is
/// treated as 1.
#[must_use]
pub fn paginate<T>(ordered: &[T], page_size: usize, requested: i64) -> PageWindow<'_, T> {
    let page_size = page_size.max(1);
    let total = total_pages(ordered.len(), page_size);
    let page = clamp_page(requested, total);

    let skipped = usize::try_from(page - 1).unwrap_or(usize::MAX);
    let start = skipped.saturating_mul(page_size).min(ordered.len());
    let end = start.saturating_add(page_size).min(ordered.len());

    PageWindow {
        page,
        total_pages: total,
        total_items: ordered.len(),
        window: &ordered[start..end],
        page_links: page_links(page, total),
    }
}

/// Page links with the default window of [`MAX_VISIBLE_PAGES`].
#[must_use]
pub fn page_links(page: u32, total_pages: u32) -> Vec<PageLink> {
    page_links_with(page, total_pages, MAX_VISIBLE_PAGES)
}

/// Page links for `page` out of `total_pages`.
///
/// With few pages every number is listed. Otherwise a run of `max_visible`
/// consecutive pages is centred on `page` and shifted to stay in range; page 1
/// and the last page are always reachable, with an ellipsis standing in for
/// any gap of more than zero pages.
#[must_use]
pub fn page_links_with(page: u32, total_pages: u32, max_visible: u32) -> Vec<PageLink> {
    let total_pages = total_pages.max(1);
    let max_visible = max_visible.max(1);

    if total_pages <= max_visible {
        return (1..=total_pages).map(PageLink::Page).collect();
    }

    let page = page.clamp(1, total_pages);
    let left = page
        .saturating_sub(max_visible / 2)
        .min(total_pages - max_visible + 1)
        .max(1);
    let right = (left + max_visible - 1).min(total_pages);

    let mut links = Vec::with_capacity(max_visible as usize + 4);
    if left > 1 {
        links.push(PageLink::Page(1));
        if left > 2 {
            links.push(PageLink::Ellipsis);
        }
    }
    links.extend((left..=right).map(PageLink::Page));
    if right < total_pages {
        if right < total_pages - 1 {
            links.push(PageLink::Ellipsis);
        }
        links.push(PageLink::Page(total_pages));
    }
    links
}

#[cfg(test)]
mod tests {
    use super::*;
    use PageLink::{Ellipsis, Page};

    #[test]
    fn requested_page_past_end_is_clamped() {
        let items: Vec<u32> = (1..=23).collect();
        let view = paginate(&items, 10, 99);
        assert_eq!(view.page, 3);
        assert_eq!(view.total_pages, 3);
        assert_eq!(view.window, &[21, 22, 23]);
    }

    #[test]
    fn negative_and_zero_requests_land_on_first_page() {
        let items: Vec<u32> = (1..=23).collect();
        for requested in [i64::MIN, -5, 0] {
            let view = paginate(&items, 10, requested);
            assert_eq!(view.page, 1);
            assert_eq!(view.window.first(), Some(&1));
        }
        assert_eq!(paginate(&items, 10, i64::MAX).page, 3);
    }

    #[test]
    fn empty_input_has_one_empty_page() {
        let items: Vec<u32> = Vec::new();
        let view = paginate(&items, 10, 4);
        assert_eq!(view.page, 1);
        assert_eq!(view.total_pages, 1);
        assert!(view.window.is_empty());
        assert_eq!(view.page_links, vec![Page(1)]);
        assert!(!view.has_previous());
        assert!(!view.has_next());
    }

    #[test]
    fn exact_multiple_has_no_trailing_page() {
        let items: Vec<u32> = (1..=20).collect();
        assert_eq!(paginate(&items, 10, 1).total_pages, 2);
        assert_eq!(paginate(&items, 10, 2).window.len(), 10);
    }

    #[test]
    fn zero_page_size_is_treated_as_one() {
        let items = [1, 2, 3];
        let view = paginate(&items, 0, 2);
        assert_eq!(view.total_pages, 3);
        assert_eq!(view.window, &[2]);
    }

    #[test]
    fn single_page_links() {
        assert_eq!(page_links(1, 1), vec![Page(1)]);
    }

    #[test]
    fn few_pages_are_all_listed() {
        assert_eq!(page_links(2, 5), vec![Page(1), Page(2), Page(3), Page(4), Page(5)]);
    }

    #[test]
    fn middle_page_has_both_ellipses() {
        assert_eq!(
            page_links(5, 10),
            vec![Page(1), Ellipsis, Page(3), Page(4), Page(5), Page(6), Page(7), Ellipsis, Page(10)]
        );
    }

    #[test]
    fn first_page_window_hugs_the_start() {
        assert_eq!(
            page_links(1, 10),
            vec![Page(1), Page(2), Page(3), Page(4), Page(5), Ellipsis, Page(10)]
        );
    }

    #[test]
    fn last_page_window_hugs_the_end() {
        assert_eq!(
            page_links(10, 10),
            vec![Page(1), Ellipsis, Page(6), Page(7), Page(8), Page(9), Page(10)]
        );
    }

    #[test]
    fn no_ellipsis_for_a_gap_of_zero_pages() {
        assert_eq!(
            page_links(4, 10),
            vec![Page(1), Page(2), Page(3), Page(4), Page(5), Page(6), Ellipsis, Page(10)]
        );
        assert_eq!(
            page_links(7, 10),
            vec![Page(1), Ellipsis, Page(5), Page(6), Page(7), Page(8), Page(9), Page(10)]
        );
    }

    #[test]
    fn six_pages_show_one_edge_link() {
        assert_eq!(
            page_links(6, 6),
            vec![Page(1), Page(2), Page(3), Page(4), Page(5), Page(6)]
        );
        assert_eq!(
            page_links(3, 6),
            vec![Page(1), Page(2), Page(3), Page(4), Page(5), Page(6)]
        );
    }

    #[test]
    fn ellipsis_serializes_as_dots() {
        let json = serde_json::to_string(&page_links(5, 10)).expect("serialize");
        assert_eq!(json, r#"[1,"...",3,4,5,6,7,"...",10]"#);
    }
}
