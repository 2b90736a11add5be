#![no_main]

use libfuzzer_sys::fuzz_target;
use roster_core::paginate::{self, PageLink};

fuzz_target!(|input: (u16, u8, i64)| {
    let (len, page_size, requested) = input;
    let items: Vec<u16> = (0..len).collect();
    let window = paginate::paginate(&items, usize::from(page_size), requested);

    assert!(window.page >= 1 && window.page <= window.total_pages);
    assert!(window.window.len() <= usize::from(page_size.max(1)));
    assert_eq!(window.page_links.first(), Some(&PageLink::Page(1)));
    assert_eq!(window.page_links.last(), Some(&PageLink::Page(window.total_pages)));
    assert!(window.page_links.contains(&PageLink::Page(window.page)));
});
