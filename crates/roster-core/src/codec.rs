//! Query-state URL codec.
//!
//! Keys, in emission order: `query`, `plan`, `status`, `sort`, `page`. A key is
//! omitted when its value is the default, so the default state encodes to
//! the empty string. `sort` is `<field>` for ascending, `<field>:desc` or
//! `<field>:none` otherwise.
//!
//! Decoding never fails: unknown keys are ignored, missing or malformed values
//! keep their defaults, and the first occurrence of a repeated key wins.

use tracing::warn;
use url::form_urlencoded;

use crate::query::{PlanFilter, QueryState, SortDirection, SortField, StatusFilter};

pub const KEY_QUERY: &str = "query";
pub const KEY_PLAN: &str = "plan";
pub const KEY_STATUS: &str = "status";
pub const KEY_SORT: &str = "sort";
pub const KEY_PAGE: &str = "page";

/// Encode a state as a form-urlencoded fragment without the leading `?`.
#[must_use]
pub fn encode(query: &QueryState) -> String {
    let defaults = QueryState::default();
    let mut out = form_urlencoded::Serializer::new(String::new());

    if !query.search_text().is_empty() {
        out.append_pair(KEY_QUERY, query.search_text());
    }
    if query.plan() != defaults.plan() {
        out.append_pair(KEY_PLAN, query.plan().as_str());
    }
    if query.status() != defaults.status() {
        out.append_pair(KEY_STATUS, query.status().as_str());
    }
    if query.sort_field() != defaults.sort_field()
        || query.sort_direction() != defaults.sort_direction()
    {
        out.append_pair(KEY_SORT, &encode_sort(query.sort_field(), query.sort_direction()));
    }
    if query.page() != defaults.page() {
        out.append_pair(KEY_PAGE, &query.page().to_string());
    }
    out.finish()
}

/// Encode with a leading `?`, or the empty string for the default state.
#[must_use]
pub fn encode_link(query: &QueryState) -> String {
    let fragment = encode(query);
    if fragment.is_empty() {
        fragment
    } else {
        format!("?{fragment}")
    }
}

fn encode_sort(field: SortField, direction: SortDirection) -> String {
    match direction {
        SortDirection::Asc => field.as_str().to_string(),
        other => format!("{}:{}", field.as_str(), other.as_str()),
    }
}

/// Decode a fragment such as `page=2&plan=Plan+1`.
///
/// A leading `?`, and anything before it (a path or a full URL), is skipped.
/// A trailing `#anchor` is dropped.
#[must_use]
pub fn decode(fragment: &str) -> QueryState {
    let fragment = strip_location(fragment);
    let fragment = fragment.split_once('#').map_or(fragment, |(head, _)| head);

    let mut search: Option<String> = None;
    let mut plan: Option<String> = None;
    let mut status: Option<String> = None;
    let mut sort: Option<String> = None;
    let mut page: Option<String> = None;

    for (key, value) in form_urlencoded::parse(fragment.as_bytes()) {
        let slot = match key.as_ref() {
            KEY_QUERY => &mut search,
            KEY_PLAN => &mut plan,
            KEY_STATUS => &mut status,
            KEY_SORT => &mut sort,
            KEY_PAGE => &mut page,
            _ => continue,
        };
        if slot.is_none() {
            *slot = Some(value.into_owned());
        }
    }

    let defaults = QueryState::default();
    let plan = plan.map_or(defaults.plan(), |raw| decode_plan(&raw));
    let status = status.map_or(defaults.status(), |raw| decode_status(&raw));
    let (sort_field, sort_direction) = sort.map_or(
        (defaults.sort_field(), defaults.sort_direction()),
        |raw| decode_sort(&raw),
    );
    let page = page.map_or(defaults.page(), |raw| decode_page(&raw));

    QueryState::new(
        search.unwrap_or_default(),
        plan,
        status,
        sort_field,
        sort_direction,
        page,
    )
}

/// Drop a URL or path in front of the first `?`.
///
/// Text before the `?` that holds `=` or `&` is already part of the query, so
/// a bare fragment with a raw `?` inside a value is kept whole.
fn strip_location(fragment: &str) -> &str {
    match fragment.split_once('?') {
        Some((head, rest)) if !head.contains(['=', '&']) => rest,
        _ => fragment,
    }
}

fn decode_plan(raw: &str) -> PlanFilter {
    raw.parse().unwrap_or_else(|err| {
        warn!(target: "roster::codec", key = KEY_PLAN, raw, %err, "ignoring plan filter");
        PlanFilter::All
    })
}

fn decode_status(raw: &str) -> StatusFilter {
    raw.parse().unwrap_or_else(|err| {
        warn!(target: "roster::codec", key = KEY_STATUS, raw, %err, "ignoring status filter");
        StatusFilter::All
    })
}

/// An unknown field disables sorting; an unknown direction reads as ascending.
fn decode_sort(raw: &str) -> (SortField, SortDirection) {
    let (field, direction) = raw.split_once(':').unwrap_or((raw, SortDirection::Asc.as_str()));
    match field.parse::<SortField>() {
        Ok(field) => {
            let direction = direction.parse().unwrap_or_else(|err| {
                warn!(target: "roster::codec", key = KEY_SORT, raw, %err, "defaulting sort direction");
                SortDirection::Asc
            });
            (field, direction)
        }
        Err(err) => {
            warn!(target: "roster::codec", key = KEY_SORT, raw, %err, "unknown sort field, sorting disabled");
            (SortField::default(), SortDirection::Unsorted)
        }
    }
}

/// Malformed, zero, negative or oversized page numbers decode to page 1.
fn decode_page(raw: &str) -> u32 {
    match raw.trim().parse::<u32>() {
        Ok(page) if page >= 1 => page,
        _ => {
            warn!(target: "roster::codec", key = KEY_PAGE, raw, "ignoring page number");
            1
        }
    }
}
