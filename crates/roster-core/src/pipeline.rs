//! Filter/sort pipeline: (records, query) → ordered, filtered records.

use std::cmp::Ordering;

use crate::model::SubscriberRecord;
use crate::query::{PlanFilter, QueryState, SortDirection, SortField, StatusFilter};

/// Apply the query's filters and sort to `records`.
///
/// Predicates are combined with AND. Sorting is stable, so records with equal
/// keys keep their input order; with [`SortDirection::Unsorted`] the filtered
/// input order is returned as-is.
#[must_use]
pub fn apply(records: &[SubscriberRecord], query: &QueryState) -> Vec<SubscriberRecord> {
    let needle = query.search_text().to_lowercase();
    let mut filtered: Vec<SubscriberRecord> = records
        .iter()
        .filter(|record| matches_search(record, &needle))
        .filter(|record| matches_plan(record, query.plan()))
        .filter(|record| matches_status(record, query.status()))
        .cloned()
        .collect();

    sort_records(&mut filtered, query.sort_field(), query.sort_direction());
    filtered
}

/// Returns true if the record satisfies every predicate of `query`.
#[must_use]
pub fn matches(record: &SubscriberRecord, query: &QueryState) -> bool {
    matches_search(record, &query.search_text().to_lowercase())
        && matches_plan(record, query.plan())
        && matches_status(record, query.status())
}

/// Case-insensitive substring match on name or email. `needle` must already
/// be lowercased; an empty needle matches everything.
fn matches_search(record: &SubscriberRecord, needle: &str) -> bool {
    needle.is_empty()
        || record.name.to_lowercase().contains(needle)
        || record.email.to_lowercase().contains(needle)
}

fn matches_plan(record: &SubscriberRecord, plan: PlanFilter) -> bool {
    match plan {
        PlanFilter::All => true,
        PlanFilter::Only(code) => record.plan.code() == Some(code),
    }
}

fn matches_status(record: &SubscriberRecord, status: StatusFilter) -> bool {
    match status {
        StatusFilter::All => true,
        StatusFilter::Only(wanted) => record.status == wanted,
    }
}

/// Stable in-place sort of `records` by one column.
pub fn sort_records(records: &mut [SubscriberRecord], field: SortField, direction: SortDirection) {
    match direction {
        SortDirection::Unsorted => {}
        SortDirection::Asc => records.sort_by(|a, b| compare(field, a, b)),
        SortDirection::Desc => records.sort_by(|a, b| compare(field, a, b).reverse()),
    }
}

/// Ascending comparator for one column.
#[must_use]
pub fn compare(field: SortField, a: &SubscriberRecord, b: &SubscriberRecord) -> Ordering {
    match field {
        SortField::Name => compare_text(&a.name, &b.name),
        SortField::Email => compare_text(&a.email, &b.email),
        SortField::Plan => compare_text(a.plan.as_str(), b.plan.as_str()),
        SortField::Status => compare_text(a.status.as_str(), b.status.as_str()),
        SortField::Country => compare_text(&a.country, &b.country),
        // Missing expiry sorts before any real date.
        SortField::ExpiresOn => a.expires_on.cmp(&b.expires_on),
        SortField::JoinDate => a.join_date.cmp(&b.join_date),
        SortField::Revenue => a.revenue.cmp(&b.revenue),
    }
}

/// Collation used for text columns: case-folded comparison first, raw text
/// as the tie-break, so the order is total.
#[must_use]
pub fn compare_text(a: &str, b: &str) -> Ordering {
    a.chars()
        .flat_map(char::to_lowercase)
        .cmp(b.chars().flat_map(char::to_lowercase))
        .then_with(|| a.cmp(b))
}
