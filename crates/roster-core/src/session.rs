//! The list view's event loop.
//!
//! A [`DashboardSession`] owns the joined records, the current
//! [`QueryState`], the search debouncer and the URL store. Every transition
//! goes through one commit path: recompute the ordered result when a filter
//! or sort input changed, clamp the page against it, then re-encode the URL.

use std::time::Duration;

use serde::Serialize;
use tracing::{debug, warn};

use crate::codec;
use crate::config::ProjectConfig;
use crate::debounce::{DEFAULT_QUIET, Scheduler, SearchCommit, SearchDebouncer};
use crate::model::SubscriberRecord;
use crate::paginate::{self, PageLink};
use crate::pipeline;
use crate::query::{PlanFilter, QueryState, SortField, StatusFilter};
use crate::stats::{PlanDistribution, SummaryStats};
use crate::store::UrlStateStore;

/// Tunables for a session.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SessionSettings {
    pub page_size: usize,
    pub quiet: Duration,
}

impl Default for SessionSettings {
    fn default() -> Self {
        Self {
            page_size: 10,
            quiet: DEFAULT_QUIET,
        }
    }
}

impl From<&ProjectConfig> for SessionSettings {
    fn from(config: &ProjectConfig) -> Self {
        Self {
            page_size: config.list.page_size.max(1),
            quiet: config.search.debounce(),
        }
    }
}

/// Everything the renderer needs for one frame of the list view.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DashboardView {
    pub rows: Vec<SubscriberRecord>,
    pub page: u32,
    pub total_pages: u32,
    pub total_items: usize,
    pub page_links: Vec<PageLink>,
    pub query: QueryState,
    /// Shareable link (`?query=...`), empty for the default view.
    pub link: String,
}

pub struct DashboardSession<U, S> {
    records: Vec<SubscriberRecord>,
    results: Vec<SubscriberRecord>,
    query: QueryState,
    debouncer: SearchDebouncer<S>,
    store: U,
    stored: String,
    settings: SessionSettings,
}

impl<U: UrlStateStore, S: Scheduler<SearchCommit>> DashboardSession<U, S> {
    /// Start a session from whatever state the store currently holds.
    ///
    /// The stored fragment is decoded leniently, its page clamped against the
    /// filtered result, and the store rewritten if normalization changed it.
    pub fn open(
        records: Vec<SubscriberRecord>,
        store: U,
        scheduler: S,
        settings: SessionSettings,
    ) -> Self {
        let stored = store.read().unwrap_or_else(|err| {
            warn!(error = %err, "could not read stored view, using defaults");
            String::new()
        });
        let decoded = codec::decode(&stored);
        let results = pipeline::apply(&records, &decoded);

        let mut session = Self {
            records,
            results,
            query: decoded,
            debouncer: SearchDebouncer::new(scheduler, settings.quiet),
            store,
            stored,
            settings,
        };
        session.query = session.clamped(session.query.clone());
        debug!(
            records = session.records.len(),
            results = session.results.len(),
            page = session.query.page(),
            "session opened"
        );
        session.sync_url();
        session
    }

    /// Raw search-box edit; committed after the quiet interval by [`Self::tick`].
    pub fn type_search(&mut self, text: impl Into<String>) {
        self.debouncer.input(text);
    }

    /// Commit search text now, dropping any pending debounced edit.
    pub fn submit_search(&mut self, text: impl Into<String>) -> bool {
        self.debouncer.cancel();
        let next = self.query.with_search(text);
        self.commit(next)
    }

    pub fn set_plan(&mut self, plan: PlanFilter) -> bool {
        let next = self.query.with_plan(plan);
        self.commit(next)
    }

    pub fn set_status(&mut self, status: StatusFilter) -> bool {
        let next = self.query.with_status(status);
        self.commit(next)
    }

    /// Column header click.
    pub fn click_sort(&mut self, field: SortField) -> bool {
        let next = self.query.toggle_sort(field);
        self.commit(next)
    }

    /// Jump to a page; anything out of range lands on the nearest valid page.
    pub fn go_to_page(&mut self, requested: i64) -> bool {
        let total = paginate::total_pages(self.results.len(), self.settings.page_size);
        let page = paginate::clamp_page(requested, total);
        let next = self.query.with_page(page);
        self.commit(next)
    }

    /// Back to the default view, clearing the URL and any pending search.
    pub fn reset(&mut self) -> bool {
        self.debouncer.cancel();
        self.commit(QueryState::default())
    }

    /// Drain due timers. Returns true when a debounced search was applied.
    pub fn tick(&mut self) -> bool {
        match self.debouncer.poll() {
            Some(text) => {
                let next = self.query.with_search(text);
                self.commit(next)
            }
            None => false,
        }
    }

    #[must_use]
    pub fn view(&self) -> DashboardView {
        let window = paginate::paginate(
            &self.results,
            self.settings.page_size,
            i64::from(self.query.page()),
        );
        DashboardView {
            rows: window.window.to_vec(),
            page: window.page,
            total_pages: window.total_pages,
            total_items: window.total_items,
            page_links: window.page_links,
            query: self.query.clone(),
            link: codec::encode_link(&self.query),
        }
    }

    #[must_use]
    pub const fn query(&self) -> &QueryState {
        &self.query
    }

    /// What the search box shows: the pending edit, or the committed text.
    #[must_use]
    pub fn search_input(&self) -> &str {
        if self.debouncer.is_pending() {
            self.debouncer.latest()
        } else {
            self.query.search_text()
        }
    }

    #[must_use]
    pub const fn is_search_pending(&self) -> bool {
        self.debouncer.is_pending()
    }

    /// Every joined record, unfiltered.
    #[must_use]
    pub fn records(&self) -> &[SubscriberRecord] {
        &self.records
    }

    /// The filtered and sorted result across all pages.
    #[must_use]
    pub fn results(&self) -> &[SubscriberRecord] {
        &self.results
    }

    #[must_use]
    pub fn summary(&self) -> SummaryStats {
        SummaryStats::from_records(&self.records)
    }

    #[must_use]
    pub fn distribution(&self) -> PlanDistribution {
        PlanDistribution::from_records(&self.records)
    }

    #[must_use]
    pub const fn store(&self) -> &U {
        &self.store
    }

    pub fn into_store(self) -> U {
        self.store
    }

    pub const fn scheduler_mut(&mut self) -> &mut S {
        self.debouncer.scheduler_mut()
    }

    fn commit(&mut self, next: QueryState) -> bool {
        if next == self.query {
            return false;
        }
        let reorder = next.search_text() != self.query.search_text()
            || next.plan() != self.query.plan()
            || next.status() != self.query.status()
            || next.sort_field() != self.query.sort_field()
            || next.sort_direction() != self.query.sort_direction();
        if reorder {
            self.results = pipeline::apply(&self.records, &next);
        }
        self.query = self.clamped(next);
        debug!(
            query = %codec::encode(&self.query),
            results = self.results.len(),
            "view state committed"
        );
        self.sync_url();
        true
    }

    fn clamped(&self, query: QueryState) -> QueryState {
        let total = paginate::total_pages(self.results.len(), self.settings.page_size);
        let page = paginate::clamp_page(i64::from(query.page()), total);
        if page == query.page() {
            query
        } else {
            query.with_page(page)
        }
    }

    fn sync_url(&mut self) {
        let fragment = codec::encode(&self.query);
        if fragment == self.stored {
            return;
        }
        match self.store.write(&fragment) {
            Ok(()) => self.stored = fragment,
            Err(err) => warn!(error = %err, %fragment, "could not persist view state"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::debounce::VirtualScheduler;
    use crate::model::{Cents, Plan, PlanCode, Status};
    use crate::query::SortDirection;
    use crate::store::MemoryUrlStore;
    use anyhow::bail;
    use chrono::DateTime;

    type Session = DashboardSession<MemoryUrlStore, VirtualScheduler<SearchCommit>>;

    fn record(id: usize, name: &str, plan: PlanCode, status: Status) -> SubscriberRecord {
        SubscriberRecord {
            id: id.to_string(),
            name: name.to_string(),
            email: format!("{}@example.com", name.to_lowercase()),
            plan: Plan::Known(plan),
            status,
            expires_on: None,
            join_date: DateTime::from_timestamp(0, 0).expect("epoch"),
            country: "NZ".to_string(),
            revenue: plan.price(),
        }
    }

    fn roster(n: usize) -> Vec<SubscriberRecord> {
        (0..n)
            .map(|i| {
                let plan = PlanCode::ALL[i % PlanCode::ALL.len()];
                let status = if i % 2 == 0 { Status::Active } else { Status::Expired };
                record(i, &format!("User{i:02}"), plan, status)
            })
            .collect()
    }

    fn open(records: Vec<SubscriberRecord>, fragment: &str) -> Session {
        DashboardSession::open(
            records,
            MemoryUrlStore::new(fragment),
            VirtualScheduler::new(),
            SessionSettings::default(),
        )
    }

    #[test]
    fn default_open_leaves_store_untouched() {
        let session = open(roster(23), "");
        assert!(session.query().is_default());
        assert_eq!(session.store().writes(), 0);
        let view = session.view();
        assert_eq!(view.rows.len(), 10);
        assert_eq!(view.total_pages, 3);
        assert_eq!(view.link, "");
    }

    #[test]
    fn open_clamps_out_of_range_page_and_rewrites_url() {
        let session = open(roster(23), "page=99");
        assert_eq!(session.query().page(), 3);
        assert_eq!(session.store().fragment(), "page=3");
        assert_eq!(session.view().rows.len(), 3);
    }

    #[test]
    fn open_normalizes_noisy_fragment() {
        let session = open(roster(5), "?utm=x&status=Active&page=0#top");
        assert_eq!(session.query().status(), StatusFilter::Only(Status::Active));
        assert_eq!(session.store().fragment(), "status=Active");
    }

    #[test]
    fn filter_change_resets_page_and_updates_url() {
        let mut session = open(roster(40), "page=3");
        assert!(session.set_plan(PlanFilter::Only(PlanCode::Plan1)));
        assert_eq!(session.query().page(), 1);
        assert_eq!(session.store().fragment(), "plan=Plan+1");
        assert!(session.results().iter().all(|r| r.plan.code() == Some(PlanCode::Plan1)));
    }

    #[test]
    fn unchanged_transition_is_a_no_op() {
        let mut session = open(roster(5), "");
        assert!(!session.set_status(StatusFilter::All));
        assert!(!session.go_to_page(1));
        assert_eq!(session.store().writes(), 0);
    }

    #[test]
    fn click_sort_cycles_and_encodes() {
        let mut session = open(roster(5), "");
        session.click_sort(SortField::Name);
        assert_eq!(session.query().sort_direction(), SortDirection::Desc);
        assert_eq!(session.store().fragment(), "sort=name%3Adesc");
        assert_eq!(session.view().rows[0].name, "User04");

        session.click_sort(SortField::Name);
        assert_eq!(session.query().sort_direction(), SortDirection::Unsorted);
        assert_eq!(session.view().rows[0].name, "User00");

        session.click_sort(SortField::Revenue);
        assert_eq!(session.query().sort_field(), SortField::Revenue);
        assert_eq!(session.query().sort_direction(), SortDirection::Asc);
    }

    #[test]
    fn go_to_page_clamps_both_ends() {
        let mut session = open(roster(23), "");
        session.go_to_page(-4);
        assert_eq!(session.query().page(), 1);
        session.go_to_page(500);
        assert_eq!(session.query().page(), 3);
        assert_eq!(session.store().fragment(), "page=3");
    }

    #[test]
    fn typed_search_applies_after_quiet_interval() {
        let mut session = open(roster(30), "page=2");
        session.type_search("user0");
        assert!(session.is_search_pending());
        assert_eq!(session.search_input(), "user0");
        assert_eq!(session.query().search_text(), "");

        session.scheduler_mut().advance(Duration::from_millis(499));
        assert!(!session.tick());

        session.scheduler_mut().advance(Duration::from_millis(1));
        assert!(session.tick());
        assert_eq!(session.query().search_text(), "user0");
        assert_eq!(session.query().page(), 1);
        assert_eq!(session.results().len(), 10);
    }

    #[test]
    fn submit_search_cancels_pending_edit() {
        let mut session = open(roster(30), "");
        session.type_search("user1");
        assert!(session.submit_search("user2"));
        session.scheduler_mut().advance(Duration::from_secs(5));
        assert!(!session.tick());
        assert_eq!(session.query().search_text(), "user2");
    }

    #[test]
    fn reset_clears_url_and_pending_search() {
        let mut session = open(roster(30), "status=Expired&page=2");
        session.type_search("zzz");
        assert!(session.reset());
        assert!(session.query().is_default());
        assert_eq!(session.store().fragment(), "");
        assert!(!session.is_search_pending());
    }

    #[test]
    fn empty_result_keeps_single_page() {
        let mut session = open(roster(12), "");
        session.submit_search("nobody");
        let view = session.view();
        assert!(view.rows.is_empty());
        assert_eq!(view.page, 1);
        assert_eq!(view.total_pages, 1);
        assert_eq!(view.page_links, vec![PageLink::Page(1)]);
    }

    #[test]
    fn stats_cover_all_records_regardless_of_filter() {
        let mut session = open(roster(6), "");
        session.set_status(StatusFilter::Only(Status::Active));
        let summary = session.summary();
        assert_eq!(summary.total_subscribers, 6);
        assert_eq!(summary.active_subscribers, 3);
        let expected: Cents = PlanCode::ALL.iter().map(|p| p.price()).sum();
        assert_eq!(summary.total_revenue, expected);
    }

    struct BrokenStore;

    impl UrlStateStore for BrokenStore {
        fn read(&self) -> anyhow::Result<String> {
            bail!("disk on fire")
        }

        fn write(&mut self, _fragment: &str) -> anyhow::Result<()> {
            bail!("disk on fire")
        }
    }

    #[test]
    fn store_failures_degrade_to_defaults() {
        let mut session = DashboardSession::open(
            roster(15),
            BrokenStore,
            VirtualScheduler::new(),
            SessionSettings::default(),
        );
        assert!(session.query().is_default());
        assert!(session.go_to_page(2));
        assert_eq!(session.view().page, 2);
    }
}
