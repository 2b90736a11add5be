//! Debounced search coordinator and the schedulers that drive it.
//!
//! Everything runs on one logical event queue. A [`Scheduler`] holds delayed
//! actions; the owner drains them with [`Scheduler::due`] and handles each one
//! to completion before taking the next event. Cancelling a handle removes
//! its action, so a cancelled timer can never fire, and draining removes
//! fired actions, so no timer fires twice.

use std::collections::BTreeMap;
use std::time::{Duration, Instant};
use tracing::trace;

/// Quiet interval before a search value is committed.
pub const DEFAULT_QUIET: Duration = Duration::from_millis(500);

/// Identifies one scheduled action.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct TimerHandle(u64);

/// A queue of delayed actions.
pub trait Scheduler<A> {
    /// Schedule `action` to become due after `delay`.
    fn after(&mut self, delay: Duration, action: A) -> TimerHandle;

    /// Cancel a pending action. Returns false if it already fired or was
    /// already cancelled.
    fn cancel(&mut self, handle: TimerHandle) -> bool;

    /// Remove and return every action whose deadline has passed, ordered by
    /// deadline and then by scheduling order.
    fn due(&mut self) -> Vec<A>;

    /// Number of actions still pending.
    fn pending(&self) -> usize;
}

/// Deadline-ordered storage shared by the scheduler implementations.
#[derive(Debug)]
struct TimerQueue<A> {
    next_id: u64,
    by_deadline: BTreeMap<(Duration, u64), A>,
    deadlines: BTreeMap<u64, Duration>,
}

impl<A> Default for TimerQueue<A> {
    fn default() -> Self {
        Self {
            next_id: 0,
            by_deadline: BTreeMap::new(),
            deadlines: BTreeMap::new(),
        }
    }
}

impl<A> TimerQueue<A> {
    fn insert(&mut self, deadline: Duration, action: A) -> TimerHandle {
        let id = self.next_id;
        self.next_id += 1;
        self.by_deadline.insert((deadline, id), action);
        self.deadlines.insert(id, deadline);
        TimerHandle(id)
    }

    fn remove(&mut self, handle: TimerHandle) -> bool {
        self.deadlines
            .remove(&handle.0)
            .and_then(|deadline| self.by_deadline.remove(&(deadline, handle.0)))
            .is_some()
    }

    fn drain_until(&mut self, now: Duration) -> Vec<A> {
        let later = self.by_deadline.split_off(&(now, u64::MAX));
        let fired = std::mem::replace(&mut self.by_deadline, later);
        fired
            .into_iter()
            .map(|((_, id), action)| {
                self.deadlines.remove(&id);
                action
            })
            .collect()
    }

    fn len(&self) -> usize {
        self.by_deadline.len()
    }
}

/// Deterministic scheduler on a virtual clock that only moves when told to.
#[derive(Debug)]
pub struct VirtualScheduler<A> {
    now: Duration,
    queue: TimerQueue<A>,
}

impl<A> Default for VirtualScheduler<A> {
    fn default() -> Self {
        Self {
            now: Duration::ZERO,
            queue: TimerQueue::default(),
        }
    }
}

impl<A> VirtualScheduler<A> {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Current virtual time since creation.
    #[must_use]
    pub const fn now(&self) -> Duration {
        self.now
    }

    /// Move the virtual clock forward.
    pub fn advance(&mut self, by: Duration) {
        self.now = self.now.saturating_add(by);
    }
}

impl<A> Scheduler<A> for VirtualScheduler<A> {
    fn after(&mut self, delay: Duration, action: A) -> TimerHandle {
        self.queue.insert(self.now.saturating_add(delay), action)
    }

    fn cancel(&mut self, handle: TimerHandle) -> bool {
        self.queue.remove(handle)
    }

    fn due(&mut self) -> Vec<A> {
        self.queue.drain_until(self.now)
    }

    fn pending(&self) -> usize {
        self.queue.len()
    }
}

/// Scheduler on the monotonic wall clock, for interactive front ends that
/// poll [`Scheduler::due`] from their event loop.
#[derive(Debug)]
pub struct WallScheduler<A> {
    origin: Instant,
    queue: TimerQueue<A>,
}

impl<A> Default for WallScheduler<A> {
    fn default() -> Self {
        Self {
            origin: Instant::now(),
            queue: TimerQueue::default(),
        }
    }
}

impl<A> WallScheduler<A> {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

impl<A> Scheduler<A> for WallScheduler<A> {
    fn after(&mut self, delay: Duration, action: A) -> TimerHandle {
        let deadline = self.origin.elapsed().saturating_add(delay);
        self.queue.insert(deadline, action)
    }

    fn cancel(&mut self, handle: TimerHandle) -> bool {
        self.queue.remove(handle)
    }

    fn due(&mut self) -> Vec<A> {
        self.queue.drain_until(self.origin.elapsed())
    }

    fn pending(&self) -> usize {
        self.queue.len()
    }
}

/// The delayed action the debouncer schedules.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SearchCommit {
    generation: u64,
}

/// Turns a burst of search-box edits into committed search values.
///
/// Each edit cancels the pending timer and starts a new one. A value is
/// committed only once no edit has arrived for the quiet interval; the latest
/// value at that moment always wins.
#[derive(Debug)]
pub struct SearchDebouncer<S> {
    scheduler: S,
    quiet: Duration,
    pending: Option<(TimerHandle, u64)>,
    generation: u64,
    latest: String,
}

impl<S: Scheduler<SearchCommit>> SearchDebouncer<S> {
    #[must_use]
    pub fn new(scheduler: S, quiet: Duration) -> Self {
        Self {
            scheduler,
            quiet,
            pending: None,
            generation: 0,
            latest: String::new(),
        }
    }

    /// Record a raw edit of the search box.
    pub fn input(&mut self, text: impl Into<String>) {
        self.cancel();
        self.latest = text.into();
        self.generation += 1;
        let handle = self.scheduler.after(
            self.quiet,
            SearchCommit {
                generation: self.generation,
            },
        );
        trace!(generation = self.generation, "search debounce armed");
        self.pending = Some((handle, self.generation));
    }

    /// Drop any pending commit. Safe to call when nothing is pending.
    pub fn cancel(&mut self) {
        if let Some((handle, generation)) = self.pending.take() {
            let cancelled = self.scheduler.cancel(handle);
            trace!(generation, cancelled, "search debounce cancelled");
        }
    }

    /// Drain due timers and return the committed value, if any.
    pub fn poll(&mut self) -> Option<String> {
        let fired = self.scheduler.due();
        let live = self.pending.map(|(_, generation)| generation);
        if fired.iter().any(|commit| Some(commit.generation) == live) {
            self.pending = None;
            return Some(self.latest.clone());
        }
        None
    }

    /// Commit the latest value now, cancelling the timer (e.g. on Enter).
    pub fn flush(&mut self) -> Option<String> {
        self.pending.is_some().then(|| {
            self.cancel();
            self.latest.clone()
        })
    }

    #[must_use]
    pub const fn is_pending(&self) -> bool {
        self.pending.is_some()
    }

    /// Most recent raw input, committed or not.
    #[must_use]
    pub fn latest(&self) -> &str {
        &self.latest
    }

    #[must_use]
    pub const fn quiet(&self) -> Duration {
        self.quiet
    }

    #[must_use]
    pub const fn scheduler(&self) -> &S {
        &self.scheduler
    }

    pub const fn scheduler_mut(&mut self) -> &mut S {
        &mut self.scheduler
    }
}
