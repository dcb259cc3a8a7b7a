//! Client-side cache of the todo list.
//!
//! # Design
//! There is exactly one entry, keyed by [`CACHE_KEY`]. `read` is synchronous
//! and never blocks: it returns the current snapshot and, if the entry has
//! never been fetched or has been invalidated, kicks off a fetch in the
//! background.
//!
//! At most one list request is outstanding at a time. The in-flight request
//! is a `Shared` future stored in the entry; `read`, `fetch` and the spawned
//! driver all poll the same future, and whichever poll completes it writes
//! the result back exactly once.
//!
//! The driver is spawned on a Tokio runtime handle captured when the cache is
//! built, so `read` may be called from threads outside the runtime. A fetch
//! only holds a weak reference to the cache until it is first polled.
//!
//! Every invalidation bumps an epoch. A fetch that started under an older
//! epoch still publishes its data when it lands, but the entry stays stale
//! and another fetch is chained immediately.

use std::sync::{Arc, Weak};

use chrono::{DateTime, Utc};
use futures::future::{BoxFuture, FutureExt, Shared};
use parking_lot::Mutex;
use tokio::runtime::Handle;
use tokio::sync::broadcast;
use tracing::{debug, warn};

use crate::clock::Clock;
use crate::error::ApiError;
use crate::store::RemoteStore;
use crate::types::Todo;

/// Label of the single cache entry.
pub const CACHE_KEY: &str = "todos";

const EVENT_CAPACITY: usize = 64;

type FetchResult = Result<Arc<Vec<Todo>>, ApiError>;
type InFlight = Shared<BoxFuture<'static, FetchResult>>;

/// Point-in-time view of the cache entry.
#[derive(Debug, Clone, Default)]
pub struct Snapshot {
    /// Last successfully fetched list. Kept across failed refreshes.
    pub data: Option<Arc<Vec<Todo>>>,
    /// No data yet and the first fetch is in flight.
    pub is_loading: bool,
    /// Any fetch is in flight, including invalidation-driven refreshes.
    pub is_fetching: bool,
    /// Error of the most recent fetch, cleared by the next success.
    pub error: Option<ApiError>,
    /// When `data` was last replaced.
    pub updated_at: Option<DateTime<Utc>>,
}

/// Change notifications published to subscribers.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CacheEvent {
    Invalidated,
    Updated,
    Failed(ApiError),
}

#[derive(Default)]
struct Entry {
    data: Option<Arc<Vec<Todo>>>,
    error: Option<ApiError>,
    updated_at: Option<DateTime<Utc>>,
    completed_once: bool,
    stale: bool,
    epoch: u64,
    in_flight: Option<InFlight>,
}

impl Entry {
    fn needs_fetch(&self) -> bool {
        !self.completed_once || self.stale
    }

    fn snapshot(&self) -> Snapshot {
        Snapshot {
            data: self.data.clone(),
            is_loading: self.data.is_none() && self.in_flight.is_some(),
            is_fetching: self.in_flight.is_some(),
            error: self.error.clone(),
            updated_at: self.updated_at,
        }
    }

    fn settled_result(&self) -> FetchResult {
        match &self.error {
            Some(err) => Err(err.clone()),
            None => Ok(self.data.clone().unwrap_or_default()),
        }
    }
}

struct Inner {
    store: RemoteStore,
    clock: Arc<dyn Clock>,
    entry: Mutex<Entry>,
    events: broadcast::Sender<CacheEvent>,
    runtime: Option<Handle>,
}

/// Shared handle to the todo list cache. Clones refer to the same entry.
#[derive(Clone)]
pub struct QueryCache {
    inner: Arc<Inner>,
}

impl QueryCache {
    /// Build a cache that spawns its fetches on the current Tokio runtime, if
    /// called from inside one.
    pub fn new(store: RemoteStore, clock: Arc<dyn Clock>) -> Self {
        Self::with_runtime(store, clock, Handle::try_current().ok())
    }

    /// Build a cache that spawns its fetches on `runtime`.
    ///
    /// With `None`, fetches started by [`read`](QueryCache::read) wait until
    /// someone awaits [`fetch`](QueryCache::fetch) or
    /// [`settled`](QueryCache::settled).
    pub fn with_runtime(
        store: RemoteStore,
        clock: Arc<dyn Clock>,
        runtime: Option<Handle>,
    ) -> Self {
        let (events, _) = broadcast::channel(EVENT_CAPACITY);
        Self {
            inner: Arc::new(Inner {
                store,
                clock,
                entry: Mutex::new(Entry::default()),
                events,
                runtime,
            }),
        }
    }

    pub fn key(&self) -> &'static str {
        CACHE_KEY
    }

    /// Current snapshot. Starts a background fetch when the entry has never
    /// been fetched or is stale and nothing is in flight yet.
    ///
    /// The fetch is spawned on the runtime captured at construction, so this
    /// works from any thread. Without a runtime it is only registered, and
    /// runs the next time someone awaits [`fetch`] or [`settled`].
    ///
    /// [`fetch`]: QueryCache::fetch
    /// [`settled`]: QueryCache::settled
    pub fn read(&self) -> Snapshot {
        let mut entry = self.inner.entry.lock();
        if entry.in_flight.is_none() && entry.needs_fetch() {
            Inner::begin_fetch(&self.inner, &mut entry);
        }
        entry.snapshot()
    }

    /// Snapshot without side effects.
    pub fn peek(&self) -> Snapshot {
        self.inner.entry.lock().snapshot()
    }

    /// Mark the entry stale and schedule a re-fetch. Stale data keeps being
    /// served until the re-fetch completes.
    pub fn invalidate(&self) {
        let mut entry = self.inner.entry.lock();
        entry.stale = true;
        entry.epoch += 1;
        debug!(key = CACHE_KEY, epoch = entry.epoch, "cache invalidated");
        let _ = self.inner.events.send(CacheEvent::Invalidated);
        if entry.in_flight.is_none() {
            Inner::begin_fetch(&self.inner, &mut entry);
        }
    }

    /// Settled list: joins the in-flight fetch, starts one if the entry is
    /// stale or empty, or returns cached data when it is fresh.
    pub async fn fetch(&self) -> FetchResult {
        loop {
            let pending = {
                let mut entry = self.inner.entry.lock();
                if let Some(pending) = entry.in_flight.clone() {
                    pending
                } else if entry.needs_fetch() {
                    Inner::begin_fetch(&self.inner, &mut entry)
                } else {
                    return entry.settled_result();
                }
            };
            let _ = pending.await;
        }
    }

    /// Invalidate, then wait for the fresh list.
    pub async fn refetch(&self) -> FetchResult {
        self.invalidate();
        self.fetch().await
    }

    /// Wait until no fetch is in flight, including chained ones.
    pub async fn settled(&self) {
        loop {
            let pending = self.inner.entry.lock().in_flight.clone();
            match pending {
                Some(pending) => {
                    let _ = pending.await;
                }
                None => return,
            }
        }
    }

    /// Register for change notifications.
    pub fn subscribe(&self) -> Subscription {
        Subscription {
            rx: self.inner.events.subscribe(),
        }
    }

    pub fn subscriber_count(&self) -> usize {
        self.inner.events.receiver_count()
    }
}

impl Inner {
    /// Register a new in-flight fetch and spawn its driver when a runtime is
    /// available. Caller holds the entry lock and has checked that nothing
    /// is in flight.
    fn begin_fetch(this: &Arc<Inner>, entry: &mut Entry) -> InFlight {
        let epoch = entry.epoch;
        let weak: Weak<Inner> = Arc::downgrade(this);
        let fut = async move {
            let Some(inner) = weak.upgrade() else {
                return Err(ApiError::Transport("query cache dropped".to_string()));
            };
            let result = inner.store.list().await.map(Arc::new);
            inner.finish_fetch(epoch, &result);
            result
        }
        .boxed()
        .shared();

        // No data to go stale, so a retry is a plain load again.
        if entry.data.is_none() {
            entry.error = None;
        }

        debug!(key = CACHE_KEY, epoch, "fetch started");
        entry.in_flight = Some(fut.clone());
        match &this.runtime {
            Some(handle) => {
                handle.spawn(fut.clone());
            }
            None => debug!(key = CACHE_KEY, "no runtime, fetch waits for a poller"),
        }
        fut
    }

    fn finish_fetch(self: &Arc<Self>, epoch: u64, result: &FetchResult) {
        let mut entry = self.entry.lock();
        entry.in_flight = None;
        entry.completed_once = true;

        let event = match result {
            Ok(todos) => {
                entry.data = Some(Arc::clone(todos));
                entry.error = None;
                entry.updated_at = Some(self.clock.now());
                CacheEvent::Updated
            }
            Err(err) => {
                warn!(key = CACHE_KEY, error = %err, "fetch failed, keeping previous data");
                entry.error = Some(err.clone());
                CacheEvent::Failed(err.clone())
            }
        };

        let superseded = entry.epoch != epoch;
        entry.stale = superseded;
        let _ = self.events.send(event);

        if superseded {
            debug!(key = CACHE_KEY, epoch, current = entry.epoch, "fetch superseded by invalidation");
            Inner::begin_fetch(self, &mut entry);
        }
    }
}

/// Live registration for [`CacheEvent`]s. Dropping it unsubscribes.
pub struct Subscription {
    rx: broadcast::Receiver<CacheEvent>,
}

impl Subscription {
    /// Next event. `None` once the cache is gone. A subscriber that fell
    /// behind skips the missed events.
    pub async fn recv(&mut self) -> Option<CacheEvent> {
        loop {
            match self.rx.recv().await {
                Ok(event) => return Some(event),
                Err(broadcast::error::RecvError::Lagged(skipped)) => {
                    debug!(skipped, "cache subscriber lagged");
                }
                Err(broadcast::error::RecvError::Closed) => return None,
            }
        }
    }

    /// Next event if one is already queued.
    pub fn try_recv(&mut self) -> Option<CacheEvent> {
        loop {
            match self.rx.try_recv() {
                Ok(event) => return Some(event),
                Err(broadcast::error::TryRecvError::Lagged(_)) => continue,
                Err(_) => return None,
            }
        }
    }

    pub fn unsubscribe(self) {}
}
