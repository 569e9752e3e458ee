//! Polling query: fetch once, then keep re-fetching on an interval.

use crate::api::RemoteApi;
use crate::error::Result;
use crate::service::DashboardService;
use futures::future::BoxFuture;
use futures::FutureExt;
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio::time::{Instant, MissedTickBehavior};

/// Default time between two polls.
pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_secs(30);

/// Shortest time between two polls; smaller intervals are raised to it.
pub const MIN_POLL_INTERVAL: Duration = Duration::from_secs(1);

/// How a [`Poller`] re-fetches after the initial load.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct PollOptions {
    /// Keep polling after the initial fetch.
    pub auto_refresh: bool,
    pub interval: Duration,
}

impl Default for PollOptions {
    fn default() -> Self {
        PollOptions {
            auto_refresh: true,
            interval: DEFAULT_POLL_INTERVAL,
        }
    }
}

impl PollOptions {
    pub fn with_auto_refresh(mut self, auto_refresh: bool) -> Self {
        self.auto_refresh = auto_refresh;
        self
    }

    pub fn with_interval(mut self, interval: Duration) -> Self {
        self.interval = interval;
        self
    }

    /// The interval actually waited between polls, never below
    /// [`MIN_POLL_INTERVAL`].
    pub fn period(&self) -> Duration {
        self.interval.max(MIN_POLL_INTERVAL)
    }
}

/// What a polled query looks like to its consumer.
///
/// A failed poll keeps the last good `data` and only sets `error`.
#[derive(Clone, Debug, PartialEq)]
pub struct QueryState<T> {
    pub data: Option<T>,
    pub loading: bool,
    pub error: Option<String>,
}

impl<T> Default for QueryState<T> {
    fn default() -> Self {
        QueryState {
            data: None,
            loading: false,
            error: None,
        }
    }
}

type Loader<T> = Arc<dyn Fn() -> BoxFuture<'static, Result<T>> + Send + Sync>;

/// Background query bound to a [`DashboardService`].
///
/// The first fetch fires as soon as the poller starts. With
/// `auto_refresh` the query is then repeated every `interval`; reads still
/// go through the service cache, so a poll inside the cache duration costs
/// no request. [`Poller::refetch`] clears the cache first and always hits the
/// network.
///
/// The polling task belongs to the poller: [`Poller::stop`] or dropping the
/// poller aborts it, and no request is issued after that.
///
/// # Example
///
/// ```no_run
/// use exam_dashboard_kit::{ClientConfig, DashboardService, SessionStorage};
/// use exam_dashboard_kit::hooks::{PollOptions, Poller};
///
/// # async fn run() -> exam_dashboard_kit::Result<()> {
/// let service = DashboardService::connect(&ClientConfig::default(), SessionStorage::new())?;
///
/// let poller = Poller::start(service, PollOptions::default(), |service| async move {
///     service.get_stats("org1").await
/// });
///
/// let mut updates = poller.subscribe();
/// while updates.changed().await.is_ok() {
///     let state = updates.borrow().clone();
///     if let Some(stats) = state.data {
///         println!("{} exams", stats.total_exams);
///     }
/// }
/// # Ok(())
/// # }
/// ```
pub struct Poller<T> {
    state: Arc<watch::Sender<QueryState<T>>>,
    load: Loader<T>,
    clear_cache: Box<dyn Fn() + Send + Sync>,
    task: JoinHandle<()>,
}

impl<T> Poller<T>
where
    T: Clone + Send + Sync + 'static,
{
    /// Spawn the polling task on the current tokio runtime.
    ///
    /// `fetch` is handed a clone of `service` on every poll.
    pub fn start<A, F, Fut>(service: DashboardService<A>, options: PollOptions, fetch: F) -> Self
    where
        A: RemoteApi + 'static,
        F: Fn(DashboardService<A>) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<T>> + Send + 'static,
    {
        let (sender, _) = watch::channel(QueryState {
            data: None,
            loading: true,
            error: None,
        });
        let state = Arc::new(sender);

        let clear_service = service.clone();
        let clear_cache = Box::new(move || clear_service.clear_cache());
        let load: Loader<T> = Arc::new(move || fetch(service.clone()).boxed());

        let task = tokio::spawn(poll(Arc::clone(&state), Arc::clone(&load), options));

        Poller {
            state,
            load,
            clear_cache,
            task,
        }
    }

    /// Snapshot of the current state.
    pub fn state(&self) -> QueryState<T> {
        self.state.borrow().clone()
    }

    /// Receiver notified on every state change.
    pub fn subscribe(&self) -> watch::Receiver<QueryState<T>> {
        self.state.subscribe()
    }

    /// Clear the service cache and fetch again, outside the polling schedule.
    pub async fn refetch(&self) -> QueryState<T> {
        (self.clear_cache)();
        refresh(&self.state, (self.load)()).await;
        self.state()
    }

    /// Stop polling. Idempotent.
    pub fn stop(&self) {
        if !self.task.is_finished() {
            debug!("Stopping poller");
        }
        self.task.abort();
    }

    /// `false` once stopped, or after the initial fetch when auto-refresh is off.
    pub fn is_running(&self) -> bool {
        !self.task.is_finished()
    }
}

impl<T> Drop for Poller<T> {
    fn drop(&mut self) {
        self.task.abort();
    }
}

async fn poll<T>(state: Arc<watch::Sender<QueryState<T>>>, load: Loader<T>, options: PollOptions) {
    refresh(&state, load()).await;
    if !options.auto_refresh {
        return;
    }

    let period = options.period();
    if period != options.interval {
        warn!("Poll interval {:?} raised to {:?}", options.interval, period);
    }
    let mut ticker = tokio::time::interval_at(Instant::now() + period, period);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

    loop {
        ticker.tick().await;
        refresh(&state, load()).await;
    }
}

async fn refresh<T>(state: &watch::Sender<QueryState<T>>, load: BoxFuture<'static, Result<T>>) {
    state.send_modify(|current| current.loading = true);

    match load.await {
        Ok(data) => state.send_modify(|current| {
            current.data = Some(data);
            current.loading = false;
            current.error = None;
        }),
        Err(e) => {
            debug!("Poll failed: {}", e);
            state.send_modify(|current| {
                current.loading = false;
                current.error = Some(e.to_string());
            });
        }
    }
}
