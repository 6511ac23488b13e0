//! Refresh-or-cache decision and the fetch/store pipeline.
//!
//! ### Decision
//! - Last refresh missing or zero → network.
//! - `0 < now - last < threshold` → local store.
//! - Anything else, including a timestamp from the future → network.
//!
//! ### Network path
//! Sets `loading`, fetches once, then replaces the stored rows, assigns the
//! returned ids positionally, publishes, and only then stores the new refresh
//! timestamp. A failed fetch raises `error` and leaves the store and the
//! published list untouched. A failed write-through clears the timestamp so
//! the next refresh goes back to the network.
//!
//! ### Task tracking
//! Every background task lives in a `JoinSet` and watches a shutdown signal.
//! The write-through itself runs on a separate task that is never aborted:
//! `dispose` cancels the fetch side, then waits for any write in progress to
//! reach its timestamp. The publisher is closed first, so nothing reaches
//! observers once `dispose` returns.

use std::future::Future;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, PoisonError};
use std::time::Duration;

use tokio::sync::{oneshot, watch};
use tokio::task::{JoinError, JoinSet};

use super::state::{Notice, Publisher, RefreshObserver};
use crate::Error;
use crate::clock::Clock;
use crate::country::Country;
use crate::source::CountrySource;
use crate::store::{CountryStore, PreferenceStore};

/// Default staleness threshold: 10 minutes.
pub const DEFAULT_REFRESH_THRESHOLD: Duration = Duration::from_secs(10 * 60);

/// Which branch a refresh request took.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RefreshPath {
    Cache,
    Network,
}

/// Whether a cache stamped at `last_refresh` is still fresh at `now`.
pub fn is_cache_fresh(last_refresh: Option<i64>, now: i64, threshold_nanos: i64) -> bool {
    match last_refresh {
        Some(last) if last != 0 => {
            let elapsed = now.saturating_sub(last);
            elapsed > 0 && elapsed < threshold_nanos
        }
        _ => false,
    }
}

struct Shared {
    source: Arc<dyn CountrySource>,
    store: Arc<dyn CountryStore>,
    prefs: Arc<dyn PreferenceStore>,
    clock: Arc<dyn Clock>,
    publisher: Publisher,
    writes: Mutex<JoinSet<()>>,
}

impl Shared {
    async fn load_from_store(self: Arc<Self>) -> Result<(), Error> {
        let countries = self.store.get_all_countries().await?;
        let count = countries.len();
        tracing::debug!(count, "loaded countries from store");

        self.publisher.show_countries(countries);
        self.publisher.notify(Notice::FromCache { count });
        Ok(())
    }

    async fn fetch_and_store(self: Arc<Self>) -> Result<(), Error> {
        let countries = match self.source.fetch_countries().await {
            Ok(countries) => countries,
            Err(e) => {
                tracing::error!(error = %e, "country fetch failed");
                self.publisher.fail();
                return Ok(());
            }
        };

        let count = countries.len();
        self.spawn_write(countries).await?;
        self.publisher.notify(Notice::FromNetwork { count });
        Ok(())
    }

    /// Run the write-through on its own task and wait for its result.
    ///
    /// Aborting the caller leaves the write running to completion.
    async fn spawn_write(self: &Arc<Self>, countries: Vec<Country>) -> Result<(), Error> {
        let (done, result) = oneshot::channel();
        let shared = Arc::clone(self);
        {
            let mut writes = self.lock_writes();
            while writes.try_join_next().is_some() {}
            writes.spawn(async move {
                let _ = done.send(shared.write_through(countries).await);
            });
        }

        result
            .await
            .map_err(|_| Error::TaskFailed("write-through ended without a result".into()))?
    }

    async fn write_through(&self, countries: Vec<Country>) -> Result<(), Error> {
        let result = self.replace_and_stamp(countries).await;
        if result.is_err() {
            // old rows may already be gone
            if let Err(e) = self.prefs.save_time(0).await {
                tracing::error!(error = %e, "failed to clear refresh timestamp");
            }
        }
        result
    }

    async fn replace_and_stamp(&self, mut countries: Vec<Country>) -> Result<(), Error> {
        let (deleted, ids) = self.store.replace_all(&countries).await?;

        if ids.len() != countries.len() {
            return Err(Error::IdentifierMismatch { expected: countries.len(), actual: ids.len() });
        }
        for (country, id) in countries.iter_mut().zip(ids) {
            country.uuid = Some(id);
        }
        tracing::debug!(deleted, inserted = countries.len(), "replaced cached countries");

        self.publisher.show_countries(countries);
        self.prefs.save_time(self.clock.now_nanos()).await?;
        Ok(())
    }

    fn lock_writes(&self) -> std::sync::MutexGuard<'_, JoinSet<()>> {
        self.writes.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

/// Decides between the local store and the network and publishes the result.
///
/// Collaborators are injected. The coordinator is the single writer of the
/// observable state returned by [`RefreshCoordinator::subscribe`].
pub struct RefreshCoordinator {
    shared: Arc<Shared>,
    threshold_nanos: i64,
    tasks: Mutex<JoinSet<Result<(), Error>>>,
    unhandled: Mutex<Option<Error>>,
    shutdown: watch::Sender<bool>,
    disposed: AtomicBool,
}

impl RefreshCoordinator {
    /// Create a coordinator around its collaborators.
    pub fn new(
        source: Arc<dyn CountrySource>, store: Arc<dyn CountryStore>, prefs: Arc<dyn PreferenceStore>,
        clock: Arc<dyn Clock>, threshold: Duration,
    ) -> Self {
        let threshold_nanos = i64::try_from(threshold.as_nanos()).unwrap_or(i64::MAX);
        let (shutdown, _) = watch::channel(false);

        Self {
            shared: Arc::new(Shared {
                source,
                store,
                prefs,
                clock,
                publisher: Publisher::new(),
                writes: Mutex::new(JoinSet::new()),
            }),
            threshold_nanos,
            tasks: Mutex::new(JoinSet::new()),
            unhandled: Mutex::new(None),
            shutdown,
            disposed: AtomicBool::new(false),
        }
    }

    /// Read-only handles to the published state.
    pub fn subscribe(&self) -> RefreshObserver {
        self.shared.publisher.observer()
    }

    pub fn is_disposed(&self) -> bool {
        self.disposed.load(Ordering::Acquire)
    }

    /// Serve the cached list if it is fresh, otherwise fetch from the network.
    ///
    /// Returns once the work has been started; use [`wait_idle`](Self::wait_idle)
    /// to wait for it. A failure to read the refresh timestamp is returned here.
    pub async fn refresh(&self) -> Result<RefreshPath, Error> {
        self.ensure_active()?;

        let last_refresh = self.shared.prefs.get_time().await?;
        let now = self.shared.clock.now_nanos();

        if is_cache_fresh(last_refresh, now, self.threshold_nanos) {
            tracing::info!(last_refresh, now, "country cache is fresh, reading from store");
            self.spawn_tracked(Arc::clone(&self.shared).load_from_store());
            Ok(RefreshPath::Cache)
        } else {
            tracing::info!(last_refresh, now, "country cache is stale, fetching from network");
            Ok(self.start_network())
        }
    }

    /// Fetch from the network regardless of cache age.
    pub async fn force_refresh(&self) -> Result<RefreshPath, Error> {
        self.ensure_active()?;
        tracing::info!("forced refresh, fetching from network");
        Ok(self.start_network())
    }

    fn start_network(&self) -> RefreshPath {
        self.shared.publisher.start_loading();
        self.spawn_tracked(Arc::clone(&self.shared).fetch_and_store());
        RefreshPath::Network
    }

    /// Wait for every outstanding task.
    ///
    /// Returns the first error that a background task could not handle itself,
    /// such as a store failure. Fetch failures are reported through the error
    /// flag instead and never show up here.
    pub async fn wait_idle(&self) -> Result<(), Error> {
        loop {
            let mut tasks = std::mem::take(&mut *self.lock_tasks());
            if tasks.is_empty() {
                break;
            }
            while let Some(joined) = tasks.join_next().await {
                self.record(joined);
            }
        }

        match self.unhandled.lock().unwrap_or_else(PoisonError::into_inner).take() {
            Some(e) => Err(e),
            None => Ok(()),
        }
    }

    /// Cancel outstanding work and stop publishing.
    ///
    /// After this returns no observer sees another update. Calling it again
    /// is a no-op.
    pub async fn dispose(&self) {
        if self.disposed.swap(true, Ordering::AcqRel) {
            return;
        }

        self.shared.publisher.close();
        self.shutdown.send_replace(true);

        let mut tasks = std::mem::take(&mut *self.lock_tasks());
        tasks.abort_all();
        let mut cancelled = 0usize;
        while tasks.join_next().await.is_some() {
            cancelled += 1;
        }

        let mut writes = std::mem::take(&mut *self.shared.lock_writes());
        let mut finished_writes = 0usize;
        while writes.join_next().await.is_some() {
            finished_writes += 1;
        }
        tracing::debug!(cancelled, finished_writes, "refresh coordinator disposed");
    }

    fn ensure_active(&self) -> Result<(), Error> {
        if self.is_disposed() { Err(Error::Disposed) } else { Ok(()) }
    }

    fn lock_tasks(&self) -> std::sync::MutexGuard<'_, JoinSet<Result<(), Error>>> {
        self.tasks.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn spawn_tracked<F>(&self, work: F)
    where
        F: Future<Output = Result<(), Error>> + Send + 'static,
    {
        let shutdown = self.shutdown.subscribe();
        let mut tasks = self.lock_tasks();

        while let Some(joined) = tasks.try_join_next() {
            self.record(joined);
        }

        tasks.spawn(async move {
            tokio::select! {
                biased;
                _ = stopped(shutdown) => Ok(()),
                result = work => result,
            }
        });
    }

    fn record(&self, joined: Result<Result<(), Error>, JoinError>) {
        let err = match joined {
            Ok(Ok(())) => return,
            Ok(Err(e)) => e,
            Err(e) if e.is_cancelled() => return,
            Err(e) => Error::TaskFailed(e.to_string()),
        };

        tracing::error!(error = %err, "refresh task failed");
        let mut slot = self.unhandled.lock().unwrap_or_else(PoisonError::into_inner);
        if slot.is_none() {
            *slot = Some(err);
        }
    }
}

async fn stopped(mut shutdown: watch::Receiver<bool>) {
    // a dropped sender also means stop
    let _ = shutdown.wait_for(|stop| *stop).await;
}

impl Drop for RefreshCoordinator {
    fn drop(&mut self) {
        self.shared.publisher.close();
        self.shutdown.send_replace(true);
    }
}
