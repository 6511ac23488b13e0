//! Observable refresh state.
//!
//! The coordinator is the only writer of every slot. Presentation code gets a
//! `RefreshObserver` holding read-only receivers.

use std::sync::{Mutex, PoisonError};

use tokio::sync::{broadcast, watch};

use crate::country::Country;

const NOTICE_CAPACITY: usize = 16;

/// Transient user-facing notification about where the list came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Notice {
    /// The list was served from the local store.
    FromCache { count: usize },
    /// The list was fetched from the network and written through.
    FromNetwork { count: usize },
}

/// Write side of the observable slots.
///
/// Publishing stops for good once `close` has been called, so nothing reaches
/// observers after the coordinator is disposed.
#[derive(Debug)]
pub(crate) struct Publisher {
    countries: watch::Sender<Vec<Country>>,
    error: watch::Sender<bool>,
    loading: watch::Sender<bool>,
    notices: broadcast::Sender<Notice>,
    open: Mutex<bool>,
}

impl Publisher {
    pub(crate) fn new() -> Self {
        let (countries, _) = watch::channel(Vec::new());
        let (error, _) = watch::channel(false);
        let (loading, _) = watch::channel(false);
        let (notices, _) = broadcast::channel(NOTICE_CAPACITY);
        Self { countries, error, loading, notices, open: Mutex::new(true) }
    }

    pub(crate) fn observer(&self) -> RefreshObserver {
        RefreshObserver {
            countries: self.countries.subscribe(),
            error: self.error.subscribe(),
            loading: self.loading.subscribe(),
            notices: self.notices.subscribe(),
        }
    }

    fn publish(&self, f: impl FnOnce(&Self)) {
        let open = self.open.lock().unwrap_or_else(PoisonError::into_inner);
        if *open {
            f(self);
        }
    }

    pub(crate) fn start_loading(&self) {
        self.publish(|p| {
            p.loading.send_replace(true);
        });
    }

    /// Publish a list and clear both flags.
    pub(crate) fn show_countries(&self, countries: Vec<Country>) {
        self.publish(|p| {
            p.countries.send_replace(countries);
            p.error.send_replace(false);
            p.loading.send_replace(false);
        });
    }

    /// Flag a fetch failure. The published list is left as it was.
    pub(crate) fn fail(&self) {
        self.publish(|p| {
            p.error.send_replace(true);
            p.loading.send_replace(false);
        });
    }

    pub(crate) fn notify(&self, notice: Notice) {
        self.publish(|p| {
            // no subscribers is fine
            let _ = p.notices.send(notice);
        });
    }

    pub(crate) fn close(&self) {
        *self.open.lock().unwrap_or_else(PoisonError::into_inner) = false;
    }
}

/// Read side of the refresh state, handed to presentation code.
#[derive(Debug)]
pub struct RefreshObserver {
    pub countries: watch::Receiver<Vec<Country>>,
    pub error: watch::Receiver<bool>,
    pub loading: watch::Receiver<bool>,
    pub notices: broadcast::Receiver<Notice>,
}

impl RefreshObserver {
    /// Snapshot of the currently published list.
    pub fn countries(&self) -> Vec<Country> {
        self.countries.borrow().clone()
    }

    pub fn is_error(&self) -> bool {
        *self.error.borrow()
    }

    pub fn is_loading(&self) -> bool {
        *self.loading.borrow()
    }

    /// Wait for the next notice, skipping over any that were missed.
    ///
    /// Returns None once the coordinator is gone.
    pub async fn next_notice(&mut self) -> Option<Notice> {
        loop {
            match self.notices.recv().await {
                Ok(notice) => return Some(notice),
                Err(broadcast::error::RecvError::Lagged(skipped)) => {
                    tracing::debug!(skipped, "notice receiver lagged");
                }
                Err(broadcast::error::RecvError::Closed) => return None,
            }
        }
    }

    /// Drain notices that are already queued without waiting.
    pub fn pending_notices(&mut self) -> Vec<Notice> {
        let mut notices = Vec::new();
        loop {
            match self.notices.try_recv() {
                Ok(notice) => notices.push(notice),
                Err(broadcast::error::TryRecvError::Lagged(_)) => continue,
                Err(_) => return notices,
            }
        }
    }
}
