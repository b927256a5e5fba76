//! Shared request environment and statistics.

use std::fmt;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use serde::Serialize;
use tracing::debug;

use crate::offload::{Offload, TokioOffload};
use crate::transport::Transport;

/// Snapshot of an environment's request counters.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
pub struct Stat {
    /// Requests currently executing.
    pub active_requests: u64,
    /// Requests ever executed.
    pub total_requests: u64,
    /// Executed requests that did not succeed.
    pub failed_requests: u64,
}

/// State shared by every request created against it.
///
/// Holds the transport, the offload capability and the process-wide
/// counters. Requests keep an `Arc` to their environment, so it outlives
/// all of them.
pub struct Environment {
    transport: Arc<dyn Transport>,
    offload: Arc<dyn Offload>,
    active_requests: AtomicU64,
    total_requests: AtomicU64,
    failed_requests: AtomicU64,
}

impl Environment {
    /// Creates an environment that offloads onto the tokio blocking pool.
    #[must_use]
    pub fn new(transport: Arc<dyn Transport>) -> Arc<Self> {
        Self::with_offload(transport, Arc::new(TokioOffload))
    }

    /// Creates an environment with a custom offload capability.
    #[must_use]
    pub fn with_offload(transport: Arc<dyn Transport>, offload: Arc<dyn Offload>) -> Arc<Self> {
        Arc::new(Self {
            transport,
            offload,
            active_requests: AtomicU64::new(0),
            total_requests: AtomicU64::new(0),
            failed_requests: AtomicU64::new(0),
        })
    }

    /// Returns the current counter values.
    #[must_use]
    pub fn stat(&self) -> Stat {
        Stat {
            active_requests: self.active_requests.load(Ordering::Relaxed),
            total_requests: self.total_requests.load(Ordering::Relaxed),
            failed_requests: self.failed_requests.load(Ordering::Relaxed),
        }
    }

    /// Returns the transport requests are opened against.
    #[must_use]
    pub fn transport(&self) -> &dyn Transport {
        self.transport.as_ref()
    }

    pub(crate) fn offload(&self) -> &dyn Offload {
        self.offload.as_ref()
    }

    /// Counts a request as started; it stays active until the guard drops.
    pub(crate) fn begin(&self) -> ActiveRequest<'_> {
        self.total_requests.fetch_add(1, Ordering::Relaxed);
        self.active_requests.fetch_add(1, Ordering::Relaxed);
        ActiveRequest { env: self }
    }

    pub(crate) fn record_failure(&self) {
        self.failed_requests.fetch_add(1, Ordering::Relaxed);
    }
}

impl fmt::Debug for Environment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Environment")
            .field("transport", &self.transport)
            .field("offload", &self.offload)
            .field("stat", &self.stat())
            .finish()
    }
}

impl Drop for Environment {
    fn drop(&mut self) {
        let stat = self.stat();
        debug!(
            total = stat.total_requests,
            failed = stat.failed_requests,
            "SMTP environment destroyed"
        );
    }
}

/// Keeps `active_requests` raised while a request executes.
pub(crate) struct ActiveRequest<'a> {
    env: &'a Environment,
}

impl Drop for ActiveRequest<'_> {
    fn drop(&mut self) {
        self.env.active_requests.fetch_sub(1, Ordering::Relaxed);
    }
}
