//! Running blocking work without stalling the caller's task.
//!
//! The transport's perform and teardown calls block the calling thread.
//! An [`Offload`] moves such a job onto a worker so that other tasks on the
//! caller's runtime keep making progress while it runs.

use std::fmt;
use std::future::Future;
use std::pin::Pin;

use tokio::sync::oneshot;

use crate::error::{Error, Result};

/// A blocking job handed to an [`Offload`].
pub type Job = Box<dyn FnOnce() + Send + 'static>;

/// Future returned by [`Offload::spawn`].
pub type JobHandle = Pin<Box<dyn Future<Output = Result<()>> + Send + 'static>>;

/// Capability to run a blocking job off the caller's concurrency domain.
pub trait Offload: Send + Sync + fmt::Debug {
    /// Starts `job` on a worker; the returned future resolves when it ends.
    ///
    /// The job must start without the handle being polled: dropping the
    /// handle detaches the job rather than cancelling it.
    fn spawn(&self, job: Job) -> JobHandle;
}

/// Offload onto the tokio blocking thread pool.
#[derive(Debug, Clone, Copy, Default)]
pub struct TokioOffload;

impl Offload for TokioOffload {
    fn spawn(&self, job: Job) -> JobHandle {
        let handle = tokio::task::spawn_blocking(job);
        Box::pin(async move {
            handle
                .await
                .map_err(|e| Error::Worker(e.to_string()))
        })
    }
}

/// Runs `f` through `offload` and returns its value.
pub(crate) async fn run<T, F>(offload: &dyn Offload, f: F) -> Result<T>
where
    F: FnOnce() -> T + Send + 'static,
    T: Send + 'static,
{
    let (tx, rx) = oneshot::channel();
    offload
        .spawn(Box::new(move || {
            // Receiver only disappears if the caller's task was dropped.
            let _ = tx.send(f());
        }))
        .await?;
    rx.await
        .map_err(|_| Error::Worker("blocking job ended without a result".into()))
}
