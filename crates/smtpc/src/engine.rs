//! Request execution and outcome classification.

use std::borrow::Cow;
use std::sync::Arc;
use std::time::Duration;

use tracing::{debug, error};

use crate::classify::Classification;
use crate::environment::Environment;
use crate::error::{Error, Result};
use crate::offload;
use crate::request::{Built, Completed, Request, STATUS_FAILED};
use crate::transport::ErrorBuffer;
use crate::types::TransportCode;

/// Default transaction timeout: one year, effectively unbounded.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(365 * 24 * 3600);

/// `EINVAL`, reported when the transport recorded no OS error.
const EINVAL: i32 = 22;

/// Result of [`Request::execute`].
///
/// Only [`ExecuteOutcome::Fatal`] means the request no longer exists; both
/// other variants hand it back for inspection and [`Request::delete`].
#[derive(Debug)]
pub enum ExecuteOutcome {
    /// The server accepted the transaction.
    Completed(Request<Completed>),
    /// A recoverable failure; status is `-1` and reason describes it.
    Failed(Request<Completed>),
    /// The transport is in an unrecoverable state; the request was torn
    /// down by the engine.
    Fatal(Error),
}

impl ExecuteOutcome {
    /// Returns true if the transaction succeeded.
    #[must_use]
    pub const fn is_completed(&self) -> bool {
        matches!(self, Self::Completed(_))
    }

    /// Returns the surviving request, if any.
    #[must_use]
    pub const fn request(&self) -> Option<&Request<Completed>> {
        match self {
            Self::Completed(request) | Self::Failed(request) => Some(request),
            Self::Fatal(_) => None,
        }
    }

    /// Converts into the surviving request, or the fatal error.
    ///
    /// # Errors
    ///
    /// Returns the error carried by [`ExecuteOutcome::Fatal`].
    pub fn into_request(self) -> Result<Request<Completed>> {
        match self {
            Self::Completed(request) | Self::Failed(request) => Ok(request),
            Self::Fatal(err) => Err(err),
        }
    }
}

impl Request<Built> {
    /// Performs the transaction on a blocking worker and classifies it.
    ///
    /// The calling task is suspended while the transport runs; other tasks
    /// on the runtime keep going. `timeout` is forwarded to the transport in
    /// whole seconds.
    pub async fn execute(self, timeout: Duration) -> ExecuteOutcome {
        let env = Arc::clone(self.environment());
        let active = env.begin();
        debug!(
            recipients = self.recipients().len(),
            timeout_secs = timeout.as_secs(),
            "executing SMTP request"
        );

        let joined = offload::run(env.offload(), move || {
            let mut request = self;
            let mut errors = ErrorBuffer::new();
            let code = request.perform(timeout, &mut errors);
            (request, code, errors)
        })
        .await;
        drop(active);

        match joined {
            Ok((request, code, errors)) => classify(&env, request, code, &errors).await,
            Err(err) => {
                env.record_failure();
                error!(error = %err, "SMTP request worker failed");
                ExecuteOutcome::Fatal(err)
            }
        }
    }
}

async fn classify(
    env: &Environment,
    request: Request<Built>,
    code: TransportCode,
    errors: &ErrorBuffer,
) -> ExecuteOutcome {
    let class = Classification::of(code);
    if class.is_failure() {
        env.record_failure();
    }

    match class {
        Classification::Success => {
            let response = request.session().map_or(0, |s| s.response_code());
            let status = i32::try_from(response).unwrap_or(i32::MAX);
            debug!(status, "SMTP request completed");
            ExecuteOutcome::Completed(request.complete(code, status, Cow::Borrowed("Ok")))
        }
        Classification::Certificate
        | Classification::Timeout
        | Classification::NoResponse
        | Classification::Connectivity => {
            let reason = describe(env, code);
            debug!(%code, %reason, "SMTP request failed");
            ExecuteOutcome::Failed(request.complete(code, STATUS_FAILED, reason))
        }
        Classification::Submission => {
            let detail = errors.text();
            let detail = if detail.is_empty() {
                describe(env, code).into_owned()
            } else {
                detail
            };
            let reason = format!("SMTP error: {detail}");
            debug!(%code, %reason, "SMTP submission rejected");
            ExecuteOutcome::Failed(request.complete(code, STATUS_FAILED, Cow::Owned(reason)))
        }
        Classification::OutOfMemory => {
            error!(%code, "SMTP transport internal memory issue");
            request.delete().await;
            ExecuteOutcome::Fatal(Error::OutOfMemory)
        }
        Classification::Unknown => {
            let os_errno = match request.session().map_or(0, |s| s.os_errno()) {
                0 => EINVAL,
                errno => errno,
            };
            error!(%code, os_errno, "SMTP transport internal issue");
            request.delete().await;
            ExecuteOutcome::Fatal(Error::Unknown { code, os_errno })
        }
    }
}

/// Transport description of `code`, never empty.
fn describe(env: &Environment, code: TransportCode) -> Cow<'static, str> {
    let reason = env.transport().describe(code);
    if reason.is_empty() {
        Cow::Owned(format!("Transport error {code}"))
    } else {
        reason
    }
}
