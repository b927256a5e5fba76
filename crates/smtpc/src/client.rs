//! One-shot request client.
//!
//! Wraps the build / configure / execute / delete sequence in a single call,
//! the way an embedding host submits one message per invocation.

use std::sync::Arc;

use serde::Serialize;
use tracing::debug;

use crate::config::RequestOptions;
use crate::engine::ExecuteOutcome;
use crate::environment::{Environment, Stat};
use crate::error::Result;
use crate::offload::Offload;
use crate::request::{Built, Request};
use crate::transport::Transport;

/// Status and reason of one submitted message.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Response {
    /// SMTP response code, or `-1` when the transaction failed.
    pub status: i32,
    /// Human-readable outcome.
    pub reason: String,
}

/// Client submitting one message per [`Client::request`] call.
#[derive(Debug, Clone)]
pub struct Client {
    env: Arc<Environment>,
}

impl Client {
    /// Creates a client with its own environment.
    #[must_use]
    pub fn new(transport: Arc<dyn Transport>) -> Self {
        Self {
            env: Environment::new(transport),
        }
    }

    /// Creates a client with a custom offload capability.
    #[must_use]
    pub fn with_offload(transport: Arc<dyn Transport>, offload: Arc<dyn Offload>) -> Self {
        Self {
            env: Environment::with_offload(transport, offload),
        }
    }

    /// Creates a client sharing an existing environment.
    #[must_use]
    pub const fn from_environment(env: Arc<Environment>) -> Self {
        Self { env }
    }

    /// Returns the client's environment.
    #[must_use]
    pub const fn environment(&self) -> &Arc<Environment> {
        &self.env
    }

    /// Returns the environment's request counters.
    #[must_use]
    pub fn stat(&self) -> Stat {
        self.env.stat()
    }

    /// Submits one message and returns its status and reason.
    ///
    /// Recoverable transport failures are reported through the response
    /// (`status == -1`), not as errors.
    ///
    /// # Errors
    ///
    /// Returns an error if building or configuring the request fails, or if
    /// execution ends fatally.
    pub async fn request<I, R>(
        &self,
        url: &str,
        from: &str,
        recipients: I,
        body: Option<&[u8]>,
        options: &RequestOptions,
    ) -> Result<Response>
    where
        I: IntoIterator<Item = R>,
        R: Into<String>,
    {
        let mut request = Request::new(&self.env, url, from)?;
        if let Err(err) = configure(&mut request, recipients, body, options) {
            request.delete().await;
            return Err(err);
        }

        let completed = match request.execute(options.effective_timeout()).await {
            ExecuteOutcome::Completed(request) | ExecuteOutcome::Failed(request) => request,
            ExecuteOutcome::Fatal(err) => return Err(err),
        };
        let response = Response {
            status: completed.status(),
            reason: completed.reason().to_string(),
        };
        completed.delete().await;
        debug!(status = response.status, "SMTP message submitted");
        Ok(response)
    }
}

fn configure<I, R>(
    request: &mut Request<Built>,
    recipients: I,
    body: Option<&[u8]>,
    options: &RequestOptions,
) -> Result<()>
where
    I: IntoIterator<Item = R>,
    R: Into<String>,
{
    for recipient in recipients {
        request.add_recipient(recipient)?;
    }
    if let Some(body) = body {
        request.set_body(body)?;
    }
    options.apply(request)
}
