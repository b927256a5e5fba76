//! SMTP request with type-state lifecycle.
//!
//! ```text
//! ┌───────────────┐  execute()  ┌───────────────────┐
//! │ Request<Built> │ ──────────→ │ Request<Completed> │ ── delete()
//! └───────────────┘      │      └───────────────────┘
//!        │               └──→ Fatal (request already torn down)
//!        └─── delete()
//! ```
//!
//! A request owns its transport session. The session is torn down exactly
//! once, always on an offload worker: by [`Request::delete`], by the engine
//! itself when execution ends in
//! [`ExecuteOutcome::Fatal`](crate::ExecuteOutcome::Fatal), or by `Drop` when
//! a request is abandoned. Only a drop outside any tokio runtime tears the
//! session down inline.

use std::borrow::Cow;
use std::fmt;
use std::mem;
use std::sync::Arc;
use std::time::Duration;

use tracing::{debug, warn};

use crate::body::Body;
use crate::environment::Environment;
use crate::error::{Error, Result};
use crate::offload;
use crate::transport::{ErrorBuffer, Session, SessionOption, Submission};
use crate::types::{ReplyCode, TransportCode, UseSsl};

/// Status reported when the transaction failed below the SMTP layer.
pub const STATUS_FAILED: i32 = -1;

/// Type-state marker for a request still being configured.
#[derive(Debug)]
pub struct Built;

/// Type-state for an executed request, carrying its result.
#[derive(Debug)]
pub struct Completed {
    code: TransportCode,
    status: i32,
    reason: Cow<'static, str>,
}

/// One mail-submission transaction.
pub struct Request<State = Built> {
    env: Arc<Environment>,
    /// `None` once torn down.
    session: Option<Box<dyn Session>>,
    recipients: Vec<String>,
    body: Option<Body>,
    state: State,
}

impl Request<Built> {
    /// Opens a transport session and configures target URL and sender.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Alloc`] if the session cannot be created, or a
    /// configuration error if the transport rejects `url` or `from`.
    pub fn new(env: &Arc<Environment>, url: &str, from: &str) -> Result<Self> {
        let session = env.transport().open()?;
        let mut request = Self {
            env: Arc::clone(env),
            session: Some(session),
            recipients: Vec::new(),
            body: None,
            state: Built,
        };
        request.set_option(SessionOption::Url(url))?;
        request.set_option(SessionOption::MailFrom(from))?;
        debug!(url, from, "SMTP request created");
        Ok(request)
    }

    /// Appends an envelope recipient. Order is kept and duplicates allowed.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Alloc`] if the list cannot grow, or
    /// [`Error::Config`] if the recipient contains a NUL byte.
    pub fn add_recipient(&mut self, recipient: impl Into<String>) -> Result<()> {
        let recipient = recipient.into();
        if recipient.contains('\0') {
            return Err(Error::Config("recipient contains a NUL byte".into()));
        }
        self.recipients
            .try_reserve(1)
            .map_err(|_| Error::Alloc("recipient list"))?;
        self.recipients.push(recipient);
        Ok(())
    }

    /// Copies `body` into the request. An empty slice leaves the request
    /// without a body.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Alloc`] if the body buffer cannot be allocated.
    pub fn set_body(&mut self, body: &[u8]) -> Result<()> {
        if body.is_empty() {
            return Ok(());
        }
        self.body = Some(Body::copy_from(body)?);
        Ok(())
    }

    /// Replaces the envelope sender.
    ///
    /// # Errors
    ///
    /// Returns an error if the transport rejects the value.
    pub fn set_from(&mut self, from: &str) -> Result<()> {
        self.set_option(SessionOption::MailFrom(from))
    }

    /// Enables or disables verbose transport logging.
    ///
    /// # Errors
    ///
    /// Returns an error if the transport rejects the value.
    pub fn set_verbose(&mut self, verbose: bool) -> Result<()> {
        self.set_option(SessionOption::Verbose(verbose))
    }

    /// Sets the directory holding CA certificates.
    ///
    /// # Errors
    ///
    /// Returns an error if the transport rejects the value.
    pub fn set_ca_path(&mut self, ca_path: &str) -> Result<()> {
        self.set_option(SessionOption::CaPath(ca_path))
    }

    /// Sets the CA bundle file.
    ///
    /// # Errors
    ///
    /// Returns an error if the transport rejects the value.
    pub fn set_ca_file(&mut self, ca_file: &str) -> Result<()> {
        self.set_option(SessionOption::CaFile(ca_file))
    }

    /// Enables or disables certificate name verification against the host.
    ///
    /// # Errors
    ///
    /// Returns an error if the transport rejects the value.
    pub fn set_verify_host(&mut self, verify: bool) -> Result<()> {
        self.set_option(SessionOption::VerifyHost(verify))
    }

    /// Enables or disables peer certificate verification.
    ///
    /// # Errors
    ///
    /// Returns an error if the transport rejects the value.
    pub fn set_verify_peer(&mut self, verify: bool) -> Result<()> {
        self.set_option(SessionOption::VerifyPeer(verify))
    }

    /// Sets the client private key path.
    ///
    /// # Errors
    ///
    /// Returns an error if the transport rejects the value.
    pub fn set_client_key(&mut self, path: &str) -> Result<()> {
        self.set_option(SessionOption::ClientKey(path))
    }

    /// Sets the client certificate path.
    ///
    /// # Errors
    ///
    /// Returns an error if the transport rejects the value.
    pub fn set_client_cert(&mut self, path: &str) -> Result<()> {
        self.set_option(SessionOption::ClientCert(path))
    }

    /// Sets the TLS usage policy.
    ///
    /// # Errors
    ///
    /// Returns an error if the transport rejects the value.
    pub fn set_use_ssl(&mut self, use_ssl: UseSsl) -> Result<()> {
        self.set_option(SessionOption::UseSsl(use_ssl))
    }

    /// Sets the authentication user name.
    ///
    /// # Errors
    ///
    /// Returns an error if the transport rejects the value.
    pub fn set_username(&mut self, username: &str) -> Result<()> {
        self.set_option(SessionOption::Username(username))
    }

    /// Sets the authentication password.
    ///
    /// # Errors
    ///
    /// Returns an error if the transport rejects the value.
    pub fn set_password(&mut self, password: &str) -> Result<()> {
        self.set_option(SessionOption::Password(password))
    }

    /// Runs the transaction on the current thread. Only called on a worker.
    pub(crate) fn perform(
        &mut self,
        timeout: Duration,
        errors: &mut ErrorBuffer,
    ) -> TransportCode {
        let Some(session) = self.session.as_mut() else {
            return TransportCode::BAD_FUNCTION_ARGUMENT;
        };
        let mut empty = Body::default();
        let body = self.body.as_mut().unwrap_or(&mut empty);
        let mut submission = Submission {
            recipients: &self.recipients,
            body,
            timeout,
            errors,
        };
        session.perform(&mut submission)
    }

    pub(crate) fn complete(
        mut self,
        code: TransportCode,
        status: i32,
        reason: Cow<'static, str>,
    ) -> Request<Completed> {
        Request {
            env: Arc::clone(&self.env),
            session: self.session.take(),
            recipients: mem::take(&mut self.recipients),
            body: self.body.take(),
            state: Completed {
                code,
                status,
                reason,
            },
        }
    }
}

impl Request<Completed> {
    /// Returns the SMTP response code, or [`STATUS_FAILED`].
    #[must_use]
    pub const fn status(&self) -> i32 {
        self.state.status
    }

    /// Returns the human-readable outcome. Never empty.
    #[must_use]
    pub fn reason(&self) -> &str {
        &self.state.reason
    }

    /// Returns the raw transport result code.
    #[must_use]
    pub const fn code(&self) -> TransportCode {
        self.state.code
    }

    /// Returns the status as an SMTP reply code, if it is one.
    #[must_use]
    pub fn reply_code(&self) -> Option<ReplyCode> {
        ReplyCode::from_status(self.state.status)
    }

    /// Returns true if the transport completed the transaction.
    #[must_use]
    pub const fn is_success(&self) -> bool {
        self.state.code.is_ok()
    }
}

impl<S> Request<S> {
    /// Returns the environment this request belongs to.
    #[must_use]
    pub const fn environment(&self) -> &Arc<Environment> {
        &self.env
    }

    /// Returns the envelope recipients.
    #[must_use]
    pub fn recipients(&self) -> &[String] {
        &self.recipients
    }

    /// Returns the body, if one was set.
    #[must_use]
    pub const fn body(&self) -> Option<&Body> {
        self.body.as_ref()
    }

    pub(crate) fn session(&self) -> Option<&dyn Session> {
        self.session.as_deref()
    }

    fn set_option(&mut self, option: SessionOption<'_>) -> Result<()> {
        match self.session.as_mut() {
            Some(session) => session.set_option(option),
            None => Err(Error::Config(format!(
                "{} set on a torn-down request",
                option.name()
            ))),
        }
    }

    /// Tears down the transport session on a worker, then frees the buffers.
    pub async fn delete(mut self) {
        if let Some(session) = self.session.take() {
            let env = Arc::clone(&self.env);
            if let Err(e) = offload::run(env.offload(), move || drop(session)).await {
                warn!(error = %e, "SMTP session teardown did not complete on a worker");
            }
        }
        debug!("SMTP request deleted");
    }
}

impl<S> Drop for Request<S> {
    fn drop(&mut self) {
        let Some(session) = self.session.take() else {
            return;
        };
        if tokio::runtime::Handle::try_current().is_ok() {
            debug!("SMTP request dropped without delete, tearing down on a worker");
            drop(self.env.offload().spawn(Box::new(move || drop(session))));
        } else {
            drop(session);
        }
    }
}

impl<S: fmt::Debug> fmt::Debug for Request<S> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Request")
            .field("recipients", &self.recipients)
            .field("body_len", &self.body.as_ref().map(Body::len))
            .field("state", &self.state)
            .finish_non_exhaustive()
    }
}
