//! Transport capability traits.
//!
//! A [`Transport`] is the loaded mail-transport library; it opens one
//! [`Session`] (the native per-request handle) for every request. The
//! engine only ever talks to these traits, so tests can substitute a fake
//! and production code plugs in the libcurl binding.

use std::borrow::Cow;
use std::fmt;
use std::time::Duration;

use crate::body::Body;
use crate::error::Result;
use crate::types::{TransportCode, UseSsl, Version};

/// Size of the per-call diagnostic buffer (`CURL_ERROR_SIZE`).
pub const ERROR_BUFFER_SIZE: usize = 256;

/// A loaded mail-transport library.
pub trait Transport: Send + Sync + fmt::Debug {
    /// Creates a new session handle.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Alloc`](crate::Error::Alloc) if the handle cannot be
    /// created.
    fn open(&self) -> Result<Box<dyn Session>>;

    /// Returns the library's textual description of a result code.
    fn describe(&self, code: TransportCode) -> Cow<'static, str>;

    /// Returns the library version.
    fn version(&self) -> Version;
}

/// One native transport handle, exclusively owned by a request.
///
/// Dropping the session tears the handle down. The drop may block, so the
/// engine always drops sessions on a blocking worker.
pub trait Session: Send {
    /// Configures one transport option.
    ///
    /// # Errors
    ///
    /// Returns an error if the transport cannot accept the value.
    fn set_option(&mut self, option: SessionOption<'_>) -> Result<()>;

    /// Performs the whole transaction, blocking until it completes.
    fn perform(&mut self, submission: &mut Submission<'_>) -> TransportCode;

    /// Returns the last server response code.
    fn response_code(&self) -> i64;

    /// Returns the OS error number recorded by the last failure.
    fn os_errno(&self) -> i32;
}

/// One option forwarded to a [`Session`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionOption<'a> {
    /// Target URL (`smtp://` or `smtps://`).
    Url(&'a str),
    /// Envelope sender.
    MailFrom(&'a str),
    /// Verbose transport logging.
    Verbose(bool),
    /// Directory holding CA certificates.
    CaPath(&'a str),
    /// CA bundle file.
    CaFile(&'a str),
    /// Verify the certificate name against the host.
    VerifyHost(bool),
    /// Verify the peer certificate chain.
    VerifyPeer(bool),
    /// Client private key path.
    ClientKey(&'a str),
    /// Client certificate path.
    ClientCert(&'a str),
    /// TLS usage policy.
    UseSsl(UseSsl),
    /// Authentication user name.
    Username(&'a str),
    /// Authentication password.
    Password(&'a str),
}

impl SessionOption<'_> {
    /// Returns the option name, for diagnostics.
    #[must_use]
    pub const fn name(&self) -> &'static str {
        match self {
            Self::Url(_) => "url",
            Self::MailFrom(_) => "from",
            Self::Verbose(_) => "verbose",
            Self::CaPath(_) => "ca_path",
            Self::CaFile(_) => "ca_file",
            Self::VerifyHost(_) => "verify_host",
            Self::VerifyPeer(_) => "verify_peer",
            Self::ClientKey(_) => "ssl_key",
            Self::ClientCert(_) => "ssl_cert",
            Self::UseSsl(_) => "use_ssl",
            Self::Username(_) => "username",
            Self::Password(_) => "password",
        }
    }
}

/// Everything a session needs for one perform call.
#[derive(Debug)]
pub struct Submission<'a> {
    /// Envelope recipients in insertion order.
    pub recipients: &'a [String],
    /// Body the transport reads from.
    pub body: &'a mut Body,
    /// Transaction timeout.
    pub timeout: Duration,
    /// Buffer the transport writes diagnostic text into.
    pub errors: &'a mut ErrorBuffer,
}

/// Fixed-size buffer receiving transport diagnostic text for one call.
pub struct ErrorBuffer([u8; ERROR_BUFFER_SIZE]);

impl ErrorBuffer {
    /// Creates a zeroed buffer.
    #[must_use]
    pub const fn new() -> Self {
        Self([0; ERROR_BUFFER_SIZE])
    }

    /// Returns the raw storage for the transport to write into.
    pub const fn as_mut_bytes(&mut self) -> &mut [u8; ERROR_BUFFER_SIZE] {
        &mut self.0
    }

    /// Returns the NUL-terminated text currently in the buffer.
    #[must_use]
    pub fn text(&self) -> String {
        let end = self.0.iter().position(|&b| b == 0).unwrap_or(self.0.len());
        String::from_utf8_lossy(&self.0[..end]).trim_end().to_string()
    }
}

impl Default for ErrorBuffer {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for ErrorBuffer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("ErrorBuffer").field(&self.text()).finish()
    }
}
