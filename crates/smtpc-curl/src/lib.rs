//! # smtpc-curl
//!
//! libcurl transport for [`smtpc`].
//!
//! The function table is resolved at runtime: first from the host process,
//! then from a deep-bound shared library. Nothing links against libcurl at
//! build time.
//!
//! ```ignore
//! use std::sync::Arc;
//! use smtpc::Environment;
//!
//! let curl = smtpc_curl::init()?;
//! println!("libcurl {}", curl.version());
//! let env = Environment::new(Arc::new(curl));
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
// FFI boundary: every unsafe block carries a SAFETY note.
#![allow(unsafe_code)]
#![deny(unsafe_op_in_unsafe_fn)]
#![cfg(unix)]

mod loader;
mod session;
mod sys;

use std::borrow::Cow;
use std::sync::Arc;

use smtpc::{Result, Session, Transport, TransportCode, Version};
use tracing::info;

pub use loader::Origin;

use loader::Api;
use session::CurlSession;

/// Loaded libcurl, shared by every session it opens.
///
/// Cloning is cheap; clones share the same library handle.
#[derive(Debug, Clone)]
pub struct Curl {
    api: Arc<Api>,
}

impl Curl {
    /// Resolves libcurl and checks it supports `smtp` and `smtps`.
    ///
    /// # Errors
    ///
    /// Returns [`smtpc::Error::MissingSymbol`], [`smtpc::Error::Load`] or
    /// [`smtpc::Error::MissingProtocol`] if no usable libcurl is found.
    pub fn load() -> Result<Self> {
        let api = Api::load()?;
        info!(version = %api.version, origin = %api.origin, "libcurl loaded");
        Ok(Self { api: Arc::new(api) })
    }

    /// Returns the loaded libcurl version.
    #[must_use]
    pub fn version(&self) -> Version {
        self.api.version
    }

    /// Returns where libcurl was resolved from.
    #[must_use]
    pub fn origin(&self) -> Origin {
        self.api.origin
    }
}

impl Transport for Curl {
    fn open(&self) -> Result<Box<dyn Session>> {
        Ok(Box::new(CurlSession::open(Arc::clone(&self.api))?))
    }

    fn describe(&self, code: TransportCode) -> Cow<'static, str> {
        Cow::Owned(session::strerror(&self.api, code.as_i32()))
    }

    fn version(&self) -> Version {
        self.api.version
    }
}

/// Loads libcurl once for the process.
///
/// # Errors
///
/// See [`Curl::load`].
pub fn init() -> Result<Curl> {
    Curl::load()
}
