//! # smtpc
//!
//! An embeddable SMTP request client: one call submits one message through a
//! blocking mail-transport library without blocking the caller's runtime.
//!
//! ## Features
//!
//! - **Offloaded transport**: the blocking perform and teardown calls run on
//!   a worker, so sibling tasks keep running
//! - **Type-state requests**: a request is configured, executed once, then
//!   inspected and deleted; the compiler enforces the order
//! - **Stable outcome taxonomy**: transport codes map onto success,
//!   recoverable failure (status `-1` plus reason) or fatal failure
//! - **Shared statistics**: active, total and failed request counters per
//!   environment
//!
//! ## Quick Start
//!
//! ```ignore
//! use std::sync::Arc;
//! use std::time::Duration;
//! use smtpc::{Environment, ExecuteOutcome, Request, UseSsl};
//!
//! #[tokio::main]
//! async fn main() -> smtpc::Result<()> {
//!     let transport = smtpc_curl::init()?;
//!     let env = Environment::new(Arc::new(transport));
//!
//!     let mut request = Request::new(&env, "smtp://mail.example.com:587", "me@example.com")?;
//!     request.add_recipient("you@example.com")?;
//!     request.set_body(b"Subject: Test\r\n\r\nHello, World!\r\n")?;
//!     request.set_use_ssl(UseSsl::All)?;
//!
//!     match request.execute(Duration::from_secs(30)).await {
//!         ExecuteOutcome::Completed(request) | ExecuteOutcome::Failed(request) => {
//!             println!("{} {}", request.status(), request.reason());
//!             request.delete().await;
//!         }
//!         ExecuteOutcome::Fatal(err) => return Err(err),
//!     }
//!
//!     println!("{:?}", env.stat());
//!     Ok(())
//! }
//! ```
//!
//! ## Modules
//!
//! - [`transport`]: Traits the transport library is driven through
//! - [`offload`]: Running blocking work off the caller's task
//! - [`classify`]: Transport result code taxonomy
//! - [`types`]: Reply codes, transport codes, TLS policy, versions

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![forbid(unsafe_code)]

mod body;
pub mod classify;
mod client;
mod config;
mod engine;
mod environment;
mod error;
pub mod offload;
mod request;
pub mod transport;
pub mod types;

pub use body::Body;
pub use classify::Classification;
pub use client::{Client, Response};
pub use config::RequestOptions;
pub use engine::{DEFAULT_TIMEOUT, ExecuteOutcome};
pub use environment::{Environment, Stat};
pub use error::{Error, Result};
pub use offload::{Job, JobHandle, Offload, TokioOffload};
pub use request::{Built, Completed, Request, STATUS_FAILED};
pub use transport::{ERROR_BUFFER_SIZE, ErrorBuffer, Session, SessionOption, Submission, Transport};
pub use types::{ReplyClass, ReplyCode, TransportCode, UseSsl, Version};
