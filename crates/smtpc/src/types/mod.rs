//! Core request types.

mod code;
mod reply;
mod use_ssl;
mod version;

pub use code::TransportCode;
pub use reply::{ReplyClass, ReplyCode};
pub use use_ssl::UseSsl;
pub use version::Version;
