//! Mapping of transport result codes onto request outcomes.

use crate::types::TransportCode;

/// Outcome class of one transport perform call.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Classification {
    /// Transaction accepted by the server.
    Success,
    /// CA or peer certificate verification failed.
    Certificate,
    /// The transport timeout expired.
    Timeout,
    /// The server closed the connection without replying.
    NoResponse,
    /// Host resolution or TCP connect failed.
    Connectivity,
    /// The server refused part of the submission.
    Submission,
    /// The transport ran out of memory; the handle cannot be trusted.
    OutOfMemory,
    /// A code outside the known set; the handle cannot be trusted.
    Unknown,
}

impl Classification {
    /// Classifies a transport result code.
    #[must_use]
    pub const fn of(code: TransportCode) -> Self {
        match code {
            TransportCode::OK => Self::Success,
            TransportCode::SSL_CACERT | TransportCode::PEER_FAILED_VERIFICATION_LEGACY => {
                Self::Certificate
            }
            TransportCode::OPERATION_TIMEDOUT => Self::Timeout,
            TransportCode::GOT_NOTHING => Self::NoResponse,
            TransportCode::COULDNT_RESOLVE_HOST | TransportCode::COULDNT_CONNECT => {
                Self::Connectivity
            }
            TransportCode::SEND_ERROR => Self::Submission,
            TransportCode::OUT_OF_MEMORY => Self::OutOfMemory,
            _ => Self::Unknown,
        }
    }

    /// Returns true if the request must be torn down by the engine.
    #[must_use]
    pub const fn is_fatal(self) -> bool {
        matches!(self, Self::OutOfMemory | Self::Unknown)
    }

    /// Returns true if the transaction failed.
    #[must_use]
    pub const fn is_failure(self) -> bool {
        !matches!(self, Self::Success)
    }
}
