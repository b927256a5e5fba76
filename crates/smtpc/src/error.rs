//! Error types for SMTP request operations.

use crate::types::TransportCode;

/// Result type alias for SMTP request operations.
pub type Result<T> = std::result::Result<T, Error>;

/// SMTP request error types.
///
/// Recoverable transport failures (timeouts, certificate problems, refused
/// connections) are not errors: they complete the request with a status of
/// `-1` and a reason. See [`ExecuteOutcome`](crate::ExecuteOutcome).
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// Invalid option value supplied by the caller.
    #[error("Configuration error: {0}")]
    Config(String),

    /// A buffer, list or transport handle could not be allocated.
    #[error("Allocation failed: {0}")]
    Alloc(&'static str),

    /// The transport ran out of memory while performing the request.
    #[error("Transport internal memory issue")]
    OutOfMemory,

    /// The transport returned a result code outside the known taxonomy.
    #[error("Transport internal issue (code {code}, os errno {os_errno})")]
    Unknown {
        /// Raw transport result code.
        code: TransportCode,
        /// OS-level error number reported by the transport.
        os_errno: i32,
    },

    /// The worker running a blocking job failed or was cancelled.
    #[error("Blocking worker failed: {0}")]
    Worker(String),

    /// The transport library could not be loaded.
    #[error("Failed to load {library}: {reason}")]
    Load {
        /// Library file name.
        library: &'static str,
        /// Loader failure reason.
        reason: String,
    },

    /// A required transport symbol could not be resolved.
    #[error("Transport symbol `{symbol}` unavailable: {reason}")]
    MissingSymbol {
        /// Symbol name.
        symbol: &'static str,
        /// Resolver failure reason.
        reason: String,
    },

    /// The transport library was built without a required protocol.
    #[error("Transport library lacks {0} protocol support")]
    MissingProtocol(&'static str),
}

impl Error {
    /// Returns true if this error means the request was consumed by the engine.
    #[must_use]
    pub const fn is_fatal(&self) -> bool {
        matches!(
            self,
            Self::OutOfMemory | Self::Unknown { .. } | Self::Worker(_)
        )
    }

    /// Returns true if this is a subsystem initialization failure.
    #[must_use]
    pub const fn is_init(&self) -> bool {
        matches!(
            self,
            Self::Load { .. } | Self::MissingSymbol { .. } | Self::MissingProtocol(_)
        )
    }
}
