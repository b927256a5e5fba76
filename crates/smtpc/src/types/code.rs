//! Transport result codes.

/// Result code returned by the transport for one perform call.
///
/// Values follow the libcurl `CURLcode` numbering, which is also what fake
/// transports are expected to report.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub struct TransportCode(i32);

impl TransportCode {
    /// Creates a transport code from its raw value.
    #[must_use]
    pub const fn new(code: i32) -> Self {
        Self(code)
    }

    /// Returns the raw value.
    #[must_use]
    pub const fn as_i32(self) -> i32 {
        self.0
    }

    /// Returns true for the success code.
    #[must_use]
    pub const fn is_ok(self) -> bool {
        self.0 == Self::OK.0
    }
}

impl std::fmt::Display for TransportCode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

// Codes the engine classifies
impl TransportCode {
    /// `CURLE_OK`
    pub const OK: Self = Self(0);
    /// `CURLE_COULDNT_RESOLVE_HOST`
    pub const COULDNT_RESOLVE_HOST: Self = Self(6);
    /// `CURLE_COULDNT_CONNECT`
    pub const COULDNT_CONNECT: Self = Self(7);
    /// `CURLE_OUT_OF_MEMORY`
    pub const OUT_OF_MEMORY: Self = Self(27);
    /// `CURLE_OPERATION_TIMEDOUT`
    pub const OPERATION_TIMEDOUT: Self = Self(28);
    /// `CURLE_BAD_FUNCTION_ARGUMENT`
    pub const BAD_FUNCTION_ARGUMENT: Self = Self(43);
    /// `CURLE_PEER_FAILED_VERIFICATION` before libcurl 7.62.
    pub const PEER_FAILED_VERIFICATION_LEGACY: Self = Self(51);
    /// `CURLE_GOT_NOTHING`
    pub const GOT_NOTHING: Self = Self(52);
    /// `CURLE_SEND_ERROR`
    pub const SEND_ERROR: Self = Self(55);
    /// `CURLE_PEER_FAILED_VERIFICATION`, which `CURLE_SSL_CACERT` aliases
    /// since libcurl 7.62.
    pub const PEER_FAILED_VERIFICATION: Self = Self(60);
    /// `CURLE_SSL_CACERT`
    pub const SSL_CACERT: Self = Self(60);
}
