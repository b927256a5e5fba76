//! TLS usage policy.

use serde::Deserialize;

use crate::error::Error;

/// Whether the SMTP session must use TLS.
///
/// Plain text with STARTTLS is typical on port 587, implicit TLS (`smtps://`)
/// on port 465. The numeric form matches `CURLOPT_USE_SSL`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Deserialize)]
#[serde(try_from = "i64")]
pub enum UseSsl {
    /// Don't attempt to use TLS.
    #[default]
    None,
    /// Try STARTTLS, proceed in plain text otherwise.
    Try,
    /// Require TLS for the control connection.
    Control,
    /// Require TLS for all communication.
    All,
}

impl UseSsl {
    /// Returns the numeric policy value passed to the transport.
    #[must_use]
    pub const fn as_u8(self) -> u8 {
        match self {
            Self::None => 0,
            Self::Try => 1,
            Self::Control => 2,
            Self::All => 3,
        }
    }
}

impl TryFrom<i64> for UseSsl {
    type Error = Error;

    fn try_from(value: i64) -> Result<Self, Self::Error> {
        match value {
            0 => Ok(Self::None),
            1 => Ok(Self::Try),
            2 => Ok(Self::Control),
            3 => Ok(Self::All),
            other => Err(Error::Config(format!(
                "use_ssl option must be >= 0 and <= 3, got {other}"
            ))),
        }
    }
}
