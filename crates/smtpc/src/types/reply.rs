//! SMTP reply codes.
//!
//! A completed request reports the server's final reply as an integer
//! status. [`ReplyCode`] gives that integer a type once it is known to be a
//! real three-digit reply rather than the `-1` failure sentinel.

/// First-digit class of an SMTP reply (RFC 5321 §4.2.1).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ReplyClass {
    /// 2xx: the action completed.
    Completion,
    /// 3xx: the server waits for more input.
    Intermediate,
    /// 4xx: the action failed but may succeed if retried.
    Transient,
    /// 5xx: the action failed and should not be retried as is.
    Permanent,
    /// 1xx: unused by SMTP.
    Preliminary,
}

/// Final SMTP reply code of a transaction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct ReplyCode(u16);

impl ReplyCode {
    /// 250 Requested mail action okay, completed
    pub const OK: Self = Self(250);
    /// 251 User not local; will forward
    pub const FORWARD: Self = Self(251);
    /// 421 Service not available
    pub const SERVICE_UNAVAILABLE: Self = Self(421);
    /// 450 Mailbox busy
    pub const MAILBOX_BUSY: Self = Self(450);
    /// 535 Authentication credentials invalid
    pub const AUTH_FAILED: Self = Self(535);
    /// 550 Mailbox unavailable
    pub const MAILBOX_UNAVAILABLE: Self = Self(550);
    /// 554 Transaction failed
    pub const TRANSACTION_FAILED: Self = Self(554);

    /// Interprets a request status as a reply code.
    ///
    /// Returns `None` for the `-1` failure sentinel and for values outside
    /// `100..=599`.
    #[must_use]
    pub fn from_status(status: i32) -> Option<Self> {
        u16::try_from(status)
            .ok()
            .filter(|code| (100..600).contains(code))
            .map(Self)
    }

    /// Returns the numeric code.
    #[must_use]
    pub const fn get(self) -> u16 {
        self.0
    }

    /// Returns the reply class.
    #[must_use]
    pub const fn class(self) -> ReplyClass {
        match self.0 / 100 {
            2 => ReplyClass::Completion,
            3 => ReplyClass::Intermediate,
            4 => ReplyClass::Transient,
            5 => ReplyClass::Permanent,
            _ => ReplyClass::Preliminary,
        }
    }

    /// Returns true for 2xx replies.
    #[must_use]
    pub const fn is_success(self) -> bool {
        matches!(self.class(), ReplyClass::Completion)
    }
}

impl std::fmt::Display for ReplyCode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}
