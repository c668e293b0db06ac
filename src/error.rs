//! Unified error type for vizlink.
//!
//! Every variant carries only fixed-size data so errors stay `Copy` and
//! never allocate. Codec and registry failures are always surfaced as an
//! error; nothing in the crate falls back to a default value.

use core::fmt;

use crate::params::ParamId;

/// Top-level error type used across the crate.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Error {
    /// The link could not be established, was lost, or refused an operation.
    Link(LinkError),

    /// Service discovery completed with a non-success GATT status.
    Discovery(u16),

    /// The characteristic is absent from every discovered service.
    NotFound(ParamId),

    /// A GATT read/write completed with a non-success status.
    Device(u16),

    /// Payload has the wrong size or an invalid encoding.
    MalformedPayload(Malformed),

    /// Enum byte matches no defined variant.
    UnknownVariant(u8),

    /// The operation was aborted by a disconnect or a new connection attempt.
    Cancelled,

    /// The configured deadline elapsed.
    Timeout,
}

/// Link-level failures reported by the host stack or the state machine.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum LinkError {
    /// No connection attempt has been made (or it was closed).
    NotConnected,
    /// The host stack refused to start the connection. Returned by
    /// `GattLink` implementations; the crate passes it through.
    ConnectFailed,
    /// The host stack refused to start service discovery. Returned by
    /// `GattLink` implementations; the crate passes it through.
    DiscoveryNotStarted,
    /// The host stack refused to start a read/write.
    OperationRejected,
    /// The link reported a callback the state machine does not expect.
    Unexpected,
}

/// Why a payload could not be decoded (or encoded).
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Malformed {
    /// Fixed-size payload with the wrong length.
    Length { expected: usize, actual: usize },
    /// Bounded payload longer than its maximum.
    TooLong { max: usize, actual: usize },
    /// Text field is not valid UTF-8.
    Utf8,
    /// A record field is missing or does not parse.
    Field(&'static str),
    /// zlib stream could not be inflated.
    Compression,
    /// Preset table announces more entries than it can hold.
    EntryCount(u8),
}

/// Why the connection ended up in `Failed`.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum FailureReason {
    /// The host stack refused to start a link-level step.
    Link(LinkError),
    /// Service discovery completed with this GATT status.
    Discovery(u16),
    /// Connection-state callback with a state code we do not know.
    UnknownLinkState { state: u8, status: u16 },
    /// Known callback that is not valid in the current state.
    OutOfOrder(&'static str),
    /// `connect()` deadline elapsed before services were ready.
    Timeout,
}

impl FailureReason {
    /// Error reported to callers that were waiting on the connection.
    pub const fn error(self) -> Error {
        match self {
            FailureReason::Link(e) => Error::Link(e),
            FailureReason::Discovery(status) => Error::Discovery(status),
            FailureReason::UnknownLinkState { .. } | FailureReason::OutOfOrder(_) => {
                Error::Link(LinkError::Unexpected)
            }
            FailureReason::Timeout => Error::Timeout,
        }
    }
}

// Convenience conversions

impl From<LinkError> for Error {
    fn from(e: LinkError) -> Self {
        Error::Link(e)
    }
}

impl From<Malformed> for Error {
    fn from(m: Malformed) -> Self {
        Error::MalformedPayload(m)
    }
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Error::Link(e) => write!(f, "link error: {}", e),
            Error::Discovery(status) => write!(f, "service discovery failed (status {})", status),
            Error::NotFound(param) => write!(f, "characteristic {} not found", param),
            Error::Device(status) => write!(f, "GATT operation failed (status {})", status),
            Error::MalformedPayload(m) => write!(f, "malformed payload: {}", m),
            Error::UnknownVariant(code) => write!(f, "unknown enum code {}", code),
            Error::Cancelled => f.write_str("operation cancelled"),
            Error::Timeout => f.write_str("operation timed out"),
        }
    }
}

impl fmt::Display for LinkError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            LinkError::NotConnected => "not connected",
            LinkError::ConnectFailed => "connection could not be started",
            LinkError::DiscoveryNotStarted => "service discovery could not be started",
            LinkError::OperationRejected => "GATT operation could not be started",
            LinkError::Unexpected => "unexpected link callback",
        })
    }
}

impl From<FailureReason> for Error {
    fn from(reason: FailureReason) -> Self {
        reason.error()
    }
}

impl fmt::Display for FailureReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FailureReason::Link(e) => write!(f, "{}", e),
            FailureReason::Discovery(status) => {
                write!(f, "service discovery failed (status {})", status)
            }
            FailureReason::UnknownLinkState { state, status } => {
                write!(f, "unknown link state {} (status {})", state, status)
            }
            FailureReason::OutOfOrder(event) => write!(f, "unexpected '{}' callback", event),
            FailureReason::Timeout => f.write_str("connect timed out"),
        }
    }
}

impl fmt::Display for Malformed {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Malformed::Length { expected, actual } => {
                write!(f, "expected {} bytes, got {}", expected, actual)
            }
            Malformed::TooLong { max, actual } => {
                write!(f, "at most {} bytes allowed, got {}", max, actual)
            }
            Malformed::Utf8 => f.write_str("invalid UTF-8"),
            Malformed::Field(name) => write!(f, "bad field '{}'", name),
            Malformed::Compression => f.write_str("invalid zlib stream"),
            Malformed::EntryCount(n) => write!(f, "entry count {} exceeds capacity", n),
        }
    }
}
