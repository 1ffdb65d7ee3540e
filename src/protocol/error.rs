//! errors during protocol execution

use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Error {
    Transport(TransportErrorKind),
    Crypto(CryptoErrorKind),
    Protocol(ProtocolErrorKind),
}

/// channel-level failures; always fatal to the current run
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[non_exhaustive]
pub enum TransportErrorKind {
    Io(std::io::ErrorKind),
    /// value too large for the frame size field
    FrameTooLarge,
    /// undecodable frame or payload
    Malformed,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[non_exhaustive]
pub enum CryptoErrorKind {
    /// key size unusable, or too small for the configured share modulus
    KeySize,
    /// share modulus outside the supported range
    Modulus,
    /// value exceeds the scheme's representable plaintext space
    PlaintextOverflow,
    NotInvertible,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[non_exhaustive]
pub enum ProtocolErrorKind {
    /// peer sent a value of unexpected shape
    UnexpectedMessage,
}

impl From<std::io::Error> for Error {
    fn from(err: std::io::Error) -> Self {
        Error::Transport(TransportErrorKind::Io(err.kind()))
    }
}

impl From<serde_json::Error> for Error {
    fn from(_err: serde_json::Error) -> Self {
        Error::Transport(TransportErrorKind::Malformed)
    }
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Error::Transport(kind) => write!(f, "transport error: {kind:?}"),
            Error::Crypto(kind) => write!(f, "crypto error: {kind:?}"),
            Error::Protocol(kind) => write!(f, "protocol violation: {kind:?}"),
        }
    }
}

impl std::error::Error for Error {}

pub type Result<T> = std::result::Result<T, Error>;
