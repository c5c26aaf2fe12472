//! Failure types produced by the database client, and the signature view the
//! classifier reads from them.

use std::borrow::Cow;
use std::io;
use thiserror::Error;

/// Failure reported by the external database client for one unit of work.
///
/// The variants mirror how the client surfaces problems: before a connection
/// exists, as a coded request error, or as free text only.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DbError {
    /// Client could not initialize (handshake never completed). Often has no code.
    #[error("initialization failed: {message}")]
    Initialization {
        code: Option<String>,
        message: String,
    },
    /// Remote reported a known, enumerated error code.
    #[error("{code}: {message}")]
    KnownRequest { code: String, message: String },
    /// Request failed without a reliable code.
    #[error("unknown request error: {message}")]
    UnknownRequest { message: String },
    /// Client engine crashed mid-request.
    #[error("client panicked: {message}")]
    Panic { message: String },
    /// Anything else; only the message is known.
    #[error("{message}")]
    Other { message: String },
}

impl DbError {
    pub fn initialization(message: impl Into<String>) -> Self {
        DbError::Initialization {
            code: None,
            message: message.into(),
        }
    }

    pub fn known(code: impl Into<String>, message: impl Into<String>) -> Self {
        DbError::KnownRequest {
            code: code.into(),
            message: message.into(),
        }
    }

    pub fn unknown(message: impl Into<String>) -> Self {
        DbError::UnknownRequest {
            message: message.into(),
        }
    }

    pub fn other(message: impl Into<String>) -> Self {
        DbError::Other {
            message: message.into(),
        }
    }
}

/// Borrowed view of a failure: what the classifier actually looks at.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Signature<'a> {
    /// Never reached the server.
    Connection { code: Option<&'a str> },
    /// Structured code plus message.
    Coded {
        code: &'a str,
        message: Cow<'a, str>,
    },
    /// Message only.
    Uncoded { message: Cow<'a, str> },
}

impl Signature<'_> {
    pub fn code(&self) -> Option<&str> {
        match self {
            Signature::Connection { code } => *code,
            Signature::Coded { code, .. } => Some(*code),
            Signature::Uncoded { .. } => None,
        }
    }
}

/// Anything the retry engine can classify.
pub trait ErrorSignature {
    fn signature(&self) -> Signature<'_>;
}

impl<T: ErrorSignature + ?Sized> ErrorSignature for &T {
    fn signature(&self) -> Signature<'_> {
        (**self).signature()
    }
}

impl ErrorSignature for DbError {
    fn signature(&self) -> Signature<'_> {
        match self {
            DbError::Initialization { code, .. } => Signature::Connection {
                code: code.as_deref(),
            },
            DbError::KnownRequest { code, message } => Signature::Coded {
                code,
                message: Cow::Borrowed(message),
            },
            DbError::UnknownRequest { message }
            | DbError::Panic { message }
            | DbError::Other { message } => Signature::Uncoded {
                message: Cow::Borrowed(message),
            },
        }
    }
}

/// Socket-level errors: connect-time kinds count as connection failures, the
/// rest fall back to their text.
impl ErrorSignature for io::Error {
    fn signature(&self) -> Signature<'_> {
        match self.kind() {
            io::ErrorKind::ConnectionRefused
            | io::ErrorKind::NotConnected
            | io::ErrorKind::AddrNotAvailable => Signature::Connection { code: None },
            _ => Signature::Uncoded {
                message: Cow::Owned(self.to_string()),
            },
        }
    }
}
