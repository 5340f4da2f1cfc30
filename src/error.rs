//! Error types
//!
//! Every failure inside a demuxer session is converted into one of these
//! values, logged, and reported to the owner as a single "ended with error"
//! notification. Only [`Error::TooManySinks`] and [`Error::NoRuntime`] are
//! returned directly to the caller, at setup time.

use std::fmt;
use std::io;

use crate::protocol::codec::CodecId;

/// Result alias used throughout the crate
pub type Result<T> = std::result::Result<T, Error>;

/// Broad class of an [`Error`], used for logging
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCategory {
    /// The peer sent something the protocol does not allow
    Protocol,
    /// A buffer could not be allocated
    Resource,
    /// A sink refused to open or to accept a packet
    Sink,
    /// The session was misused by its owner
    Usage,
    /// Socket setup failed
    Io,
}

impl fmt::Display for ErrorCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            ErrorCategory::Protocol => "protocol",
            ErrorCategory::Resource => "resource",
            ErrorCategory::Sink => "sink",
            ErrorCategory::Usage => "usage",
            ErrorCategory::Io => "io",
        };
        f.write_str(s)
    }
}

/// Main error type
#[derive(Debug)]
pub enum Error {
    /// Handshake carried a codec tag outside the supported set
    UnknownCodec(u32),
    /// The codec lookup has no decoder for a known tag
    DecoderNotFound(CodecId),
    /// A packet header declared a zero-length payload
    EmptyPacket,
    /// Allocation of a packet or merge buffer failed
    OutOfMemory { requested: usize },
    /// A sink failed to open
    SinkOpen { index: usize, source: SinkError },
    /// A sink rejected a packet
    SinkPush { index: usize, source: SinkError },
    /// More sinks registered than the configuration allows
    TooManySinks { max: usize },
    /// `start` was called outside of a tokio runtime
    NoRuntime,
    /// Socket setup error
    Io(io::Error),
}

impl Error {
    /// Classify this error
    pub fn category(&self) -> ErrorCategory {
        match self {
            Error::UnknownCodec(_) | Error::DecoderNotFound(_) | Error::EmptyPacket => {
                ErrorCategory::Protocol
            }
            Error::OutOfMemory { .. } => ErrorCategory::Resource,
            Error::SinkOpen { .. } | Error::SinkPush { .. } => ErrorCategory::Sink,
            Error::TooManySinks { .. } | Error::NoRuntime => ErrorCategory::Usage,
            Error::Io(_) => ErrorCategory::Io,
        }
    }
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Error::UnknownCodec(tag) => write!(f, "Unknown codec id 0x{:08x}", tag),
            Error::DecoderNotFound(codec) => write!(f, "Decoder not found for {}", codec),
            Error::EmptyPacket => write!(f, "Packet header declares an empty payload"),
            Error::OutOfMemory { requested } => {
                write!(f, "Out of memory allocating {} bytes", requested)
            }
            Error::SinkOpen { index, source } => {
                write!(f, "Sink {} could not be opened: {}", index, source)
            }
            Error::SinkPush { index, source } => {
                write!(f, "Sink {} could not process packet: {}", index, source)
            }
            Error::TooManySinks { max } => write!(f, "Too many sinks (max {})", max),
            Error::NoRuntime => write!(f, "No tokio runtime to run the demuxer on"),
            Error::Io(e) => write!(f, "IO error: {}", e),
        }
    }
}

impl std::error::Error for Error {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Error::SinkOpen { source, .. } | Error::SinkPush { source, .. } => Some(source),
            Error::Io(e) => Some(e),
            _ => None,
        }
    }
}

impl From<io::Error> for Error {
    fn from(err: io::Error) -> Self {
        Error::Io(err)
    }
}

/// Failure reported by a packet sink
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SinkError {
    message: String,
}

impl SinkError {
    /// Create a sink error with a description
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }

    /// Error description
    pub fn message(&self) -> &str {
        &self.message
    }
}

impl fmt::Display for SinkError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.message)
    }
}

impl std::error::Error for SinkError {}

impl From<io::Error> for SinkError {
    fn from(err: io::Error) -> Self {
        SinkError::new(err.to_string())
    }
}
