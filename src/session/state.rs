//! Demuxer state machine
//!
//! Tracks a demuxer session from the codec handshake to its terminal state.
//!
//! ```text
//! ReadingCodec ──► ResolvingCodec ──► OpeningSinks ──► Streaming
//!      │                 │                  │              │
//!      └─────────────────┴──────────────────┴──────────────┴──► Ended(end)
//! ```

use std::fmt;

/// How a session ended
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StreamEnd {
    /// The device closed the stream (or the socket was interrupted)
    EndOfStream,
    /// A protocol, resource or sink error stopped the session
    Error,
}

impl StreamEnd {
    /// Check if the session ended gracefully
    pub fn is_end_of_stream(&self) -> bool {
        *self == StreamEnd::EndOfStream
    }
}

impl fmt::Display for StreamEnd {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StreamEnd::EndOfStream => f.write_str("end of stream"),
            StreamEnd::Error => f.write_str("error"),
        }
    }
}

/// Session lifecycle phase
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DemuxerPhase {
    /// Waiting for the codec handshake
    ReadingCodec,
    /// Looking up a decoder for the announced codec
    ResolvingCodec,
    /// Opening the sinks
    OpeningSinks,
    /// Reading and dispatching packets
    Streaming,
    /// Terminal
    Ended(StreamEnd),
}

impl DemuxerPhase {
    /// Check if the phase is terminal
    pub fn is_ended(&self) -> bool {
        matches!(self, DemuxerPhase::Ended(_))
    }

    /// Move to the next phase; terminal phases never change
    pub(crate) fn advance(&mut self, next: DemuxerPhase) {
        if !self.is_ended() {
            *self = next;
        }
    }
}
