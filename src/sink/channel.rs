//! Channel sink
//!
//! Forwards the sink lifecycle into a tokio channel so packets can be
//! consumed on another task without blocking the demuxer.
//!
//! The channel is bounded. A consumer that falls behind makes `push` fail,
//! which ends the session instead of buffering without limit.

use tokio::sync::mpsc::{self, error::TrySendError};

use super::PacketSink;
use crate::error::SinkError;
use crate::media::packet::Packet;
use crate::protocol::codec::CodecDescriptor;

/// Event delivered by a [`ChannelSink`]
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SinkEvent {
    /// The stream started with this codec
    Opened(CodecDescriptor),
    /// A packet was demuxed
    Packet(Packet),
    /// The stream ended
    Closed,
}

/// Default number of events buffered by a [`ChannelSink`]
pub const DEFAULT_CHANNEL_CAPACITY: usize = 256;

/// Sink that sends every event to a bounded channel
#[derive(Debug)]
pub struct ChannelSink {
    tx: mpsc::Sender<SinkEvent>,
}

impl ChannelSink {
    /// Create a sink and the receiver for its events
    pub fn new() -> (Self, mpsc::Receiver<SinkEvent>) {
        Self::with_capacity(DEFAULT_CHANNEL_CAPACITY)
    }

    /// Create a sink buffering at most `capacity` events
    ///
    /// # Panics
    ///
    /// Panics if `capacity` is zero.
    pub fn with_capacity(capacity: usize) -> (Self, mpsc::Receiver<SinkEvent>) {
        let (tx, rx) = mpsc::channel(capacity);
        (Self { tx }, rx)
    }

    fn send(&self, event: SinkEvent) -> Result<(), SinkError> {
        self.tx.try_send(event).map_err(|e| match e {
            TrySendError::Full(_) => SinkError::new("channel full"),
            TrySendError::Closed(_) => SinkError::new("channel receiver dropped"),
        })
    }
}

impl PacketSink for ChannelSink {
    fn open(&mut self, codec: &CodecDescriptor) -> Result<(), SinkError> {
        self.send(SinkEvent::Opened(codec.clone()))
    }

    fn push(&mut self, packet: &Packet) -> Result<(), SinkError> {
        self.send(SinkEvent::Packet(packet.clone()))
    }

    fn close(&mut self) {
        // The receiver may already be gone, or full
        if let Err(e) = self.send(SinkEvent::Closed) {
            tracing::debug!(error = %e, "Close event not delivered");
        }
    }
}
