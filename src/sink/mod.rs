//! Packet sinks
//!
//! A sink consumes the demuxed packet stream: typically a decoder feeding
//! the display, or a recorder writing a file. The demuxer drives every
//! registered sink through the same lifecycle:
//!
//! ```text
//! open(codec) ──► push(packet)* ──► close()
//! ```
//!
//! `close` is only called on sinks whose `open` succeeded. All calls happen
//! on the demuxer task, so a sink that does heavy work should hand packets
//! off to another task (see [`ChannelSink`]).

use std::sync::{Arc, Mutex, PoisonError};

use crate::error::SinkError;
use crate::media::packet::Packet;
use crate::protocol::codec::CodecDescriptor;

pub mod channel;
pub mod fanout;

pub use channel::{ChannelSink, SinkEvent, DEFAULT_CHANNEL_CAPACITY};
pub use fanout::SinkSet;

/// Consumer of demuxed packets
pub trait PacketSink: Send {
    /// Prepare to receive packets of the given codec
    fn open(&mut self, codec: &CodecDescriptor) -> Result<(), SinkError>;

    /// Consume one packet
    ///
    /// The packet is shared with the other sinks; clone it (cheaply) to keep
    /// it beyond this call.
    fn push(&mut self, packet: &Packet) -> Result<(), SinkError>;

    /// Release resources acquired by `open`
    fn close(&mut self);
}

impl<S: PacketSink + ?Sized> PacketSink for Box<S> {
    fn open(&mut self, codec: &CodecDescriptor) -> Result<(), SinkError> {
        (**self).open(codec)
    }

    fn push(&mut self, packet: &Packet) -> Result<(), SinkError> {
        (**self).push(packet)
    }

    fn close(&mut self) {
        (**self).close()
    }
}

/// Shared sink, for callers that keep ownership of their sink while the
/// demuxer runs
impl<S: PacketSink + ?Sized> PacketSink for Arc<Mutex<S>> {
    fn open(&mut self, codec: &CodecDescriptor) -> Result<(), SinkError> {
        self.lock()
            .map_err(|_| SinkError::new("sink lock poisoned"))?
            .open(codec)
    }

    fn push(&mut self, packet: &Packet) -> Result<(), SinkError> {
        self.lock()
            .map_err(|_| SinkError::new("sink lock poisoned"))?
            .push(packet)
    }

    fn close(&mut self) {
        let mut sink = self.lock().unwrap_or_else(|poisoned| {
            tracing::warn!("Closing sink with poisoned lock");
            PoisonError::into_inner(poisoned)
        });
        sink.close();
    }
}
