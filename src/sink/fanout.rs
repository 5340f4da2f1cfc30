//! Sink fan-out
//!
//! Owns the ordered list of sinks registered on a demuxer. Opening is
//! transactional: either every sink is open or none is. Pushing is a
//! broadcast that stops at the first failing sink, without rollback.

use super::PacketSink;
use crate::error::{Error, Result};
use crate::media::packet::Packet;
use crate::protocol::codec::CodecDescriptor;

/// Ordered set of sinks
pub struct SinkSet {
    sinks: Vec<Box<dyn PacketSink>>,
    max_sinks: usize,
    /// Number of leading sinks currently open
    open_count: usize,
}

impl SinkSet {
    /// Create an empty set accepting at most `max_sinks` sinks
    pub fn new(max_sinks: usize) -> Self {
        Self {
            sinks: Vec::with_capacity(max_sinks),
            max_sinks,
            open_count: 0,
        }
    }

    /// Register a sink after the existing ones
    pub fn add(&mut self, sink: Box<dyn PacketSink>) -> Result<()> {
        if self.sinks.len() >= self.max_sinks {
            return Err(Error::TooManySinks {
                max: self.max_sinks,
            });
        }
        self.sinks.push(sink);
        Ok(())
    }

    /// Number of registered sinks
    pub fn len(&self) -> usize {
        self.sinks.len()
    }

    /// Check if no sink is registered
    pub fn is_empty(&self) -> bool {
        self.sinks.is_empty()
    }

    /// Check if the sinks are open
    pub fn is_open(&self) -> bool {
        self.open_count > 0
    }

    /// Open every sink in registration order
    ///
    /// If a sink fails, the sinks opened before it are closed in reverse
    /// order and the error is returned.
    pub fn open(&mut self, codec: &CodecDescriptor) -> Result<()> {
        for index in 0..self.sinks.len() {
            if let Err(source) = self.sinks[index].open(codec) {
                self.close();
                return Err(Error::SinkOpen { index, source });
            }
            self.open_count = index + 1;
        }
        Ok(())
    }

    /// Push a packet to every sink in registration order
    pub fn push(&mut self, packet: &Packet) -> Result<()> {
        for (index, sink) in self.sinks[..self.open_count].iter_mut().enumerate() {
            sink.push(packet)
                .map_err(|source| Error::SinkPush { index, source })?;
        }
        Ok(())
    }

    /// Close the open sinks in reverse registration order
    ///
    /// Calling this again, or on sinks that were never opened, does nothing.
    pub fn close(&mut self) {
        while self.open_count > 0 {
            self.open_count -= 1;
            self.sinks[self.open_count].close();
        }
    }
}

impl std::fmt::Debug for SinkSet {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SinkSet")
            .field("sinks", &self.sinks.len())
            .field("max_sinks", &self.max_sinks)
            .field("open_count", &self.open_count)
            .finish()
    }
}

impl Drop for SinkSet {
    fn drop(&mut self) {
        self.close();
    }
}
