//! Config packet merger
//!
//! Video decoders expect codec parameter sets (SPS/PPS, VPS, sequence
//! headers) in the same buffer as the frame they apply to. The device sends
//! them as separate config packets, so they are held here and prepended to
//! the next media packet:
//!
//! ```text
//! in:  [config A] [config B] [frame pts=10]
//! out:                       [A + B + frame, pts=10]
//! ```
//!
//! Only video streams go through the merger.

use bytes::Bytes;

use super::packet::Packet;
use crate::error::{Error, Result};

/// Default limit on pending config data (4MB)
pub const DEFAULT_MAX_CONFIG_SIZE: usize = 4 * 1024 * 1024;

/// Holds config packets until the next media packet arrives
#[derive(Debug)]
pub struct PacketMerger {
    /// Concatenated payloads of the pending config packets
    pending: Vec<u8>,
    /// Number of config packets in `pending`
    pending_count: usize,
    /// Maximum size of `pending` in bytes
    max_size: usize,
}

impl PacketMerger {
    /// Create an empty merger with the default size limit
    pub fn new() -> Self {
        Self::with_max_size(DEFAULT_MAX_CONFIG_SIZE)
    }

    /// Create an empty merger holding at most `max_size` bytes of config data
    pub fn with_max_size(max_size: usize) -> Self {
        Self {
            pending: Vec::new(),
            pending_count: 0,
            max_size,
        }
    }

    /// Feed one packet
    ///
    /// Config packets are absorbed and `Ok(None)` is returned. A media packet
    /// is returned with every pending config payload prepended, in arrival
    /// order, keeping its own timestamp and flags. On error the packet is
    /// dropped and the pending config data is kept.
    pub fn merge(&mut self, packet: Packet) -> Result<Option<Packet>> {
        if packet.config {
            self.append(&packet.data)?;
            self.pending_count += 1;
            return Ok(None);
        }

        if self.pending_count == 0 {
            return Ok(Some(packet));
        }

        let requested = self.pending.len() + packet.data.len();
        self.pending
            .try_reserve_exact(packet.data.len())
            .map_err(|_| Error::OutOfMemory { requested })?;

        let mut data = std::mem::take(&mut self.pending);
        self.pending_count = 0;
        data.extend_from_slice(&packet.data);

        Ok(Some(Packet {
            data: Bytes::from(data),
            ..packet
        }))
    }

    /// Check if config data is waiting for a media packet
    pub fn has_pending(&self) -> bool {
        self.pending_count > 0
    }

    /// Number of config packets waiting
    pub fn pending_count(&self) -> usize {
        self.pending_count
    }

    /// Size of the pending config data in bytes
    pub fn pending_size(&self) -> usize {
        self.pending.len()
    }

    /// Drop any pending config data
    pub fn clear(&mut self) {
        self.pending = Vec::new();
        self.pending_count = 0;
    }

    fn append(&mut self, data: &[u8]) -> Result<()> {
        let requested = self.pending.len() + data.len();
        if requested > self.max_size {
            return Err(Error::OutOfMemory { requested });
        }
        self.pending
            .try_reserve(data.len())
            .map_err(|_| Error::OutOfMemory { requested })?;
        self.pending.extend_from_slice(data);
        Ok(())
    }
}

impl Default for PacketMerger {
    fn default() -> Self {
        Self::new()
    }
}
