//! Packet header encoding
//!
//! Every packet on the wire is preceded by a 12-byte header:
//!
//! ```text
//! [. . . . . . . .|. . . .]. . . . . . . . . . . . . . . ...
//!  <-------------> <-----> <-----------------------------...
//!    PTS + flags    packet         raw packet
//!                    size
//! ```
//!
//! The two most significant bits of the PTS word are flags:
//!
//! ```text
//!  byte 7   byte 6   byte 5   byte 4   byte 3   byte 2   byte 1   byte 0
//! CK...... ........ ........ ........ ........ ........ ........ ........
//! ^^<------------------------------------------------------------------->
//! ||                                PTS
//! | `- key frame
//!  `-- config packet
//! ```

use bytes::{Buf, BufMut};

use super::constants::{
    PACKET_FLAG_CONFIG, PACKET_FLAG_KEY_FRAME, PACKET_HEADER_SIZE, PACKET_PTS_MASK,
};

/// Decoded PTS word
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct PtsFlags {
    /// Timestamp, 62 bits
    pub pts: u64,
    /// Key frame flag (bit 62)
    pub key_frame: bool,
    /// Config packet flag (bit 63)
    pub config: bool,
}

impl PtsFlags {
    /// Split a raw PTS word into timestamp and flags
    pub fn unpack(word: u64) -> Self {
        Self {
            pts: word & PACKET_PTS_MASK,
            key_frame: word & PACKET_FLAG_KEY_FRAME != 0,
            config: word & PACKET_FLAG_CONFIG != 0,
        }
    }

    /// Build the raw PTS word; timestamp bits above 61 are dropped
    pub fn pack(&self) -> u64 {
        let mut word = self.pts & PACKET_PTS_MASK;
        if self.key_frame {
            word |= PACKET_FLAG_KEY_FRAME;
        }
        if self.config {
            word |= PACKET_FLAG_CONFIG;
        }
        word
    }

    /// Timestamp the packet is presented at, `None` for config packets
    pub fn timestamp(&self) -> Option<u64> {
        if self.config {
            None
        } else {
            Some(self.pts)
        }
    }
}

/// Full packet header
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PacketHeader {
    /// PTS and flags
    pub flags: PtsFlags,
    /// Payload length in bytes
    pub len: u32,
}

impl PacketHeader {
    /// Decode a header
    pub fn decode(buf: &[u8; PACKET_HEADER_SIZE]) -> Self {
        let mut buf = &buf[..];
        let word = buf.get_u64();
        let len = buf.get_u32();
        Self {
            flags: PtsFlags::unpack(word),
            len,
        }
    }

    /// Encode a header
    pub fn encode(&self) -> [u8; PACKET_HEADER_SIZE] {
        let mut out = [0u8; PACKET_HEADER_SIZE];
        let mut buf = &mut out[..];
        buf.put_u64(self.flags.pack());
        buf.put_u32(self.len);
        out
    }
}
