//! Demuxed media packet

use bytes::Bytes;

use crate::protocol::header::PtsFlags;

/// A single audio or video packet
///
/// Cheap to clone: the payload is reference counted, so every sink sees the
/// same allocation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Packet {
    /// Raw packet payload
    pub data: Bytes,
    /// Presentation timestamp, `None` for config packets
    pub pts: Option<u64>,
    /// Whether this packet is a key frame
    pub key_frame: bool,
    /// Whether this packet carries codec configuration
    pub config: bool,
}

impl Packet {
    /// Create a media (non-config) packet
    pub fn media(data: Bytes, pts: u64, key_frame: bool) -> Self {
        Self {
            data,
            pts: Some(pts),
            key_frame,
            config: false,
        }
    }

    /// Create a config packet
    pub fn config(data: Bytes) -> Self {
        Self {
            data,
            pts: None,
            key_frame: false,
            config: true,
        }
    }

    /// Build a packet from decoded header flags and its payload
    pub fn from_flags(flags: PtsFlags, data: Bytes) -> Self {
        Self {
            data,
            pts: flags.timestamp(),
            key_frame: flags.key_frame,
            config: flags.config,
        }
    }

    /// Decode timestamp (always equal to the presentation timestamp)
    pub fn dts(&self) -> Option<u64> {
        self.pts
    }

    /// Payload size in bytes
    pub fn len(&self) -> usize {
        self.data.len()
    }

    /// Check if the payload is empty
    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_config_from_flags() {
        let flags = PtsFlags {
            pts: 99,
            key_frame: false,
            config: true,
        };
        let packet = Packet::from_flags(flags, Bytes::from_static(b"sps"));
        assert!(packet.config);
        assert_eq!(packet.pts, None);
        assert_eq!(packet.dts(), None);
    }

    #[test]
    fn test_media_from_flags() {
        let flags = PtsFlags {
            pts: 16_666,
            key_frame: true,
            config: false,
        };
        let packet = Packet::from_flags(flags, Bytes::from_static(b"frame"));
        assert_eq!(packet, Packet::media(Bytes::from_static(b"frame"), 16_666, true));
        assert_eq!(packet.dts(), Some(16_666));
        assert_eq!(packet.len(), 5);
    }
}
