//! Wire protocol constants

/// Size of the codec handshake sent once at the start of a stream
pub const CODEC_ID_SIZE: usize = 4;

/// Size of the header preceding every packet payload
pub const PACKET_HEADER_SIZE: usize = 12;

/// Payloads are read in chunks of this size so that memory grows with the
/// bytes actually received rather than with the declared length
pub const PAYLOAD_CHUNK_SIZE: usize = 64 * 1024;

/// Bit 63 of the PTS word: the packet carries codec configuration
pub const PACKET_FLAG_CONFIG: u64 = 1 << 63;

/// Bit 62 of the PTS word: the packet is a key frame
pub const PACKET_FLAG_KEY_FRAME: u64 = 1 << 62;

/// Bits 0-61 of the PTS word hold the timestamp
pub const PACKET_PTS_MASK: u64 = PACKET_FLAG_KEY_FRAME - 1;

/// "h264" in ASCII
pub const CODEC_ID_H264: u32 = 0x6832_3634;

/// "h265" in ASCII
pub const CODEC_ID_H265: u32 = 0x6832_3635;

/// "av1" in ASCII, left-padded with a zero byte
pub const CODEC_ID_AV1: u32 = 0x0061_7631;

/// "opus" in ASCII
pub const CODEC_ID_OPUS: u32 = 0x6f70_7573;
