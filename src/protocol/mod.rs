//! Mirroring stream wire protocol
//!
//! A stream starts with a 4-byte codec tag, followed by packets until the
//! device disconnects:
//!
//! ```text
//! +-----------+----------------------+---------+----------------------+---------+
//! | codec (4) | pts+flags (8) len (4) | payload | pts+flags (8) len (4) | payload | ...
//! +-----------+----------------------+---------+----------------------+---------+
//! ```
//!
//! All integers are big-endian.

pub mod codec;
pub mod constants;
pub mod header;
pub mod reader;
pub mod writer;

pub use codec::{BuiltinCodecs, CodecDescriptor, CodecId, CodecLookup, CodecSet, MediaType};
pub use header::{PacketHeader, PtsFlags};
pub use reader::StreamReader;
pub use writer::{encode_packet, write_codec_id, write_packet, write_raw_codec_id};
