//! Media packets
//!
//! This module provides:
//! - The demuxed packet type shared by every sink
//! - Config packet merging for video streams

pub mod merger;
pub mod packet;

pub use merger::PacketMerger;
pub use packet::Packet;
