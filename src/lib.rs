//! Demuxer for device screen-mirroring streams
//!
//! A mirroring device sends one socket stream per media type. Each stream
//! starts with a codec tag and carries framed audio or video packets. This
//! crate reads such a stream, rebuilds the packets with their timestamps and
//! flags, and fans them out to sinks such as a decoder and a recorder.
//!
//! # Example
//!
//! ```no_run
//! use mirror_demux::{net, ChannelSink, Demuxer, SinkEvent};
//!
//! # async fn example() -> mirror_demux::Result<()> {
//! let (socket, _interrupter) = net::connect("127.0.0.1:27183".parse().unwrap()).await?;
//!
//! let (sink, mut events) = ChannelSink::new();
//! let mut demuxer = Demuxer::new("video", socket, |name, eos| {
//!     println!("{} ended (eos: {})", name, eos);
//! });
//! demuxer.add_sink(sink)?;
//!
//! let handle = demuxer.start()?;
//! while let Some(event) = events.recv().await {
//!     if let SinkEvent::Packet(packet) = event {
//!         println!("{} bytes, pts {:?}", packet.len(), packet.pts);
//!     }
//! }
//! handle.join().await;
//! # Ok(())
//! # }
//! ```

pub mod error;
pub mod media;
pub mod net;
pub mod protocol;
pub mod session;
pub mod sink;
pub mod stats;

pub use error::{Error, ErrorCategory, Result, SinkError};
pub use media::{Packet, PacketMerger};
pub use protocol::{CodecDescriptor, CodecId, CodecLookup, MediaType};
pub use session::{Demuxer, DemuxerConfig, DemuxerExit, DemuxerHandle, MergePolicy, StreamEnd};
pub use sink::{ChannelSink, PacketSink, SinkEvent, SinkSet};
pub use stats::DemuxerStats;
