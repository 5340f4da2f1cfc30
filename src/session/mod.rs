//! Demuxer sessions
//!
//! A session reads one device stream (video or audio) and feeds it to its
//! sinks until the device disconnects or an error occurs.

pub mod config;
pub mod demuxer;
pub mod state;

pub use config::{DemuxerConfig, MergePolicy};
pub use demuxer::{Demuxer, DemuxerExit, DemuxerHandle, OnEnded};
pub use state::{DemuxerPhase, StreamEnd};
