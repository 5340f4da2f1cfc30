//! Statistics for demuxer sessions

use std::time::{Duration, Instant};

/// Per-session counters, maintained by the demuxer task
#[derive(Debug, Clone)]
pub struct DemuxerStats {
    /// Session start time
    pub started_at: Instant,
    /// Total bytes read from the socket
    pub bytes_received: u64,
    /// Packets delivered to the sinks
    pub packets: u64,
    /// Payload bytes delivered to the sinks
    pub payload_bytes: u64,
    /// Key frames delivered
    pub key_frames: u64,
    /// Config packets received
    pub config_packets: u64,
    /// Delivered packets that carried merged config data
    pub merged_packets: u64,
    /// Timestamp of the last delivered packet
    pub last_pts: Option<u64>,
}

impl DemuxerStats {
    /// Start counting
    pub fn new() -> Self {
        Self {
            started_at: Instant::now(),
            bytes_received: 0,
            packets: 0,
            payload_bytes: 0,
            key_frames: 0,
            config_packets: 0,
            merged_packets: 0,
            last_pts: None,
        }
    }

    /// Record a config packet read from the socket
    pub fn on_config(&mut self) {
        self.config_packets += 1;
    }

    /// Record a packet delivered to the sinks
    pub fn on_delivered(&mut self, size: usize, key_frame: bool, pts: Option<u64>, merged: bool) {
        self.packets += 1;
        self.payload_bytes += size as u64;
        if key_frame {
            self.key_frames += 1;
        }
        if merged {
            self.merged_packets += 1;
        }
        if pts.is_some() {
            self.last_pts = pts;
        }
    }

    /// Time since the session started
    pub fn duration(&self) -> Duration {
        self.started_at.elapsed()
    }

    /// Bitrate of the received stream in bits per second
    pub fn bitrate(&self) -> u64 {
        let secs = self.duration().as_secs();
        if secs > 0 {
            (self.bytes_received * 8) / secs
        } else {
            0
        }
    }
}

impl Default for DemuxerStats {
    fn default() -> Self {
        Self::new()
    }
}
