//! Demuxer configuration

use crate::media::merger::DEFAULT_MAX_CONFIG_SIZE;

/// Whether config packets are merged into the following media packet
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum MergePolicy {
    /// Merge for video codecs only
    #[default]
    Auto,
    /// Merge for every codec
    Always,
    /// Deliver config packets to the sinks as they arrive
    Never,
}

impl MergePolicy {
    /// Decide for a stream
    pub fn applies(&self, is_video: bool) -> bool {
        match self {
            MergePolicy::Auto => is_video,
            MergePolicy::Always => true,
            MergePolicy::Never => false,
        }
    }
}

/// Demuxer configuration options
#[derive(Debug, Clone)]
pub struct DemuxerConfig {
    /// Maximum number of sinks (a decoder and a recorder by default)
    pub max_sinks: usize,

    /// Socket read buffer size (0 = unbuffered)
    pub read_buffer_size: usize,

    /// Config packet merging
    pub merge_policy: MergePolicy,

    /// Maximum size of config data held for the next media packet
    pub max_config_size: usize,
}

impl Default for DemuxerConfig {
    fn default() -> Self {
        Self {
            max_sinks: 2,
            read_buffer_size: 64 * 1024, // 64KB
            merge_policy: MergePolicy::Auto,
            max_config_size: DEFAULT_MAX_CONFIG_SIZE,
        }
    }
}

impl DemuxerConfig {
    /// Set maximum number of sinks
    pub fn max_sinks(mut self, max: usize) -> Self {
        self.max_sinks = max;
        self
    }

    /// Set the socket read buffer size
    pub fn read_buffer_size(mut self, size: usize) -> Self {
        self.read_buffer_size = size;
        self
    }

    /// Set the maximum size of pending config data
    pub fn max_config_size(mut self, size: usize) -> Self {
        self.max_config_size = size;
        self
    }

    /// Set the config packet merge policy
    pub fn merge_policy(mut self, policy: MergePolicy) -> Self {
        self.merge_policy = policy;
        self
    }
}
