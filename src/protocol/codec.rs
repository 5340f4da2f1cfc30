//! Codec identification
//!
//! The first 4 bytes of every stream name the codec in use. Tags are ASCII
//! strings read as a big-endian `u32`:
//!
//! ```text
//! "h264" 0x68323634  video
//! "h265" 0x68323635  video
//! "\0av1" 0x00617631 video
//! "opus" 0x6f707573  audio
//! ```
//!
//! Resolving a tag to something a sink can be opened with goes through a
//! [`CodecLookup`], so the set of decoders actually available can be
//! narrowed by the caller.

use std::fmt;

use super::constants::{CODEC_ID_AV1, CODEC_ID_H264, CODEC_ID_H265, CODEC_ID_OPUS};

/// Supported codecs
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CodecId {
    H264,
    H265,
    Av1,
    Opus,
}

impl CodecId {
    /// Map a raw handshake tag to a codec
    pub fn from_tag(tag: u32) -> Option<Self> {
        match tag {
            CODEC_ID_H264 => Some(CodecId::H264),
            CODEC_ID_H265 => Some(CodecId::H265),
            CODEC_ID_AV1 => Some(CodecId::Av1),
            CODEC_ID_OPUS => Some(CodecId::Opus),
            _ => None,
        }
    }

    /// Raw handshake tag for this codec
    pub fn tag(&self) -> u32 {
        match self {
            CodecId::H264 => CODEC_ID_H264,
            CodecId::H265 => CODEC_ID_H265,
            CodecId::Av1 => CODEC_ID_AV1,
            CodecId::Opus => CODEC_ID_OPUS,
        }
    }

    /// Kind of media carried by streams of this codec
    pub fn media_type(&self) -> MediaType {
        match self {
            CodecId::H264 | CodecId::H265 | CodecId::Av1 => MediaType::Video,
            CodecId::Opus => MediaType::Audio,
        }
    }

    /// Short lowercase name
    pub fn name(&self) -> &'static str {
        match self {
            CodecId::H264 => "h264",
            CodecId::H265 => "h265",
            CodecId::Av1 => "av1",
            CodecId::Opus => "opus",
        }
    }
}

impl fmt::Display for CodecId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Media type of a stream
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MediaType {
    Video,
    Audio,
}

/// Decoder capability handed to sinks when they are opened
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CodecDescriptor {
    /// Codec of the stream
    pub id: CodecId,
    /// Media type of the stream
    pub media_type: MediaType,
    /// Decoder name
    pub name: &'static str,
}

impl CodecDescriptor {
    /// Descriptor for a codec, using its default decoder name
    pub fn new(id: CodecId) -> Self {
        Self {
            id,
            media_type: id.media_type(),
            name: id.name(),
        }
    }

    /// Check if this is a video codec
    pub fn is_video(&self) -> bool {
        self.media_type == MediaType::Video
    }
}

/// Resolves a codec to a decoder capability
pub trait CodecLookup: Send + Sync {
    /// Find a decoder for the codec, if one is available
    fn find_decoder(&self, id: CodecId) -> Option<CodecDescriptor>;
}

/// Lookup that supports every codec the protocol can announce
#[derive(Debug, Clone, Copy, Default)]
pub struct BuiltinCodecs;

impl CodecLookup for BuiltinCodecs {
    fn find_decoder(&self, id: CodecId) -> Option<CodecDescriptor> {
        Some(CodecDescriptor::new(id))
    }
}

/// Lookup restricted to an explicit list of codecs
#[derive(Debug, Clone, Default)]
pub struct CodecSet {
    codecs: Vec<CodecId>,
}

impl CodecSet {
    /// Create a lookup that only knows the given codecs
    pub fn new(codecs: impl IntoIterator<Item = CodecId>) -> Self {
        Self {
            codecs: codecs.into_iter().collect(),
        }
    }
}

impl CodecLookup for CodecSet {
    fn find_decoder(&self, id: CodecId) -> Option<CodecDescriptor> {
        self.codecs
            .contains(&id)
            .then(|| CodecDescriptor::new(id))
    }
}
