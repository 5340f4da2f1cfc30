//! Demuxer session
//!
//! Owns the device socket and the registered sinks, and runs the demuxing
//! loop on its own tokio task:
//!
//! 1. Read the codec tag and resolve it to a decoder
//! 2. Open every sink (all or nothing)
//! 3. Read packets, merge config packets for video, push to every sink
//! 4. Close the sinks and notify the owner
//!
//! The owner is notified exactly once, through the `on_ended` callback, with
//! `true` if the device closed the stream and `false` on any error. To stop a
//! session early, close its socket (see [`crate::net::SocketInterrupter`]):
//! the pending read fails and the session ends as end of stream.

use std::sync::Arc;

use tokio::io::{AsyncRead, BufReader};
use tokio::task::JoinHandle;

use super::config::{DemuxerConfig, MergePolicy};
use super::state::{DemuxerPhase, StreamEnd};
use crate::error::{Error, Result};
use crate::media::merger::PacketMerger;
use crate::protocol::codec::{BuiltinCodecs, CodecId, CodecLookup};
use crate::protocol::reader::StreamReader;
use crate::sink::{PacketSink, SinkSet};
use crate::stats::DemuxerStats;

/// Completion callback, receiving the demuxer name and whether the session
/// ended on end of stream
pub type OnEnded = Box<dyn FnOnce(&str, bool) + Send + 'static>;

/// Demuxer session, configured before it is started
pub struct Demuxer<R> {
    name: &'static str,
    socket: R,
    config: DemuxerConfig,
    sinks: SinkSet,
    codecs: Arc<dyn CodecLookup>,
    on_ended: OnEnded,
}

impl<R> Demuxer<R>
where
    R: AsyncRead + Unpin + Send + 'static,
{
    /// Create a demuxer with the default configuration
    ///
    /// `name` identifies the demuxer in logs (e.g. "video", "audio").
    pub fn new<F>(name: &'static str, socket: R, on_ended: F) -> Self
    where
        F: FnOnce(&str, bool) + Send + 'static,
    {
        Self::with_config(name, socket, DemuxerConfig::default(), on_ended)
    }

    /// Create a demuxer with a custom configuration
    pub fn with_config<F>(name: &'static str, socket: R, config: DemuxerConfig, on_ended: F) -> Self
    where
        F: FnOnce(&str, bool) + Send + 'static,
    {
        Self {
            name,
            socket,
            sinks: SinkSet::new(config.max_sinks),
            config,
            codecs: Arc::new(BuiltinCodecs),
            on_ended: Box::new(on_ended),
        }
    }

    /// Use a custom decoder lookup
    pub fn with_codec_lookup<L>(mut self, codecs: L) -> Self
    where
        L: CodecLookup + 'static,
    {
        self.codecs = Arc::new(codecs);
        self
    }

    /// Get the demuxer name
    pub fn name(&self) -> &'static str {
        self.name
    }

    /// Register a sink
    ///
    /// Sinks receive packets in registration order. Fails if the configured
    /// maximum is reached.
    pub fn add_sink<S>(&mut self, sink: S) -> Result<()>
    where
        S: PacketSink + 'static,
    {
        self.sinks.add(Box::new(sink))
    }

    /// Number of registered sinks
    pub fn sink_count(&self) -> usize {
        self.sinks.len()
    }

    /// Spawn the demuxing task on the current tokio runtime
    pub fn start(self) -> Result<DemuxerHandle> {
        let runtime = tokio::runtime::Handle::try_current().map_err(|_| {
            tracing::error!(demuxer = self.name, "Could not start demuxer task");
            Error::NoRuntime
        })?;

        tracing::debug!(demuxer = self.name, sinks = self.sinks.len(), "Starting demuxer");

        let name = self.name;
        let task = runtime.spawn(self.run());
        Ok(DemuxerHandle { name, task })
    }

    async fn run(self) -> DemuxerExit {
        let Demuxer {
            name,
            socket,
            config,
            sinks,
            codecs,
            on_ended,
        } = self;

        let mut teardown = Teardown::new(name, sinks, on_ended);
        let merge_policy = config.merge_policy;
        let max_config_size = config.max_config_size;
        let (end, stats) = if config.read_buffer_size > 0 {
            let socket = BufReader::with_capacity(config.read_buffer_size, socket);
            Pump::new(name, socket, &*codecs, merge_policy, max_config_size)
                .run(&mut teardown.sinks)
                .await
        } else {
            Pump::new(name, socket, &*codecs, merge_policy, max_config_size)
                .run(&mut teardown.sinks)
                .await
        };

        teardown.finish(end);

        tracing::info!(
            demuxer = name,
            end = %end,
            packets = stats.packets,
            bytes = stats.bytes_received,
            payload_bytes = stats.payload_bytes,
            key_frames = stats.key_frames,
            config_packets = stats.config_packets,
            merged_packets = stats.merged_packets,
            last_pts = ?stats.last_pts,
            bitrate = stats.bitrate(),
            "Demuxer ended"
        );

        DemuxerExit { end, stats }
    }
}

/// Closes the sinks and fires the completion callback exactly once
///
/// If the session task unwinds or is dropped before `finish`, the sinks are
/// closed and the callback reports an error.
struct Teardown {
    name: &'static str,
    sinks: SinkSet,
    on_ended: Option<OnEnded>,
}

impl Teardown {
    fn new(name: &'static str, sinks: SinkSet, on_ended: OnEnded) -> Self {
        Self {
            name,
            sinks,
            on_ended: Some(on_ended),
        }
    }

    fn finish(&mut self, end: StreamEnd) {
        self.sinks.close();
        if let Some(on_ended) = self.on_ended.take() {
            on_ended(self.name, end.is_end_of_stream());
        }
    }
}

impl Drop for Teardown {
    fn drop(&mut self) {
        if self.on_ended.is_some() {
            tracing::error!(demuxer = self.name, "Demuxer task aborted");
            self.finish(StreamEnd::Error);
        }
    }
}

impl<R> std::fmt::Debug for Demuxer<R> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Demuxer")
            .field("name", &self.name)
            .field("config", &self.config)
            .field("sinks", &self.sinks)
            .finish()
    }
}

/// Result of a finished session
#[derive(Debug, Clone)]
pub struct DemuxerExit {
    /// How the session ended
    pub end: StreamEnd,
    /// Counters collected while streaming
    pub stats: DemuxerStats,
}

/// Handle to a running demuxer
#[derive(Debug)]
pub struct DemuxerHandle {
    name: &'static str,
    task: JoinHandle<DemuxerExit>,
}

impl DemuxerHandle {
    /// Get the demuxer name
    pub fn name(&self) -> &'static str {
        self.name
    }

    /// Check if the demuxer task has finished
    pub fn is_finished(&self) -> bool {
        self.task.is_finished()
    }

    /// Wait for the demuxer to finish
    ///
    /// When this returns, the sinks are closed and the completion callback
    /// has run.
    pub async fn join(self) -> DemuxerExit {
        match self.task.await {
            Ok(exit) => exit,
            Err(e) => {
                tracing::error!(demuxer = self.name, error = %e, "Demuxer task failed");
                DemuxerExit {
                    end: StreamEnd::Error,
                    stats: DemuxerStats::new(),
                }
            }
        }
    }
}

/// The demuxing loop, running on the session task
struct Pump<'a, R> {
    name: &'static str,
    reader: StreamReader<R>,
    codecs: &'a dyn CodecLookup,
    merge_policy: MergePolicy,
    max_config_size: usize,
    phase: DemuxerPhase,
    stats: DemuxerStats,
}

impl<'a, R: AsyncRead + Unpin> Pump<'a, R> {
    fn new(
        name: &'static str,
        socket: R,
        codecs: &'a dyn CodecLookup,
        merge_policy: MergePolicy,
        max_config_size: usize,
    ) -> Self {
        Self {
            name,
            reader: StreamReader::new(socket),
            codecs,
            merge_policy,
            max_config_size,
            phase: DemuxerPhase::ReadingCodec,
            stats: DemuxerStats::new(),
        }
    }

    async fn run(mut self, sinks: &mut SinkSet) -> (StreamEnd, DemuxerStats) {
        let end = match self.demux(sinks).await {
            Ok(()) => StreamEnd::EndOfStream,
            Err(e) => {
                tracing::error!(
                    demuxer = self.name,
                    phase = ?self.phase,
                    category = %e.category(),
                    error = %e,
                    "Demuxer stopped"
                );
                StreamEnd::Error
            }
        };

        sinks.close();
        self.phase.advance(DemuxerPhase::Ended(end));
        self.stats.bytes_received = self.reader.bytes_read();

        (end, self.stats)
    }

    /// Returns `Ok` when the stream ends, an error otherwise
    async fn demux(&mut self, sinks: &mut SinkSet) -> Result<()> {
        let Some(tag) = self.reader.recv_codec_id().await else {
            tracing::debug!(demuxer = self.name, "End of stream before codec id");
            return Ok(());
        };

        self.phase.advance(DemuxerPhase::ResolvingCodec);
        let codec_id = CodecId::from_tag(tag).ok_or(Error::UnknownCodec(tag))?;
        let codec = self
            .codecs
            .find_decoder(codec_id)
            .ok_or(Error::DecoderNotFound(codec_id))?;

        tracing::debug!(demuxer = self.name, codec = %codec_id, "Codec resolved");

        self.phase.advance(DemuxerPhase::OpeningSinks);
        sinks.open(&codec)?;

        self.phase.advance(DemuxerPhase::Streaming);

        // Config packets are merged into the next media packet only for video
        let mut merger = self
            .merge_policy
            .applies(codec.is_video())
            .then(|| PacketMerger::with_max_size(self.max_config_size));

        loop {
            let Some(packet) = self.reader.recv_packet().await? else {
                tracing::debug!(demuxer = self.name, "End of frames");
                return Ok(());
            };

            if packet.config {
                self.stats.on_config();
            }

            let (packet, merged) = match merger.as_mut() {
                Some(merger) => {
                    let had_pending = merger.has_pending();
                    match merger.merge(packet)? {
                        Some(packet) => (packet, had_pending),
                        None => continue,
                    }
                }
                None => (packet, false),
            };

            sinks.push(&packet)?;
            self.stats
                .on_delivered(packet.len(), packet.key_frame, packet.pts, merged);
        }
    }
}
