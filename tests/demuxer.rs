//! End-to-end demuxer sessions over scripted and real sockets

use std::sync::{Arc, Mutex};

use bytes::Bytes;
use tokio::io::AsyncWriteExt;
use tokio::net::TcpListener;

use mirror_demux::protocol::{write_codec_id, write_packet, write_raw_codec_id};
use mirror_demux::{
    net, ChannelSink, CodecDescriptor, CodecId, Demuxer, DemuxerConfig, Packet, PacketSink,
    SinkError, SinkEvent, StreamEnd,
};

type Log = Arc<Mutex<Vec<String>>>;

/// Sink recording its lifecycle into a shared log
struct LogSink {
    id: usize,
    log: Log,
    fail_open: bool,
    fail_push_at: Option<usize>,
    pushed: usize,
}

impl LogSink {
    fn new(id: usize, log: &Log) -> Self {
        Self {
            id,
            log: Arc::clone(log),
            fail_open: false,
            fail_push_at: None,
            pushed: 0,
        }
    }

    fn record(&self, event: String) {
        self.log.lock().unwrap().push(event);
    }
}

impl PacketSink for LogSink {
    fn open(&mut self, codec: &CodecDescriptor) -> Result<(), SinkError> {
        self.record(format!("open:{}:{}", self.id, codec.id));
        if self.fail_open {
            return Err(SinkError::new("cannot open"));
        }
        Ok(())
    }

    fn push(&mut self, packet: &Packet) -> Result<(), SinkError> {
        self.record(format!("push:{}:{}", self.id, packet.len()));
        self.pushed += 1;
        if self.fail_push_at == Some(self.pushed) {
            return Err(SinkError::new("cannot push"));
        }
        Ok(())
    }

    fn close(&mut self) {
        self.record(format!("close:{}", self.id));
    }
}

fn events(log: &Log) -> Vec<String> {
    log.lock().unwrap().clone()
}

/// Counts completion callback invocations and keeps the last flag
#[derive(Clone, Default)]
struct Ended(Arc<Mutex<Vec<(String, bool)>>>);

impl Ended {
    fn callback(&self) -> impl FnOnce(&str, bool) + Send + 'static {
        let calls = Arc::clone(&self.0);
        move |name: &str, eos: bool| calls.lock().unwrap().push((name.to_string(), eos))
    }

    fn calls(&self) -> Vec<(String, bool)> {
        self.0.lock().unwrap().clone()
    }
}

fn config_packet(data: &'static [u8]) -> Packet {
    Packet::config(Bytes::from_static(data))
}

fn media_packet(data: &'static [u8], pts: u64, key_frame: bool) -> Packet {
    Packet::media(Bytes::from_static(data), pts, key_frame)
}

#[tokio::test]
async fn h264_handshake_resolves_first_video_codec() {
    let (mut device, socket) = tokio::io::duplex(1024);
    let log = Log::default();
    let ended = Ended::default();

    let mut demuxer = Demuxer::new("video", socket, ended.callback());
    demuxer.add_sink(LogSink::new(1, &log)).unwrap();
    let handle = demuxer.start().unwrap();

    device.write_all(&[0x68, 0x32, 0x36, 0x34]).await.unwrap();
    drop(device);

    let exit = handle.join().await;
    assert_eq!(exit.end, StreamEnd::EndOfStream);
    assert_eq!(events(&log), ["open:1:h264", "close:1"]);
    assert_eq!(ended.calls(), [("video".to_string(), true)]);
}

#[tokio::test]
async fn unknown_codec_ends_with_error_without_opening_sinks() {
    let (mut device, socket) = tokio::io::duplex(1024);
    let log = Log::default();
    let ended = Ended::default();

    let mut demuxer = Demuxer::new("video", socket, ended.callback());
    demuxer.add_sink(LogSink::new(1, &log)).unwrap();
    demuxer.add_sink(LogSink::new(2, &log)).unwrap();
    let handle = demuxer.start().unwrap();

    write_raw_codec_id(&mut device, 0x0000_0001).await.unwrap();

    let exit = handle.join().await;
    assert_eq!(exit.end, StreamEnd::Error);
    assert!(events(&log).is_empty());
    assert_eq!(ended.calls(), [("video".to_string(), false)]);
}

#[tokio::test]
async fn config_packet_merged_into_next_frame() {
    let (mut device, socket) = tokio::io::duplex(1024);
    let (sink, mut rx) = ChannelSink::new();

    let mut demuxer = Demuxer::new("video", socket, |_, _| {});
    demuxer.add_sink(sink).unwrap();
    let handle = demuxer.start().unwrap();

    write_codec_id(&mut device, CodecId::H264).await.unwrap();
    write_packet(&mut device, &config_packet(b"12345")).await.unwrap();
    write_packet(&mut device, &media_packet(b"abc", 33_000, true))
        .await
        .unwrap();
    drop(device);

    handle.join().await;

    assert!(matches!(rx.recv().await, Some(SinkEvent::Opened(_))));
    match rx.recv().await {
        Some(SinkEvent::Packet(packet)) => {
            assert_eq!(packet.len(), 8);
            assert_eq!(&packet.data[..], b"12345abc");
            assert_eq!(packet.pts, Some(33_000));
            assert!(packet.key_frame);
            assert!(!packet.config);
        }
        other => panic!("expected a packet, got {:?}", other),
    }
    assert_eq!(rx.recv().await, Some(SinkEvent::Closed));
    assert_eq!(rx.recv().await, None);
}

#[tokio::test]
async fn consecutive_config_packets_accumulate() {
    let (mut device, socket) = tokio::io::duplex(4096);
    let (sink, mut rx) = ChannelSink::new();

    let mut demuxer = Demuxer::new("video", socket, |_, _| {});
    demuxer.add_sink(sink).unwrap();
    let handle = demuxer.start().unwrap();

    write_codec_id(&mut device, CodecId::H265).await.unwrap();
    for data in [&b"vps"[..], b"sps", b"pps"] {
        write_packet(&mut device, &Packet::config(Bytes::copy_from_slice(data)))
            .await
            .unwrap();
    }
    write_packet(&mut device, &media_packet(b"idr", 10, true))
        .await
        .unwrap();
    write_packet(&mut device, &media_packet(b"p", 20, false))
        .await
        .unwrap();
    drop(device);

    let exit = handle.join().await;
    assert_eq!(exit.stats.config_packets, 3);
    assert_eq!(exit.stats.packets, 2);

    let mut packets = Vec::new();
    while let Some(event) = rx.recv().await {
        if let SinkEvent::Packet(packet) = event {
            packets.push(packet);
        }
    }
    assert_eq!(packets.len(), 2);
    assert_eq!(&packets[0].data[..], b"vpsspsppsidr");
    assert_eq!(packets[0].pts, Some(10));
    assert_eq!(&packets[1].data[..], b"p");
    assert_eq!(packets[1].pts, Some(20));
}

#[tokio::test]
async fn sink_open_failure_rolls_back_opened_sinks() {
    let (mut device, socket) = tokio::io::duplex(1024);
    let log = Log::default();
    let ended = Ended::default();
    let config = DemuxerConfig::default().max_sinks(4);

    let mut demuxer = Demuxer::with_config("video", socket, config, ended.callback());
    for id in 1..=4 {
        let mut sink = LogSink::new(id, &log);
        sink.fail_open = id == 3;
        demuxer.add_sink(sink).unwrap();
    }
    let handle = demuxer.start().unwrap();

    write_codec_id(&mut device, CodecId::Av1).await.unwrap();

    let exit = handle.join().await;
    assert_eq!(exit.end, StreamEnd::Error);
    assert_eq!(
        events(&log),
        ["open:1:av1", "open:2:av1", "open:3:av1", "close:2", "close:1"]
    );
    assert_eq!(ended.calls(), [("video".to_string(), false)]);
}

#[tokio::test]
async fn sink_push_failure_stops_session() {
    let (mut device, socket) = tokio::io::duplex(1024);
    let log = Log::default();
    let ended = Ended::default();

    let mut demuxer = Demuxer::new("audio", socket, ended.callback());
    let mut first = LogSink::new(1, &log);
    first.fail_push_at = Some(2);
    demuxer.add_sink(first).unwrap();
    demuxer.add_sink(LogSink::new(2, &log)).unwrap();
    let handle = demuxer.start().unwrap();

    write_codec_id(&mut device, CodecId::Opus).await.unwrap();
    for pts in [0, 20_000, 40_000] {
        write_packet(&mut device, &media_packet(b"opus", pts, false))
            .await
            .unwrap();
    }

    let exit = handle.join().await;
    assert_eq!(exit.end, StreamEnd::Error);
    assert_eq!(exit.stats.packets, 1);
    assert_eq!(
        events(&log),
        [
            "open:1:opus",
            "open:2:opus",
            "push:1:4",
            "push:2:4",
            "push:1:4",
            "close:2",
            "close:1"
        ]
    );
    assert_eq!(ended.calls(), [("audio".to_string(), false)]);
}

#[tokio::test]
async fn every_termination_fires_one_callback() {
    // Handshake short read
    let (device, socket) = tokio::io::duplex(64);
    drop(device);
    let ended = Ended::default();
    let exit = Demuxer::new("video", socket, ended.callback())
        .start()
        .unwrap()
        .join()
        .await;
    assert_eq!(exit.end, StreamEnd::EndOfStream);
    assert_eq!(ended.calls(), [("video".to_string(), true)]);

    // Mid-stream short read, inside a payload
    let (mut device, socket) = tokio::io::duplex(64);
    let ended = Ended::default();
    let handle = Demuxer::new("video", socket, ended.callback())
        .start()
        .unwrap();
    write_codec_id(&mut device, CodecId::H264).await.unwrap();
    device
        .write_all(&[0, 0, 0, 0, 0, 0, 0, 1, 0, 0, 0, 10, 1, 2, 3])
        .await
        .unwrap();
    drop(device);
    assert_eq!(handle.join().await.end, StreamEnd::EndOfStream);
    assert_eq!(ended.calls(), [("video".to_string(), true)]);

    // Protocol error: zero-length payload
    let (mut device, socket) = tokio::io::duplex(64);
    let ended = Ended::default();
    let handle = Demuxer::new("video", socket, ended.callback())
        .start()
        .unwrap();
    write_codec_id(&mut device, CodecId::H264).await.unwrap();
    device.write_all(&[0u8; 12]).await.unwrap();
    assert_eq!(handle.join().await.end, StreamEnd::Error);
    assert_eq!(ended.calls(), [("video".to_string(), false)]);
}

#[tokio::test]
async fn interrupted_socket_ends_as_end_of_stream() {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let (connected, accepted) = tokio::join!(net::connect(addr), listener.accept());
    let (socket, interrupter) = connected.unwrap();
    let (mut device, _) = accepted.unwrap();

    let log = Log::default();
    let ended = Ended::default();
    let (sink, mut rx) = ChannelSink::new();

    let mut demuxer = Demuxer::new("video", socket, ended.callback());
    demuxer.add_sink(LogSink::new(1, &log)).unwrap();
    demuxer.add_sink(sink).unwrap();
    let handle = demuxer.start().unwrap();

    write_codec_id(&mut device, CodecId::H264).await.unwrap();
    write_packet(&mut device, &media_packet(b"frame", 0, true))
        .await
        .unwrap();
    device.flush().await.unwrap();

    // Wait until the session is streaming before cutting it off
    assert!(matches!(rx.recv().await, Some(SinkEvent::Opened(_))));
    assert!(matches!(rx.recv().await, Some(SinkEvent::Packet(_))));

    interrupter.interrupt().unwrap();

    let exit = handle.join().await;
    assert_eq!(exit.end, StreamEnd::EndOfStream);
    assert_eq!(exit.stats.packets, 1);
    assert_eq!(
        events(&log),
        ["open:1:h264", "push:1:5", "close:1"]
    );
    assert_eq!(rx.recv().await, Some(SinkEvent::Closed));
    assert_eq!(ended.calls(), [("video".to_string(), true)]);
}

/// Sink that panics on its first packet
struct PanickingSink {
    log: Log,
}

impl PacketSink for PanickingSink {
    fn open(&mut self, _codec: &CodecDescriptor) -> Result<(), SinkError> {
        Ok(())
    }

    fn push(&mut self, packet: &Packet) -> Result<(), SinkError> {
        self.log.lock().unwrap().push(format!("push:panic:{}", packet.len()));
        panic!("sink failure");
    }

    fn close(&mut self) {
        self.log.lock().unwrap().push("close:panic".to_string());
    }
}

#[tokio::test]
async fn panicking_sink_still_closes_sinks_and_reports_error() {
    let (mut device, socket) = tokio::io::duplex(1024);
    let log = Log::default();
    let ended = Ended::default();

    let mut demuxer = Demuxer::new("video", socket, ended.callback());
    demuxer.add_sink(LogSink::new(1, &log)).unwrap();
    demuxer
        .add_sink(PanickingSink {
            log: Arc::clone(&log),
        })
        .unwrap();
    let handle = demuxer.start().unwrap();

    write_codec_id(&mut device, CodecId::H264).await.unwrap();
    write_packet(&mut device, &media_packet(b"frame", 0, true))
        .await
        .unwrap();

    let exit = handle.join().await;
    assert_eq!(exit.end, StreamEnd::Error);
    assert_eq!(
        events(&log),
        ["open:1:h264", "push:1:5", "push:panic:5", "close:panic", "close:1"]
    );
    assert_eq!(ended.calls(), [("video".to_string(), false)]);
}

#[tokio::test]
async fn full_channel_sink_ends_session_with_error() {
    let (mut device, socket) = tokio::io::duplex(4096);
    let ended = Ended::default();
    let (sink, mut rx) = ChannelSink::with_capacity(2);

    let mut demuxer = Demuxer::new("audio", socket, ended.callback());
    demuxer.add_sink(sink).unwrap();
    let handle = demuxer.start().unwrap();

    write_codec_id(&mut device, CodecId::Opus).await.unwrap();
    for pts in 0..4 {
        write_packet(&mut device, &media_packet(b"opus", pts, false))
            .await
            .unwrap();
    }

    // Opened + one packet fill the channel, the second packet is rejected
    let exit = handle.join().await;
    assert_eq!(exit.end, StreamEnd::Error);
    assert_eq!(ended.calls(), [("audio".to_string(), false)]);
    assert!(matches!(rx.recv().await, Some(SinkEvent::Opened(_))));
    assert!(matches!(rx.recv().await, Some(SinkEvent::Packet(_))));
    assert_eq!(rx.recv().await, None);
}
