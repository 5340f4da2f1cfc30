//! Dump a mirroring stream
//!
//! Connects to a device socket (e.g. forwarded with `adb forward`), demuxes
//! the stream and logs every packet.
//!
//! Run with:
//! ```sh
//! RUST_LOG=debug cargo run --example dump_stream -- 127.0.0.1:27183
//! ```
//!
//! Press Ctrl+C to interrupt the session.

use std::net::SocketAddr;

use mirror_demux::{net, ChannelSink, Demuxer, SinkEvent};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env().add_directive("mirror_demux=info".parse()?))
        .init();

    let addr: SocketAddr = std::env::args()
        .nth(1)
        .unwrap_or_else(|| "127.0.0.1:27183".to_string())
        .parse()?;

    let (socket, interrupter) = net::connect(addr).await?;
    tracing::info!(addr = %addr, "Connected");

    let (sink, mut events) = ChannelSink::new();
    let mut demuxer = Demuxer::new("video", socket, |name, eos| {
        if eos {
            tracing::info!(demuxer = name, "Device disconnected");
        } else {
            tracing::warn!(demuxer = name, "Demuxer stopped on error");
        }
    });
    demuxer.add_sink(sink)?;
    let handle = demuxer.start()?;

    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            tracing::info!("Interrupting");
            let _ = interrupter.interrupt();
        }
    });

    while let Some(event) = events.recv().await {
        match event {
            SinkEvent::Opened(codec) => {
                tracing::info!(codec = %codec.id, media = ?codec.media_type, "Stream opened");
            }
            SinkEvent::Packet(packet) => {
                tracing::info!(
                    size = packet.len(),
                    pts = ?packet.pts,
                    key_frame = packet.key_frame,
                    "Packet"
                );
            }
            SinkEvent::Closed => tracing::info!("Stream closed"),
        }
    }

    let exit = handle.join().await;
    tracing::info!(
        end = %exit.end,
        packets = exit.stats.packets,
        bytes = exit.stats.bytes_received,
        duration_secs = exit.stats.duration().as_secs(),
        "Done"
    );

    Ok(())
}
