//! Stream writer
//!
//! Device side of the protocol: encodes the codec handshake and framed
//! packets. Useful to replay recorded streams or to feed a demuxer in tests.

use std::io;

use bytes::{BufMut, BytesMut};
use tokio::io::{AsyncWrite, AsyncWriteExt};

use super::codec::CodecId;
use super::constants::PACKET_HEADER_SIZE;
use super::header::{PacketHeader, PtsFlags};
use crate::media::packet::Packet;

/// Send the codec handshake
pub async fn write_codec_id<W>(writer: &mut W, codec: CodecId) -> io::Result<()>
where
    W: AsyncWrite + Unpin,
{
    write_raw_codec_id(writer, codec.tag()).await
}

/// Send an arbitrary codec tag, including ones the reader will reject
pub async fn write_raw_codec_id<W>(writer: &mut W, tag: u32) -> io::Result<()>
where
    W: AsyncWrite + Unpin,
{
    writer.write_all(&tag.to_be_bytes()).await
}

/// Send one framed packet (header then payload)
pub async fn write_packet<W>(writer: &mut W, packet: &Packet) -> io::Result<()>
where
    W: AsyncWrite + Unpin,
{
    writer.write_all(&encode_packet(packet)?).await
}

/// Encode a packet into its wire representation
///
/// Fails with `InvalidInput` if the payload does not fit the 32-bit length
/// field.
pub fn encode_packet(packet: &Packet) -> io::Result<BytesMut> {
    let header = PacketHeader {
        flags: PtsFlags {
            pts: packet.pts.unwrap_or(0),
            key_frame: packet.key_frame,
            config: packet.config,
        },
        len: payload_len(packet.data.len())?,
    };

    let mut buf = BytesMut::with_capacity(PACKET_HEADER_SIZE + packet.data.len());
    buf.put_slice(&header.encode());
    buf.put_slice(&packet.data);
    Ok(buf)
}

fn payload_len(len: usize) -> io::Result<u32> {
    u32::try_from(len).map_err(|_| {
        io::Error::new(
            io::ErrorKind::InvalidInput,
            format!("packet payload too large: {} bytes", len),
        )
    })
}
