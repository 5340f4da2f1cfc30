//! Stream reader
//!
//! Reads the codec handshake and framed packets from the device socket.
//!
//! A short read, including a read of zero bytes or any transport error, is
//! how the device signals that it went away. It is reported as `Ok(None)`,
//! never as an error. Errors are reserved for protocol violations and
//! allocation failures.

use bytes::Bytes;
use tokio::io::{AsyncRead, AsyncReadExt};

use super::constants::{CODEC_ID_SIZE, PACKET_HEADER_SIZE, PAYLOAD_CHUNK_SIZE};
use super::header::PacketHeader;
use crate::error::{Error, Result};
use crate::media::packet::Packet;

/// Reads protocol values from a byte stream
#[derive(Debug)]
pub struct StreamReader<R> {
    inner: R,
    bytes_read: u64,
}

impl<R: AsyncRead + Unpin> StreamReader<R> {
    /// Wrap a socket
    pub fn new(inner: R) -> Self {
        Self {
            inner,
            bytes_read: 0,
        }
    }

    /// Total bytes consumed so far
    pub fn bytes_read(&self) -> u64 {
        self.bytes_read
    }

    /// Read the raw codec tag sent once at the start of the stream
    ///
    /// Returns `None` on end of stream.
    pub async fn recv_codec_id(&mut self) -> Option<u32> {
        let mut buf = [0u8; CODEC_ID_SIZE];
        if !self.recv_all(&mut buf).await {
            return None;
        }
        Some(u32::from_be_bytes(buf))
    }

    /// Read one packet header and its payload
    ///
    /// Returns `Ok(None)` on end of stream, and an error if the header
    /// declares an empty payload or the payload buffer cannot be allocated.
    pub async fn recv_packet(&mut self) -> Result<Option<Packet>> {
        let mut raw = [0u8; PACKET_HEADER_SIZE];
        if !self.recv_all(&mut raw).await {
            return Ok(None);
        }

        let header = PacketHeader::decode(&raw);
        if header.len == 0 {
            return Err(Error::EmptyPacket);
        }

        let len = header.len as usize;
        let mut data = Vec::new();
        while data.len() < len {
            let start = data.len();
            let chunk = (len - start).min(PAYLOAD_CHUNK_SIZE);
            data.try_reserve(chunk)
                .map_err(|_| Error::OutOfMemory { requested: len })?;
            data.resize(start + chunk, 0);

            if !self.recv_all(&mut data[start..]).await {
                return Ok(None);
            }
        }

        Ok(Some(Packet::from_flags(header.flags, Bytes::from(data))))
    }

    async fn recv_all(&mut self, buf: &mut [u8]) -> bool {
        match self.inner.read_exact(buf).await {
            Ok(n) => {
                self.bytes_read += n as u64;
                true
            }
            Err(e) => {
                if e.kind() != std::io::ErrorKind::UnexpectedEof {
                    tracing::debug!(error = %e, "Receive failed, treating as end of stream");
                }
                false
            }
        }
    }
}
