//! Device socket helpers
//!
//! A demuxer blocks in socket reads. To stop it from another task or thread,
//! shut the socket down: the pending read returns a short read and the
//! session ends as end of stream.

use std::net::{Shutdown, SocketAddr};

use tokio::net::TcpStream;

/// Shuts down a socket owned by a demuxer
#[derive(Debug)]
pub struct SocketInterrupter {
    socket: std::net::TcpStream,
}

impl SocketInterrupter {
    /// Shut down both directions of the socket
    ///
    /// Safe to call more than once, and after the peer has disconnected.
    pub fn interrupt(&self) -> std::io::Result<()> {
        match self.socket.shutdown(Shutdown::Both) {
            Err(e) if e.kind() == std::io::ErrorKind::NotConnected => Ok(()),
            result => result,
        }
    }
}

/// Connect to a device socket
///
/// Returns the stream to hand to a demuxer and an interrupter for it.
pub async fn connect(addr: SocketAddr) -> std::io::Result<(TcpStream, SocketInterrupter)> {
    let stream = TcpStream::connect(addr).await?;
    tracing::debug!(addr = %addr, "Connected to device socket");
    interruptible(stream.into_std()?)
}

/// Register a connected socket with tokio, keeping a handle to interrupt it
///
/// Must be called from within a tokio runtime.
pub fn interruptible(
    stream: std::net::TcpStream,
) -> std::io::Result<(TcpStream, SocketInterrupter)> {
    let interrupter = SocketInterrupter {
        socket: stream.try_clone()?,
    };

    // Packets are small and latency sensitive
    stream.set_nodelay(true)?;
    stream.set_nonblocking(true)?;

    Ok((TcpStream::from_std(stream)?, interrupter))
}
