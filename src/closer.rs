use std::io;
use std::net::{Shutdown, SocketAddr};
use std::pin::Pin;
use std::task::{Context, Poll};

use socket2::SockRef;
use tokio::io::{AsyncRead, AsyncWrite, ReadBuf};
use tokio::net::TcpStream;

/// An accepted client socket, owned by the job serving it.
pub struct Connection {
    stream: TcpStream,
    peer: SocketAddr,
    id: String,
    open: bool
}

impl Connection {
    pub fn new(stream: TcpStream, peer: SocketAddr, id: String) -> Self {
        Self {
            stream,
            peer,
            id,
            open: true
        }
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn peer(&self) -> SocketAddr {
        self.peer
    }

    pub fn stream(&mut self) -> &mut TcpStream {
        &mut self.stream
    }

    pub fn is_connected(&self) -> bool {
        self.open
    }
}

/// Shuts both directions of `conn` down. Never fails and is a no-op after the
/// first call; teardown errors such as a reset peer are dropped.
pub fn close(conn: &mut Connection) {
    if !conn.is_connected() {
        return;
    }

    conn.open = false;

    if let Err(err) = SockRef::from(&conn.stream).shutdown(Shutdown::Both) {
        tracing::trace!(conn = %conn.id, peer = %conn.peer, error = %err, "shutdown ignored");
    }
}

impl AsyncRead for Connection {
    fn poll_read(
        mut self: Pin<&mut Self>,
        cx: &mut Context<'_>,
        buf: &mut ReadBuf<'_>
    ) -> Poll<io::Result<()>> {
        Pin::new(&mut self.stream).poll_read(cx, buf)
    }
}

impl AsyncWrite for Connection {
    fn poll_write(
        mut self: Pin<&mut Self>,
        cx: &mut Context<'_>,
        buf: &[u8]
    ) -> Poll<io::Result<usize>> {
        Pin::new(&mut self.stream).poll_write(cx, buf)
    }

    fn poll_flush(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<io::Result<()>> {
        Pin::new(&mut self.stream).poll_flush(cx)
    }

    fn poll_shutdown(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<io::Result<()>> {
        Pin::new(&mut self.stream).poll_shutdown(cx)
    }
}
