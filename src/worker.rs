use std::future::Future;
use std::net::SocketAddr;

use anyhow::{Context, Result, bail};
use tokio::io::{AsyncBufReadExt, AsyncReadExt, AsyncWriteExt, BufReader};
use tokio::net::TcpStream;

use crate::closer::Connection;
use crate::relay::mirror;

/// Serves one accepted connection.
///
/// Return [`EndOfStream`](crate::error::EndOfStream), or an `UnexpectedEof`
/// io error, when the peer hangs up; anything else is logged as a failed job.
/// The job closes the connection afterwards whatever the outcome.
pub trait Worker: Send + Sync + 'static {
    fn serve(&self, conn: &mut Connection) -> impl Future<Output = Result<()>> + Send;
}

/// Longest line, newline included, that [`EchoLine`] accepts.
pub const MAX_LINE: usize = 8 * 1024;

/// Writes every received line straight back.
#[derive(Debug, Clone, Copy, Default)]
pub struct EchoLine;

impl Worker for EchoLine {
    async fn serve(&self, conn: &mut Connection) -> Result<()> {
        let (reader, mut writer) = conn.stream().split();
        let mut reader = BufReader::new(reader);
        let mut line = String::new();

        loop {
            line.clear();

            let n = (&mut reader).take(MAX_LINE as u64).read_line(&mut line).await?;
            if n == 0 {
                return Ok(());
            }

            if n == MAX_LINE && !line.ends_with('\n') {
                bail!("line exceeds {} bytes", MAX_LINE);
            }

            writer.write_all(line.as_bytes()).await?;
        }
    }
}

/// Splices each client to a fresh connection to `upstream`, byte for byte.
#[derive(Debug, Clone, Copy)]
pub struct Tunnel {
    pub upstream: SocketAddr
}

impl Worker for Tunnel {
    async fn serve(&self, conn: &mut Connection) -> Result<()> {
        let mut upstream = TcpStream::connect(self.upstream)
            .await
            .with_context(|| format!("connecting to upstream {}", self.upstream))?;

        let (mut client_rx, mut client_tx) = conn.stream().split();
        let (mut upstream_rx, mut upstream_tx) = upstream.split();

        // Each direction forwards its EOF as a write shutdown, so a half-closed
        // client still gets the upstream's reply.
        let outbound = async {
            let sent = mirror(&mut client_rx, &mut upstream_tx).await;
            let _ = upstream_tx.shutdown().await;
            sent
        };
        let inbound = async {
            let received = mirror(&mut upstream_rx, &mut client_tx).await;
            let _ = client_tx.shutdown().await;
            received
        };

        let (sent, received) = tokio::join!(outbound, inbound);
        tracing::trace!(conn = %conn.id(), sent, received, "tunnel finished");

        Ok(())
    }
}
