use tokio::io::{AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt};

/// Copies `source` into `destination` one byte at a time until either side
/// errors or `source` ends. Never fails; returns how many bytes went across.
pub async fn mirror<R, W>(source: &mut R, destination: &mut W) -> u64
where
    R: AsyncRead + Unpin + ?Sized,
    W: AsyncWrite + Unpin + ?Sized
{
    let mut copied = 0u64;

    loop {
        let byte = match source.read_u8().await {
            Ok(b) => b,
            Err(err) => {
                tracing::trace!(copied, error = %err, "mirror source finished");
                return copied;
            }
        };

        if let Err(err) = destination.write_u8(byte).await {
            tracing::trace!(copied, error = %err, "mirror destination failed");
            return copied;
        }

        copied += 1;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io;
    use std::pin::Pin;
    use std::task::{Context, Poll};

    /// Records the size of every write it receives.
    #[derive(Default)]
    struct Capture {
        writes: Vec<Vec<u8>>
    }

    impl AsyncWrite for Capture {
        fn poll_write(mut self: Pin<&mut Self>, _: &mut Context<'_>, buf: &[u8]) -> Poll<io::Result<usize>> {
            self.writes.push(buf.to_vec());
            Poll::Ready(Ok(buf.len()))
        }

        fn poll_flush(self: Pin<&mut Self>, _: &mut Context<'_>) -> Poll<io::Result<()>> {
            Poll::Ready(Ok(()))
        }

        fn poll_shutdown(self: Pin<&mut Self>, _: &mut Context<'_>) -> Poll<io::Result<()>> {
            Poll::Ready(Ok(()))
        }
    }

    #[tokio::test]
    async fn copies_bytes_in_order_one_at_a_time() {
        let mut source: &[u8] = &[0x61, 0x62, 0x63];
        let mut dest = Capture::default();

        assert_eq!(mirror(&mut source, &mut dest).await, 3);
        assert_eq!(dest.writes, vec![vec![0x61], vec![0x62], vec![0x63]]);
    }

    #[tokio::test]
    async fn stops_quietly_when_destination_breaks() {
        let (mut tx, rx) = tokio::io::duplex(16);
        drop(rx);

        let mut source: &[u8] = b"xyz";
        assert_eq!(mirror(&mut source, &mut tx).await, 0);
    }

    #[tokio::test]
    async fn follows_a_live_stream_until_it_closes() {
        let (mut feed, mut source) = tokio::io::duplex(1);
        let mut dest = Vec::new();

        let writer = tokio::spawn(async move {
            for b in [0x61u8, 0x62, 0x63] {
                feed.write_u8(b).await.unwrap();
            }
        });

        assert_eq!(mirror(&mut source, &mut dest).await, 3);
        assert_eq!(dest, b"abc");
        writer.await.unwrap();
    }
}
