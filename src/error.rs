use std::io;
use std::net::SocketAddr;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum ServerError {
    #[error("failed to bind {addr}")]
    Bind {
        addr: SocketAddr,
        #[source]
        source: io::Error
    }
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum StartError {
    #[error("server stopped before the socket was bound")]
    Cancelled,

    #[error("start signal already completed")]
    AlreadyCompleted
}

/// Returned by a worker when the peer went away mid-read.
#[derive(Debug, Error)]
#[error("peer closed the stream")]
pub struct EndOfStream;

/// True when `err` means the peer simply hung up.
pub fn is_end_of_stream(err: &anyhow::Error) -> bool {
    err.chain().any(|cause| {
        cause.is::<EndOfStream>()
            || cause
                .downcast_ref::<io::Error>()
                .is_some_and(|e| e.kind() == io::ErrorKind::UnexpectedEof)
    })
}
