use std::net::SocketAddr;
use std::sync::Arc;

use tokio::net::TcpStream;
use tokio_util::sync::CancellationToken;

use crate::closer::{self, Connection};
use crate::codegen;
use crate::error::is_end_of_stream;
use crate::state::ServerState;
use crate::worker::Worker;

/// Runs `worker` on one accepted socket. Failures stay here; the socket is
/// shut down on every path, including when `cancel` fires mid-flight.
pub async fn handle<W: Worker>(
    state: ServerState,
    worker: Arc<W>,
    socket: TcpStream,
    peer: SocketAddr,
    cancel: CancellationToken
) {
    let registration = codegen::register(&state, peer);
    let mut conn = Connection::new(socket, peer, registration.id().to_owned());

    let reason = tokio::select! {
        // Dropping the worker future releases its borrow so the socket can be closed now.
        _ = cancel.cancelled() => "cancelled",

        result = worker.serve(&mut conn) => match result {
            Ok(()) => "completed",
            Err(err) if is_end_of_stream(&err) => "end of stream",
            Err(err) => {
                tracing::trace!(conn = %conn.id(), %peer, error = ?err, "job failed");
                "failed"
            }
        }
    };

    closer::close(&mut conn);

    tracing::trace!(conn = %conn.id(), %peer, reason, "connection closed");
}
