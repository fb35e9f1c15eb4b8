use std::net::SocketAddr;
use std::sync::Arc;

use socket2::{Domain, Protocol, Socket, Type};
use tokio::net::TcpListener;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

use crate::error::ServerError;
use crate::signal::{StartNotifier, StartSignal, StartedData, start_signal};
use crate::state::ServerState;
use crate::worker::Worker;

// The kernel clamps this to its own ceiling (somaxconn on Linux).
const MAX_BACKLOG: i32 = i32::MAX;

/// Binds `addr` and spawns the accept loop.
///
/// Binding happens before this returns, so a busy port or a permission error
/// comes back here as [`ServerError::Bind`]. The returned [`StartSignal`]
/// resolves once the loop is about to accept; the handle finishes when
/// `cancel` fires or accepting fails. Jobs still running at that point are
/// not waited for.
///
/// Must be called from within a tokio runtime.
pub fn start<W: Worker>(
    addr: SocketAddr,
    worker: W,
    state: ServerState,
    cancel: CancellationToken
) -> Result<(StartSignal, JoinHandle<()>), ServerError> {
    let requested = StartedData::requested(addr);

    tracing::debug!(%addr, "start requested");

    let listener = bind(addr).map_err(|source| ServerError::Bind { addr, source })?;
    let (notifier, signal) = start_signal();

    let task = tokio::spawn(run(listener, requested, notifier, Arc::new(worker), state, cancel));

    Ok((signal, task))
}

fn bind(addr: SocketAddr) -> std::io::Result<TcpListener> {
    let socket = Socket::new(Domain::for_address(addr), Type::STREAM, Some(Protocol::TCP))?;

    socket.set_reuse_address(true)?;
    socket.bind(&addr.into())?;
    socket.listen(MAX_BACKLOG)?;
    socket.set_nonblocking(true)?;

    TcpListener::from_std(socket.into())
}

async fn run<W: Worker>(
    listener: TcpListener,
    requested: StartedData,
    notifier: StartNotifier,
    worker: Arc<W>,
    state: ServerState,
    cancel: CancellationToken
) {
    let local_addr = match listener.local_addr() {
        Ok(local) => local,
        Err(err) => {
            tracing::error!(addr = %requested.bind_addr, error = %err, "listener has no local address");
            stop("no local address", listener);
            return;
        }
    };

    let started = requested.bound(local_addr);

    if let Err(err) = notifier.complete(started) {
        tracing::warn!(error = %err, "start signal");
    }

    tracing::info!(addr = %local_addr, "socket bound");

    let reason = loop {
        tokio::select! {
            _ = cancel.cancelled() => break "cancelled",

            accepted = listener.accept() => match accepted {
                Ok((socket, peer)) => {
                    tracing::debug!(%peer, "connection accepted");

                    tokio::spawn(crate::conn::handle(
                        state.clone(),
                        Arc::clone(&worker),
                        socket,
                        peer,
                        cancel.clone()
                    ));
                }

                Err(err) => {
                    tracing::error!(addr = %local_addr, error = %err, "accept failed");
                    break "accept failed";
                }
            }
        }
    };

    stop(reason, listener);
}

/// Closes `listener`, logging why.
pub fn stop(reason: &str, listener: TcpListener) {
    match listener.local_addr() {
        Ok(addr) => tracing::info!(%addr, reason, "listener stopped"),
        Err(_) => tracing::info!(reason, "listener stopped")
    }

    drop(listener);
}
