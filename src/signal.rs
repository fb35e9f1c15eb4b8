//! Write-once start confirmation shared between the lifecycle task and its caller.

use std::net::SocketAddr;
use std::time::Instant;

use tokio::sync::watch;

use crate::error::StartError;

/// What the caller learns once the server is listening.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StartedData {
    pub start_requested_at: Instant,
    pub bound_at: Option<Instant>,
    pub bind_addr: SocketAddr,
    /// Address the kernel actually assigned; differs from `bind_addr` for port 0.
    pub local_addr: Option<SocketAddr>
}

impl StartedData {
    pub fn requested(bind_addr: SocketAddr) -> Self {
        Self {
            start_requested_at: Instant::now(),
            bound_at: None,
            bind_addr,
            local_addr: None
        }
    }

    /// Copy of `self` stamped as bound now.
    pub fn bound(self, local_addr: SocketAddr) -> Self {
        Self {
            bound_at: Some(Instant::now()),
            local_addr: Some(local_addr),
            ..self
        }
    }

    pub fn addr(&self) -> SocketAddr {
        self.local_addr.unwrap_or(self.bind_addr)
    }

    pub fn port(&self) -> u16 {
        self.addr().port()
    }
}

pub fn start_signal() -> (StartNotifier, StartSignal) {
    let (tx, rx) = watch::channel(None);

    (StartNotifier { tx }, StartSignal { rx })
}

/// Producer half, held by the lifecycle task.
pub struct StartNotifier {
    tx: watch::Sender<Option<StartedData>>
}

impl StartNotifier {
    /// Publishes `data` to every current and future awaiter. Only the first call wins.
    pub fn complete(&self, data: StartedData) -> Result<(), StartError> {
        let stored = self.tx.send_if_modified(|slot| {
            if slot.is_some() {
                return false;
            }

            *slot = Some(data);
            true
        });

        if stored {
            Ok(())
        } else {
            Err(StartError::AlreadyCompleted)
        }
    }
}

/// Awaiter half. Clones all observe the same value.
#[derive(Debug, Clone)]
pub struct StartSignal {
    rx: watch::Receiver<Option<StartedData>>
}

impl StartSignal {
    /// Suspends until the server is bound. Fails with [`StartError::Cancelled`]
    /// if the lifecycle ended first. There is no built-in timeout.
    pub async fn wait(&self) -> Result<StartedData, StartError> {
        let mut rx = self.rx.clone();

        let started = rx
            .wait_for(Option::is_some)
            .await
            .map_err(|_| StartError::Cancelled)?;

        (*started).ok_or(StartError::Cancelled)
    }

    pub fn try_get(&self) -> Option<StartedData> {
        *self.rx.borrow()
    }
}
