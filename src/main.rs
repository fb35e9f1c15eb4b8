use std::future::Future;

use anyhow::{Result, bail};
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use acceptor::config::Config;
use acceptor::{EchoLine, ServerState, StartSignal, Tunnel, server};

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "acceptor=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = Config::from_args(std::env::args().skip(1))?;

    let state = ServerState::default();
    let cancel = CancellationToken::new();

    let (signal, task) = match config.upstream {
        Some(upstream) => server::start(config.listen, Tunnel { upstream }, state, cancel.clone())?,
        None => server::start(config.listen, EchoLine, state, cancel.clone())?
    };

    announce(&signal, config.upstream.is_some()).await?;

    run_until(tokio::signal::ctrl_c(), task, cancel).await
}

async fn announce(signal: &StartSignal, tunnel: bool) -> Result<()> {
    let started = signal.wait().await?;
    let mode = if tunnel { "tunnel" } else { "echo" };

    tracing::info!(addr = %started.addr(), mode, "listening");

    Ok(())
}

/// Cancels the server once `interrupt` fires; errors if the accept loop ends first.
async fn run_until<F>(interrupt: F, mut task: JoinHandle<()>, cancel: CancellationToken) -> Result<()>
where
    F: Future<Output = std::io::Result<()>>
{
    tokio::select! {
        interrupted = interrupt => {
            interrupted?;
            tracing::info!("shutdown requested");
            cancel.cancel();
            task.await?;
        }

        finished = &mut task => {
            finished?;
            bail!("accept loop stopped on its own");
        }
    }

    Ok(())
}
