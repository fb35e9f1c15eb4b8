use anyhow::{Context, Result};
use std::net::SocketAddr;

pub const DEFAULT_LISTEN: &str = "0.0.0.0:7000";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
    pub listen: SocketAddr,
    /// Tunnel target; the line echo service runs when this is unset.
    pub upstream: Option<SocketAddr>
}

impl Config {
    /// `acceptor [LISTEN] [UPSTREAM]`
    pub fn from_args<I>(args: I) -> Result<Self>
    where
        I: IntoIterator<Item = String>
    {
        let mut args = args.into_iter();

        let listen = args.next().unwrap_or_else(|| DEFAULT_LISTEN.to_string());
        let listen = listen
            .parse::<SocketAddr>()
            .with_context(|| format!("invalid listen address '{}'", listen))?;

        let upstream = args
            .next()
            .map(|up| up.parse::<SocketAddr>().with_context(|| format!("invalid upstream address '{}'", up)))
            .transpose()?;

        Ok(Self { listen, upstream })
    }
}
