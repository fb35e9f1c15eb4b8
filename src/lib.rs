pub mod closer;
pub mod codegen;
pub mod config;
pub mod conn;
pub mod error;
pub mod relay;
pub mod server;
pub mod signal;
pub mod state;
pub mod worker;

pub use closer::{Connection, close};
pub use error::{EndOfStream, ServerError, StartError};
pub use relay::mirror;
pub use server::{start, stop};
pub use signal::{StartSignal, StartedData};
pub use state::ServerState;
pub use worker::{EchoLine, Tunnel, Worker};
