use std::net::SocketAddr;

use thiserror::Error;

use crate::domain::command::InvalidCommand;

#[derive(Debug, Error)]
pub enum ChannelError {
    #[error("control address {0} already in use, a server is probably running")]
    BindInUse(SocketAddr),

    #[error("cannot connect to server at {0}, make sure `airdeck` is running with no command")]
    ConnectionRefused(SocketAddr),

    #[error(transparent)]
    InvalidCommand(#[from] InvalidCommand),

    #[error("control channel io error: {0}")]
    Io(#[from] std::io::Error),
}
