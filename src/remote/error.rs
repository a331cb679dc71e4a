use thiserror::Error;

use crate::domain::command::Command;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ControlError {
    #[error(
        "cannot send {0}: source not ready, no remote-control endpoint known yet. Try reconnecting your source"
    )]
    NotResolved(Command),

    #[error("remote request failed: {0}")]
    Transport(String),

    #[error("{0} is not a remote-control command")]
    NotForwardable(Command),

    #[error("remote control worker is not running")]
    Unavailable,
}
