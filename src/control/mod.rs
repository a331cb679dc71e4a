//! Line-based TCP control channel between a client invocation and the
//! running server.

pub mod client;
pub mod error;
pub mod server;
