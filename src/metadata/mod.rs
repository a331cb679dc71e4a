//! Decoding of the receiver's metadata stream into tracks.

pub mod assembler;
pub mod binary;
pub mod error;
pub mod item;
pub mod pipeline;
pub mod reader;
pub mod source;
pub mod udp;
