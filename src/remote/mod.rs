//! DACP remote control of the sending device.

pub mod dacp;
pub mod error;
pub mod locator;
pub mod session;
pub mod worker;
