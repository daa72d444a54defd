//! iio-transport: byte-stream transports for an IIO protocol engine
//!
//! The protocol engine reads commands from, and writes replies to, a plain
//! character stream. This crate provides the [`Transport`] trait for that stream
//! plus a few backends. The default build enables a `mock` backend so tests and
//! tools compile on any host without a serial port.

mod error;
pub use error::{Result, TransportError};

mod traits;
pub use traits::Transport;

mod stdio;
pub use stdio::StdioTransport;

#[cfg(feature = "mock")]
mod mock;

#[cfg(feature = "mock")]
pub use mock::MockTransport;

#[cfg(feature = "serial")]
mod serial;

#[cfg(feature = "serial")]
pub use serial::{PortInfo, SerialConfig, SerialTransport};
