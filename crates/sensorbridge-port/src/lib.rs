//! Serial port lifecycle and byte sources.
//!
//! This is the lowest layer of sensorbridge. It opens and configures the
//! serial connection to the sensor device and exposes it as a [`ByteSource`]:
//! a polled "how many bytes are waiting / give me the next one" interface
//! that the line framer consumes.
//!
//! The port handle is owned by [`SerialSource`] and released when the source
//! is closed or dropped, so every exit path of the ingestion loop gives the
//! port back to the operating system.

pub mod config;
pub mod error;
pub mod list;
pub mod memory;
pub mod serial;
pub mod source;

pub use config::{PortConfig, DEFAULT_BAUD_RATE, DEFAULT_READ_TIMEOUT, DEFAULT_SETTLE_DELAY};
pub use error::{PortError, Result};
pub use list::{list_ports, PortInfo};
pub use memory::MemorySource;
pub use serial::{open, SerialSource, MAX_CONSECUTIVE_FAILURES};
pub use source::{ByteSource, ShutdownHandle};
