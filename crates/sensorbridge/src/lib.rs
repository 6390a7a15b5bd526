//! Serve the latest reading of a serial-attached sensor over HTTP.
//!
//! sensorbridge reads newline-delimited JSON records such as
//! `{"temperature":22.1,"humidity":55.0}` from a serial port, keeps the most
//! recent valid one, and answers `GET /data` with it.
//!
//! # Crate Structure
//!
//! - [`port`]: Serial port lifecycle and byte sources
//! - [`frame`]: Line framing and record decoding
//! - [`service`]: Latest-value store, ingestion pipeline, HTTP service (behind `service` feature)

/// Re-export port types.
pub mod port {
    pub use sensorbridge_port::*;
}

/// Re-export frame types.
pub mod frame {
    pub use sensorbridge_frame::*;
}

/// Re-export service types (requires `service` feature).
#[cfg(feature = "service")]
pub mod service {
    pub use sensorbridge_service::*;
}
