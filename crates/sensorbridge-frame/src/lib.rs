//! Line framing and sensor record decoding.
//!
//! The device prints one JSON object per line, interleaved with whatever
//! else its firmware feels like printing (boot banners, diagnostics):
//!
//! ```text
//! sensor ready
//! {"temperature":22.1,"humidity":55.0}
//! {"temperature":23.0,"humidity":50.0}
//! ```
//!
//! [`LineFramer`] turns a [`ByteSource`](sensorbridge_port::ByteSource) into
//! trimmed candidate lines; [`decode_line`] turns a candidate line into a
//! [`SensorRecord`], tells the caller it was not a record at all, or reports
//! why a record-shaped line could not be decoded.

pub mod error;
pub mod framer;
pub mod record;

pub use error::{DecodeError, Result};
pub use framer::{
    FramerConfig, LineFramer, DEFAULT_MAX_LINE_LEN, DEFAULT_POLL_INTERVAL, LINE_TERMINATOR,
};
pub use record::{decode_line, DecodeMode, SensorRecord, FIELD_DEFAULT};
