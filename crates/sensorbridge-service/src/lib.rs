//! The bridge itself: ingestion, shared state and the HTTP query service.
//!
//! ```text
//! ByteSource ─▶ LineFramer ─▶ decode_line ─▶ LatestValueStore ◀─ GET /data
//!   (ingest thread, single writer)              (HTTP handlers, many readers)
//! ```
//!
//! The only state shared between the two sides is the [`LatestValueStore`].

pub mod error;
pub mod http;
pub mod ingest;
pub mod store;

pub use error::{Result, ServiceError};
pub use http::{bind, router, serve, NO_DATA_MESSAGE, NO_DATA_STATUS};
pub use ingest::{run_ingest, spawn_ingest, IngestConfig, IngestStats, INGEST_THREAD_NAME};
pub use store::LatestValueStore;
