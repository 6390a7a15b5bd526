use std::sync::Arc;
use std::thread::JoinHandle;

use sensorbridge_frame::{decode_line, DecodeMode, FramerConfig, LineFramer};
use sensorbridge_port::ByteSource;
use tracing::{debug, info, warn};

use crate::error::{Result, ServiceError};
use crate::store::LatestValueStore;

/// Name of the ingestion thread.
pub const INGEST_THREAD_NAME: &str = "sensorbridge-ingest";

/// Configuration for the ingestion pipeline.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct IngestConfig {
    /// Line framer settings.
    pub framer: FramerConfig,
    /// Treatment of missing or non-numeric record fields.
    pub decode_mode: DecodeMode,
}

/// Line counters for one ingestion run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct IngestStats {
    /// Candidate lines framed.
    pub lines: u64,
    /// Records decoded and published.
    pub records: u64,
    /// Lines that were not record-shaped.
    pub ignored: u64,
    /// Record-shaped lines that failed to decode.
    pub malformed: u64,
}

/// Frame `source`, decode each line and publish valid records to `store`.
///
/// Blocks until the source closes. The source is dropped before this
/// returns, which releases the port.
pub fn run_ingest<S: ByteSource>(
    mut source: S,
    config: &IngestConfig,
    store: &LatestValueStore,
) -> IngestStats {
    let mut stats = IngestStats::default();

    if !source.settle() {
        info!("shutdown requested before the device settled");
        return stats;
    }
    info!(decode_mode = ?config.decode_mode, "ingestion started");

    for line in LineFramer::with_config(source, config.framer.clone()) {
        stats.lines += 1;
        match decode_line(&line, config.decode_mode) {
            Ok(Some(record)) => {
                debug!(
                    temperature = record.temperature,
                    humidity = record.humidity,
                    "publishing record"
                );
                store.publish(record);
                stats.records += 1;
            }
            Ok(None) => {
                debug!(%line, "ignoring non-record line");
                stats.ignored += 1;
            }
            Err(err) => {
                warn!(%line, error = %err, "discarding malformed record");
                stats.malformed += 1;
            }
        }
    }

    info!(
        lines = stats.lines,
        records = stats.records,
        ignored = stats.ignored,
        malformed = stats.malformed,
        "byte source closed, ingestion stopped"
    );
    stats
}

/// Run [`run_ingest`] on a dedicated thread.
///
/// The blocking poll loop stays off the async runtime that serves HTTP.
pub fn spawn_ingest<S>(
    source: S,
    config: IngestConfig,
    store: Arc<LatestValueStore>,
) -> Result<JoinHandle<IngestStats>>
where
    S: ByteSource + Send + 'static,
{
    std::thread::Builder::new()
        .name(INGEST_THREAD_NAME.to_string())
        .spawn(move || run_ingest(source, &config, &store))
        .map_err(|err| ServiceError::Ingest(format!("spawn failed: {err}")))
}
