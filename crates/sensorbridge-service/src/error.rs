use std::net::SocketAddr;

/// Errors that can occur while running the bridge.
#[derive(Debug, thiserror::Error)]
pub enum ServiceError {
    /// Port-level error.
    #[error("port error: {0}")]
    Port(#[from] sensorbridge_port::PortError),

    /// The HTTP listener could not be bound.
    #[error("failed to bind {addr}: {source}")]
    Bind {
        addr: SocketAddr,
        source: std::io::Error,
    },

    /// An I/O error occurred while serving HTTP.
    #[error("service I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// The ingestion thread could not be started or panicked.
    #[error("ingestion thread failed: {0}")]
    Ingest(String),
}

pub type Result<T> = std::result::Result<T, ServiceError>;
