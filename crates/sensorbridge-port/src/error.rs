/// Errors that can occur while opening or reading a byte source.
#[derive(Debug, thiserror::Error)]
pub enum PortError {
    /// The serial port could not be opened or configured.
    #[error("failed to open serial port {port}: {source}")]
    Open {
        port: String,
        source: serialport::Error,
    },

    /// Serial port enumeration failed.
    #[error("failed to enumerate serial ports: {0}")]
    Enumerate(serialport::Error),

    /// An I/O error occurred while reading from the source.
    #[error("port I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// The source has been closed.
    #[error("byte source closed")]
    Closed,
}

impl PortError {
    /// Whether the underlying cause is a permissions problem.
    pub fn is_permission_denied(&self) -> bool {
        match self {
            PortError::Open { source, .. } | PortError::Enumerate(source) => matches!(
                source.kind(),
                serialport::ErrorKind::Io(std::io::ErrorKind::PermissionDenied)
            ),
            PortError::Io(err) => err.kind() == std::io::ErrorKind::PermissionDenied,
            PortError::Closed => false,
        }
    }
}

pub type Result<T> = std::result::Result<T, PortError>;
