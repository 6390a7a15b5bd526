use std::fmt;
use std::io;

use sensorbridge_port::PortError;
use sensorbridge_service::ServiceError;

// Exit codes follow sysexits-style ranges.
pub const SUCCESS: i32 = 0;
pub const FAILURE: i32 = 1;
pub const PORT_ERROR: i32 = 3;
pub const PERMISSION_DENIED: i32 = 50;
pub const DATA_INVALID: i32 = 60;
pub const USAGE: i32 = 64;
pub const ADDR_IN_USE: i32 = 98;
pub const INTERNAL: i32 = 125;

pub type CliResult<T> = Result<T, CliError>;

#[derive(Debug)]
pub struct CliError {
    pub code: i32,
    pub message: String,
}

impl CliError {
    pub fn new(code: i32, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
        }
    }
}

impl fmt::Display for CliError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.message)
    }
}

impl std::error::Error for CliError {}

pub fn io_error(context: &str, err: io::Error) -> CliError {
    CliError::new(io_error_code(err.kind()), format!("{context}: {err}"))
}

fn io_error_code(kind: io::ErrorKind) -> i32 {
    match kind {
        io::ErrorKind::PermissionDenied => PERMISSION_DENIED,
        io::ErrorKind::AddrInUse => ADDR_IN_USE,
        io::ErrorKind::NotFound => FAILURE,
        io::ErrorKind::InvalidData => DATA_INVALID,
        _ => INTERNAL,
    }
}

pub fn port_error(context: &str, err: PortError) -> CliError {
    if err.is_permission_denied() {
        return CliError::new(PERMISSION_DENIED, format!("{context}: {err}"));
    }
    match err {
        PortError::Io(source) => io_error(context, source),
        other => CliError::new(PORT_ERROR, format!("{context}: {other}")),
    }
}

pub fn service_error(context: &str, err: ServiceError) -> CliError {
    match err {
        ServiceError::Port(err) => port_error(context, err),
        ServiceError::Io(source) => io_error(context, source),
        ServiceError::Bind { ref source, .. } => {
            CliError::new(io_error_code(source.kind()), format!("{context}: {err}"))
        }
        ServiceError::Ingest(_) => CliError::new(INTERNAL, format!("{context}: {err}")),
    }
}
