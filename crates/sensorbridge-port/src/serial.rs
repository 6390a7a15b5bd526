use std::io::{ErrorKind, Read};
use std::time::{Duration, Instant};

use serialport::{DataBits, FlowControl, Parity, SerialPort, StopBits};
use tracing::{debug, info, warn};

use crate::config::PortConfig;
use crate::error::{PortError, Result};
use crate::source::{ByteSource, ShutdownHandle};

/// Granularity of the settle wait, so shutdown interrupts it promptly.
const SETTLE_SLICE: Duration = Duration::from_millis(50);

/// Consecutive failed port operations after which the device is treated as gone.
pub const MAX_CONSECUTIVE_FAILURES: u32 = 5;

/// An open serial port exposed as a [`ByteSource`].
///
/// The port handle is released by [`ByteSource::close`] or on drop,
/// whichever comes first.
pub struct SerialSource {
    port: Option<Box<dyn SerialPort>>,
    name: String,
    settle_delay: Duration,
    shutdown: ShutdownHandle,
    failures: u32,
}

/// Open and configure the serial port described by `config` (8N1, no flow control).
///
/// Failure here is terminal for the bridge: there is exactly one data source.
pub fn open(config: &PortConfig) -> Result<SerialSource> {
    let port = serialport::new(&config.port, config.baud_rate)
        .data_bits(DataBits::Eight)
        .stop_bits(StopBits::One)
        .parity(Parity::None)
        .flow_control(FlowControl::None)
        .timeout(config.read_timeout)
        .open()
        .map_err(|source| PortError::Open {
            port: config.port.clone(),
            source,
        })?;

    info!(
        port = %config.port,
        baud_rate = config.baud_rate,
        "serial port opened"
    );

    Ok(SerialSource {
        port: Some(port),
        name: config.port.clone(),
        settle_delay: config.settle_delay,
        shutdown: ShutdownHandle::new(),
        failures: 0,
    })
}

impl SerialSource {
    /// Port identifier this source was opened with.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Handle that makes this source report closed from another thread.
    pub fn shutdown_handle(&self) -> ShutdownHandle {
        self.shutdown.clone()
    }

    fn disconnected(&mut self, err: std::io::Error) -> PortError {
        warn!(port = %self.name, error = %err, "serial device disconnected");
        self.close();
        PortError::Closed
    }

    /// A hung-up tty keeps failing every call (EIO on Linux) without a
    /// dedicated error kind, so a run of failures also counts as a disconnect.
    fn failed(&mut self, err: std::io::Error) -> PortError {
        if err.kind() == ErrorKind::TimedOut {
            return PortError::Io(err);
        }
        self.failures += 1;
        if self.failures >= MAX_CONSECUTIVE_FAILURES {
            return self.disconnected(err);
        }
        PortError::Io(err)
    }
}

impl ByteSource for SerialSource {
    fn bytes_available(&mut self) -> Result<usize> {
        let port = self.port.as_ref().ok_or(PortError::Closed)?;
        match port.bytes_to_read() {
            Ok(0) => {
                self.failures = 0;
                Ok(0)
            }
            // Pending bytes only prove the port is healthy once a read succeeds.
            Ok(n) => Ok(n as usize),
            Err(err) if is_gone(&err) => Err(self.disconnected(err.into())),
            Err(err) => Err(self.failed(err.into())),
        }
    }

    fn read_byte(&mut self) -> Result<u8> {
        let port = self.port.as_mut().ok_or(PortError::Closed)?;
        let mut byte = [0u8; 1];
        match port.read(&mut byte) {
            Ok(1) => {
                self.failures = 0;
                Ok(byte[0])
            }
            Ok(_) => Err(self.failed(ErrorKind::UnexpectedEof.into())),
            Err(err) if is_disconnect(err.kind()) => Err(self.disconnected(err)),
            Err(err) => Err(self.failed(err)),
        }
    }

    fn is_open(&self) -> bool {
        self.port.is_some() && !self.shutdown.is_shutdown()
    }

    fn close(&mut self) {
        if let Some(port) = self.port.take() {
            drop(port);
            info!(port = %self.name, "serial port closed");
        }
    }

    /// Waits out the configured settle delay, then drops whatever the device
    /// printed while booting.
    fn settle(&mut self) -> bool {
        if !self.settle_delay.is_zero() {
            info!(port = %self.name, delay = ?self.settle_delay, "waiting for device to settle");
        }

        let deadline = Instant::now() + self.settle_delay;
        loop {
            if self.shutdown.is_shutdown() {
                return false;
            }
            let now = Instant::now();
            if now >= deadline {
                break;
            }
            std::thread::sleep(SETTLE_SLICE.min(deadline - now));
        }

        if let Some(port) = self.port.as_ref() {
            if let Err(err) = port.clear(serialport::ClearBuffer::Input) {
                debug!(port = %self.name, error = %err, "failed to clear input buffer after settle");
            }
        }
        true
    }
}

impl Drop for SerialSource {
    fn drop(&mut self) {
        self.close();
    }
}

impl std::fmt::Debug for SerialSource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SerialSource")
            .field("name", &self.name)
            .field("open", &self.port.is_some())
            .finish()
    }
}

/// `bytes_to_read` on a hung-up tty fails with an errno `serialport` has no
/// kind for (EIO), reported as `Unknown`.
fn is_gone(err: &serialport::Error) -> bool {
    match err.kind() {
        serialport::ErrorKind::NoDevice | serialport::ErrorKind::Unknown => true,
        serialport::ErrorKind::Io(kind) => is_disconnect(kind),
        _ => false,
    }
}

fn is_disconnect(kind: ErrorKind) -> bool {
    matches!(
        kind,
        ErrorKind::NotConnected | ErrorKind::BrokenPipe | ErrorKind::NotFound
    )
}
