use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use crate::error::Result;

/// A polled source of bytes, such as an open serial port.
///
/// The framer drives a source with a simple loop: ask how many bytes are
/// waiting, read them one at a time, and back off when nothing is available.
/// Implementations must not block for long in either call so that the loop
/// can notice [`ByteSource::is_open`] turning false.
pub trait ByteSource {
    /// Number of bytes that can be read without waiting.
    fn bytes_available(&mut self) -> Result<usize>;

    /// Read the next byte.
    ///
    /// Only called after [`ByteSource::bytes_available`] reported data.
    fn read_byte(&mut self) -> Result<u8>;

    /// Whether the source can still produce bytes.
    fn is_open(&self) -> bool;

    /// Close the source and release any underlying handle.
    fn close(&mut self);

    /// Wait until the attached device is ready to be read.
    ///
    /// Called once before the first poll. Returns `false` if the source was
    /// shut down while waiting.
    fn settle(&mut self) -> bool {
        true
    }
}

impl<S: ByteSource + ?Sized> ByteSource for Box<S> {
    fn bytes_available(&mut self) -> Result<usize> {
        (**self).bytes_available()
    }

    fn read_byte(&mut self) -> Result<u8> {
        (**self).read_byte()
    }

    fn is_open(&self) -> bool {
        (**self).is_open()
    }

    fn close(&mut self) {
        (**self).close()
    }

    fn settle(&mut self) -> bool {
        (**self).settle()
    }
}

/// Requests that a source report itself closed, from any thread.
///
/// The source notices the request on its next poll; the handle itself never
/// touches the port.
#[derive(Debug, Clone, Default)]
pub struct ShutdownHandle {
    requested: Arc<AtomicBool>,
}

impl ShutdownHandle {
    /// Create a handle with no shutdown requested.
    pub fn new() -> Self {
        Self::default()
    }

    /// Request shutdown.
    pub fn shutdown(&self) {
        self.requested.store(true, Ordering::SeqCst);
    }

    /// Whether shutdown has been requested.
    pub fn is_shutdown(&self) -> bool {
        self.requested.load(Ordering::SeqCst)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn shutdown_is_visible_through_clones() {
        let handle = ShutdownHandle::new();
        let other = handle.clone();
        assert!(!other.is_shutdown());

        handle.shutdown();
        assert!(other.is_shutdown());
    }

    #[test]
    fn shutdown_crosses_threads() {
        let handle = ShutdownHandle::new();
        let remote = handle.clone();
        std::thread::spawn(move || remote.shutdown())
            .join()
            .unwrap();
        assert!(handle.is_shutdown());
    }
}
