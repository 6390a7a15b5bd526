use std::collections::VecDeque;

use crate::error::{PortError, Result};
use crate::source::{ByteSource, ShutdownHandle};

/// An in-memory [`ByteSource`] that closes once drained.
///
/// Used to replay a captured serial stream and in tests. With a chunk size
/// set, the source delivers at most that many bytes per burst and reports
/// nothing available between bursts, the way a slow serial line does.
#[derive(Debug, Clone)]
pub struct MemorySource {
    data: VecDeque<u8>,
    chunk_size: Option<usize>,
    burst_left: usize,
    idle_polls: usize,
    closed: bool,
    shutdown: ShutdownHandle,
}

impl MemorySource {
    /// Create a source that yields `data` and then reports closed.
    pub fn new(data: impl Into<Vec<u8>>) -> Self {
        Self {
            data: VecDeque::from(data.into()),
            chunk_size: None,
            burst_left: 0,
            idle_polls: 0,
            closed: false,
            shutdown: ShutdownHandle::new(),
        }
    }

    /// Deliver bytes in bursts of at most `chunk_size`, with an empty poll
    /// between bursts.
    pub fn with_chunk_size(mut self, chunk_size: usize) -> Self {
        self.chunk_size = Some(chunk_size.max(1));
        self
    }

    /// Handle that makes this source report closed from another thread.
    pub fn shutdown_handle(&self) -> ShutdownHandle {
        self.shutdown.clone()
    }

    /// Bytes not yet read.
    pub fn remaining(&self) -> usize {
        self.data.len()
    }

    /// Number of polls that found no byte available.
    pub fn idle_polls(&self) -> usize {
        self.idle_polls
    }
}

impl ByteSource for MemorySource {
    fn bytes_available(&mut self) -> Result<usize> {
        if !self.is_open() {
            return Err(PortError::Closed);
        }

        let Some(chunk) = self.chunk_size else {
            return Ok(self.data.len());
        };

        if self.burst_left == 0 {
            // Gap between bursts: report nothing once, then start the next one.
            self.burst_left = chunk.min(self.data.len());
            self.idle_polls += 1;
            return Ok(0);
        }
        Ok(self.burst_left)
    }

    fn read_byte(&mut self) -> Result<u8> {
        if self.shutdown.is_shutdown() || self.closed {
            return Err(PortError::Closed);
        }
        let byte = self.data.pop_front().ok_or(PortError::Closed)?;
        self.burst_left = self.burst_left.saturating_sub(1);
        Ok(byte)
    }

    fn is_open(&self) -> bool {
        !self.closed && !self.data.is_empty() && !self.shutdown.is_shutdown()
    }

    fn close(&mut self) {
        self.closed = true;
        self.data.clear();
    }
}
