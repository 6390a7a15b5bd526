use std::time::Duration;

use bytes::{BufMut, BytesMut};
use sensorbridge_port::{ByteSource, PortError};
use tracing::{debug, trace, warn};

/// Byte that ends a line.
pub const LINE_TERMINATOR: u8 = b'\n';

/// Default wait before polling again when no bytes are available.
pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_millis(20);

/// Default maximum line length in bytes, excluding the terminator.
pub const DEFAULT_MAX_LINE_LEN: usize = 4 * 1024;

const INITIAL_BUFFER_CAPACITY: usize = 128;

/// Configuration for the line framer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FramerConfig {
    /// Wait before polling again when the source has nothing. Default: 20ms.
    pub poll_interval: Duration,
    /// Longest line kept; longer lines are dropped up to the next terminator.
    /// Default: 4 KiB.
    pub max_line_len: usize,
}

impl Default for FramerConfig {
    fn default() -> Self {
        Self {
            poll_interval: DEFAULT_POLL_INTERVAL,
            max_line_len: DEFAULT_MAX_LINE_LEN,
        }
    }
}

/// Splits a polled byte source into trimmed candidate lines.
///
/// Iterating a `LineFramer` blocks the calling thread: when the source has
/// no bytes it sleeps for [`FramerConfig::poll_interval`] and polls again.
/// The iterator ends only when the source reports closed; an unterminated
/// trailing line is dropped at that point. Run it on a dedicated thread.
pub struct LineFramer<S> {
    source: S,
    buf: BytesMut,
    config: FramerConfig,
    discarding: bool,
}

impl<S: ByteSource> LineFramer<S> {
    /// Create a framer with default configuration.
    pub fn new(source: S) -> Self {
        Self::with_config(source, FramerConfig::default())
    }

    /// Create a framer with explicit configuration.
    pub fn with_config(source: S, config: FramerConfig) -> Self {
        Self {
            source,
            buf: BytesMut::with_capacity(INITIAL_BUFFER_CAPACITY),
            config,
            discarding: false,
        }
    }

    /// Read the next candidate line, waiting for the source as needed.
    ///
    /// Returns `None` once the source is closed.
    pub fn next_line(&mut self) -> Option<String> {
        loop {
            if !self.source.is_open() {
                self.abandon();
                return None;
            }

            let available = match self.source.bytes_available() {
                Ok(n) => n,
                Err(err) => {
                    self.read_failed(err);
                    continue;
                }
            };

            if available == 0 {
                std::thread::sleep(self.config.poll_interval);
                continue;
            }

            for _ in 0..available {
                match self.source.read_byte() {
                    Ok(byte) => {
                        if let Some(line) = self.push(byte) {
                            return Some(line);
                        }
                    }
                    Err(err) => {
                        self.read_failed(err);
                        break;
                    }
                }
            }
        }
    }

    /// Borrow the underlying source.
    pub fn get_ref(&self) -> &S {
        &self.source
    }

    /// Mutably borrow the underlying source.
    pub fn get_mut(&mut self) -> &mut S {
        &mut self.source
    }

    /// Consume the framer and return the source. Buffered bytes are lost.
    pub fn into_inner(self) -> S {
        self.source
    }

    /// Current framer configuration.
    pub fn config(&self) -> &FramerConfig {
        &self.config
    }

    fn push(&mut self, byte: u8) -> Option<String> {
        if byte == LINE_TERMINATOR {
            if self.discarding {
                self.discarding = false;
                return None;
            }
            let line = trim_line(&self.buf);
            self.buf.clear();
            trace!(%line, "framed line");
            return Some(line);
        }

        if self.discarding {
            return None;
        }

        if self.buf.len() >= self.config.max_line_len {
            warn!(
                max_line_len = self.config.max_line_len,
                "discarding oversized line"
            );
            self.buf.clear();
            self.discarding = true;
            return None;
        }

        self.buf.put_u8(byte);
        None
    }

    fn read_failed(&mut self, err: PortError) {
        if matches!(err, PortError::Closed) {
            self.source.close();
            return;
        }
        warn!(error = %err, "transient read failure on byte source");
        std::thread::sleep(self.config.poll_interval);
    }

    fn abandon(&mut self) {
        if !self.buf.is_empty() {
            debug!(len = self.buf.len(), "dropping unterminated line at end of stream");
            self.buf.clear();
        }
        self.discarding = false;
    }
}

impl<S: ByteSource> Iterator for LineFramer<S> {
    type Item = String;

    fn next(&mut self) -> Option<String> {
        self.next_line()
    }
}

/// Decode raw line bytes as text and strip surrounding whitespace and control
/// characters (`\r`, NUL padding from the device's UART).
fn trim_line(raw: &[u8]) -> String {
    String::from_utf8_lossy(raw)
        .trim_matches(|c: char| c.is_whitespace() || c.is_control())
        .to_owned()
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;
    use std::time::Instant;

    use sensorbridge_port::{MemorySource, ShutdownHandle};

    use super::*;

    fn fast() -> FramerConfig {
        FramerConfig {
            poll_interval: Duration::from_millis(1),
            ..FramerConfig::default()
        }
    }

    fn frame_all(input: &[u8]) -> Vec<String> {
        LineFramer::with_config(MemorySource::new(input.to_vec()), fast()).collect()
    }

    #[test]
    fn splits_on_newline_and_trims() {
        let lines = frame_all(b"  hello \n\tworld\r\n{\"a\":1}\n");
        assert_eq!(lines, vec!["hello", "world", "{\"a\":1}"]);
    }

    #[test]
    fn emitted_line_matches_trimmed_input() {
        let cases: &[&str] = &[
            "",
            "x",
            "   padded   ",
            "{\"temperature\":22.1,\"humidity\":55.0}",
            "\t tabbed\t",
            "inner  spaces stay",
            "unicode °C 湿度",
        ];
        for case in cases {
            let mut input = case.as_bytes().to_vec();
            input.push(b'\n');
            let lines = frame_all(&input);
            assert_eq!(lines, vec![case.trim().to_string()], "input {case:?}");
        }
    }

    #[test]
    fn empty_lines_are_emitted() {
        let lines = frame_all(b"\n\nx\n");
        assert_eq!(lines, vec!["", "", "x"]);
    }

    #[test]
    fn unterminated_tail_is_dropped() {
        let lines = frame_all(b"first\n{\"temperature\":1");
        assert_eq!(lines, vec!["first"]);
    }

    #[test]
    fn invalid_utf8_is_replaced_not_fatal() {
        let lines = frame_all(b"ab\xFFcd\nok\n");
        assert_eq!(lines, vec!["ab\u{FFFD}cd", "ok"]);
    }

    #[test]
    fn nul_padding_is_trimmed() {
        let lines = frame_all(b"\0\0{\"temperature\":1}\r\n");
        assert_eq!(lines, vec!["{\"temperature\":1}"]);
    }

    #[test]
    fn handles_bytes_arriving_in_bursts() {
        let source = MemorySource::new(b"one\ntwo\nthree\n".to_vec()).with_chunk_size(2);
        let mut framer = LineFramer::with_config(source, fast());

        assert_eq!(framer.next_line().as_deref(), Some("one"));
        assert_eq!(framer.next_line().as_deref(), Some("two"));
        assert_eq!(framer.next_line().as_deref(), Some("three"));
        assert_eq!(framer.next_line(), None);
        assert!(framer.get_ref().idle_polls() > 0);
    }

    #[test]
    fn oversized_line_is_skipped_to_next_terminator() {
        let mut input = vec![b'x'; 64];
        input.extend_from_slice(b"\nshort\n");
        let cfg = FramerConfig {
            max_line_len: 16,
            ..fast()
        };
        let lines: Vec<String> =
            LineFramer::with_config(MemorySource::new(input), cfg).collect();
        assert_eq!(lines, vec!["short"]);
    }

    #[test]
    fn line_at_exact_limit_is_kept() {
        let mut input = vec![b'y'; 16];
        input.push(b'\n');
        let cfg = FramerConfig {
            max_line_len: 16,
            ..fast()
        };
        let lines: Vec<String> =
            LineFramer::with_config(MemorySource::new(input), cfg).collect();
        assert_eq!(lines, vec!["y".repeat(16)]);
    }

    #[test]
    fn transient_read_error_does_not_end_stream() {
        let source = FlakySource {
            bytes: b"a\nb\n".to_vec(),
            pos: 0,
            fail_at: 2,
            failures: Arc::new(AtomicUsize::new(0)),
        };
        let failures = Arc::clone(&source.failures);
        let lines: Vec<String> = LineFramer::with_config(source, fast()).collect();

        assert_eq!(lines, vec!["a", "b"]);
        assert_eq!(failures.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn shutdown_ends_idle_stream() {
        let shutdown = ShutdownHandle::new();
        let source = IdleSource {
            shutdown: shutdown.clone(),
        };
        let remote = shutdown.clone();
        let stopper = std::thread::spawn(move || {
            std::thread::sleep(Duration::from_millis(30));
            remote.shutdown();
        });

        let start = Instant::now();
        let mut framer = LineFramer::with_config(source, fast());
        assert_eq!(framer.next_line(), None);
        assert!(start.elapsed() < Duration::from_secs(5));
        stopper.join().unwrap();
    }

    #[test]
    fn into_inner_returns_source() {
        let framer = LineFramer::new(MemorySource::new(b"abc\n".to_vec()));
        assert_eq!(framer.config().poll_interval, DEFAULT_POLL_INTERVAL);
        let source = framer.into_inner();
        assert_eq!(source.remaining(), 4);
    }

    /// Fails one read with a timeout, then behaves.
    struct FlakySource {
        bytes: Vec<u8>,
        pos: usize,
        fail_at: usize,
        failures: Arc<AtomicUsize>,
    }

    impl ByteSource for FlakySource {
        fn bytes_available(&mut self) -> sensorbridge_port::Result<usize> {
            Ok(self.bytes.len() - self.pos)
        }

        fn read_byte(&mut self) -> sensorbridge_port::Result<u8> {
            if self.pos == self.fail_at && self.failures.load(Ordering::SeqCst) == 0 {
                self.failures.fetch_add(1, Ordering::SeqCst);
                return Err(PortError::Io(std::io::ErrorKind::TimedOut.into()));
            }
            let byte = self.bytes[self.pos];
            self.pos += 1;
            Ok(byte)
        }

        fn is_open(&self) -> bool {
            self.pos < self.bytes.len()
        }

        fn close(&mut self) {
            self.pos = self.bytes.len();
        }
    }

    /// Never has data; closes only on shutdown.
    struct IdleSource {
        shutdown: ShutdownHandle,
    }

    impl ByteSource for IdleSource {
        fn bytes_available(&mut self) -> sensorbridge_port::Result<usize> {
            Ok(0)
        }

        fn read_byte(&mut self) -> sensorbridge_port::Result<u8> {
            Err(PortError::Closed)
        }

        fn is_open(&self) -> bool {
            !self.shutdown.is_shutdown()
        }

        fn close(&mut self) {
            self.shutdown.shutdown();
        }
    }
}
