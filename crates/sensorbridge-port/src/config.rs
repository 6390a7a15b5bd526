use std::time::Duration;

/// Default line speed of the sensor firmware.
pub const DEFAULT_BAUD_RATE: u32 = 9600;

/// Default wait after opening the port before reading.
///
/// Opening the port resets most USB-serial microcontroller boards; they print
/// boot output for a couple of seconds before the first reading.
pub const DEFAULT_SETTLE_DELAY: Duration = Duration::from_secs(3);

/// Default timeout for a single blocking read on the port.
pub const DEFAULT_READ_TIMEOUT: Duration = Duration::from_millis(50);

/// Serial connection parameters.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PortConfig {
    /// Port identifier (`/dev/ttyUSB0`, `COM3`, ...).
    pub port: String,
    /// Line speed in baud. Default: 9600.
    pub baud_rate: u32,
    /// Delay between a successful open and the first read. Default: 3s.
    pub settle_delay: Duration,
    /// Read timeout handed to the serial driver. Default: 50ms.
    pub read_timeout: Duration,
}

impl PortConfig {
    /// Configuration for `port` with default line settings.
    pub fn new(port: impl Into<String>) -> Self {
        Self {
            port: port.into(),
            baud_rate: DEFAULT_BAUD_RATE,
            settle_delay: DEFAULT_SETTLE_DELAY,
            read_timeout: DEFAULT_READ_TIMEOUT,
        }
    }

    /// Override the baud rate.
    pub fn with_baud_rate(mut self, baud_rate: u32) -> Self {
        self.baud_rate = baud_rate;
        self
    }

    /// Override the post-open settle delay.
    pub fn with_settle_delay(mut self, settle_delay: Duration) -> Self {
        self.settle_delay = settle_delay;
        self
    }

    /// Override the driver read timeout.
    pub fn with_read_timeout(mut self, read_timeout: Duration) -> Self {
        self.read_timeout = read_timeout;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn new_uses_defaults() {
        let cfg = PortConfig::new("/dev/ttyACM0");
        assert_eq!(cfg.port, "/dev/ttyACM0");
        assert_eq!(cfg.baud_rate, 9600);
        assert_eq!(cfg.settle_delay, Duration::from_secs(3));
        assert_eq!(cfg.read_timeout, Duration::from_millis(50));
    }

    #[test]
    fn builders_override_fields() {
        let cfg = PortConfig::new("COM3")
            .with_baud_rate(115_200)
            .with_settle_delay(Duration::ZERO)
            .with_read_timeout(Duration::from_millis(200));
        assert_eq!(cfg.baud_rate, 115_200);
        assert_eq!(cfg.settle_delay, Duration::ZERO);
        assert_eq!(cfg.read_timeout, Duration::from_millis(200));
    }
}
