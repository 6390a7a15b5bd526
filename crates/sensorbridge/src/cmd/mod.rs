use std::net::SocketAddr;
use std::path::PathBuf;

use clap::{Args, Subcommand, ValueEnum};
use sensorbridge_frame::{DecodeMode, DEFAULT_MAX_LINE_LEN};
use sensorbridge_port::DEFAULT_BAUD_RATE;

use crate::exit::CliResult;
use crate::output::OutputFormat;

pub mod ports;
pub mod serve;
pub mod version;

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Read sensor records from a serial port and serve the latest over HTTP.
    Serve(ServeArgs),
    /// List serial ports.
    Ports(PortsArgs),
    /// Show version information.
    Version(VersionArgs),
}

pub fn run(command: Command, format: OutputFormat) -> CliResult<i32> {
    match command {
        Command::Serve(args) => serve::run(args, format),
        Command::Ports(args) => ports::run(args, format),
        Command::Version(args) => version::run(args),
    }
}

/// Treatment of missing or non-numeric record fields.
#[derive(Copy, Clone, Debug, ValueEnum)]
pub enum DecodeArg {
    /// Substitute 0 for missing or non-numeric fields.
    Lenient,
    /// Discard records with missing or non-numeric fields.
    Strict,
}

impl From<DecodeArg> for DecodeMode {
    fn from(arg: DecodeArg) -> Self {
        match arg {
            DecodeArg::Lenient => DecodeMode::Lenient,
            DecodeArg::Strict => DecodeMode::Strict,
        }
    }
}

#[derive(Args, Debug)]
pub struct ServeArgs {
    /// Serial port to read (e.g. /dev/ttyACM0, COM3).
    #[arg(
        long,
        short = 'p',
        env = "SENSORBRIDGE_PORT",
        required_unless_present = "replay",
        conflicts_with = "replay"
    )]
    pub port: Option<String>,
    /// Serial baud rate.
    #[arg(long, default_value_t = DEFAULT_BAUD_RATE, env = "SENSORBRIDGE_BAUD")]
    pub baud: u32,
    /// HTTP listen address.
    #[arg(long, default_value = "0.0.0.0:8080", env = "SENSORBRIDGE_LISTEN")]
    pub listen: SocketAddr,
    /// Wait after opening the port before reading (e.g. 3s, 500ms, 0).
    #[arg(long, default_value = "3s", env = "SENSORBRIDGE_SETTLE")]
    pub settle: String,
    /// Driver timeout for a single serial read (e.g. 50ms).
    #[arg(long, default_value = "50ms", env = "SENSORBRIDGE_READ_TIMEOUT")]
    pub read_timeout: String,
    /// Wait between polls when no bytes are available (e.g. 20ms).
    #[arg(long, default_value = "20ms")]
    pub poll_interval: String,
    /// Longest accepted line in bytes.
    #[arg(long, default_value_t = DEFAULT_MAX_LINE_LEN)]
    pub max_line_len: usize,
    /// Record decoding mode.
    #[arg(long, value_enum, default_value = "lenient", env = "SENSORBRIDGE_DECODE")]
    pub decode: DecodeArg,
    /// Replay a captured serial byte stream from a file instead of opening a port.
    #[arg(long, value_name = "FILE")]
    pub replay: Option<PathBuf>,
}

#[derive(Args, Debug, Default)]
pub struct PortsArgs {}

#[derive(Args, Debug)]
pub struct VersionArgs {
    /// Show extended build provenance.
    #[arg(long)]
    pub extended: bool,
}
