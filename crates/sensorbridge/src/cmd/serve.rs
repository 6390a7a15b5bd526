use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use sensorbridge_frame::FramerConfig;
use sensorbridge_port::{ByteSource, MemorySource, PortConfig, ShutdownHandle};
use sensorbridge_service::{spawn_ingest, IngestConfig, LatestValueStore};
use tokio_util::sync::CancellationToken;
use tracing::{error, info, warn};

use crate::cmd::ServeArgs;
use crate::exit::{io_error, port_error, service_error, CliError, CliResult, SUCCESS, USAGE};
use crate::output::OutputFormat;

type BoxedSource = Box<dyn ByteSource + Send>;

pub fn run(args: ServeArgs, _format: OutputFormat) -> CliResult<i32> {
    let settle = parse_duration(&args.settle, true)?;
    let read_timeout = parse_duration(&args.read_timeout, false)?;
    let poll_interval = parse_duration(&args.poll_interval, false)?;
    if args.max_line_len == 0 {
        return Err(CliError::new(USAGE, "max line length must be greater than zero"));
    }

    let ingest_config = IngestConfig {
        framer: FramerConfig {
            poll_interval,
            max_line_len: args.max_line_len,
        },
        decode_mode: args.decode.into(),
    };

    // Without the source there is nothing to serve: open it before anything else.
    let (source, source_shutdown) = open_source(&args, settle, read_timeout)?;

    let runtime = tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()
        .map_err(|err| io_error("runtime start failed", err))?;

    runtime.block_on(bridge(args.listen, source, source_shutdown, ingest_config))
}

fn open_source(
    args: &ServeArgs,
    settle: Duration,
    read_timeout: Duration,
) -> CliResult<(BoxedSource, ShutdownHandle)> {
    if let Some(path) = &args.replay {
        let bytes = std::fs::read(path)
            .map_err(|err| io_error(&format!("failed to read {}", path.display()), err))?;
        info!(path = %path.display(), len = bytes.len(), "replaying captured byte stream");
        let source = MemorySource::new(bytes);
        let handle = source.shutdown_handle();
        return Ok((Box::new(source), handle));
    }

    let Some(port) = &args.port else {
        return Err(CliError::new(USAGE, "either --port or --replay is required"));
    };

    let config = PortConfig::new(port.as_str())
        .with_baud_rate(args.baud)
        .with_settle_delay(settle)
        .with_read_timeout(read_timeout);
    let source = sensorbridge_port::open(&config).map_err(|err| {
        error!(port = %config.port, error = %err, "cannot open serial port");
        port_error("serial port open failed", err)
    })?;
    let handle = source.shutdown_handle();
    Ok((Box::new(source), handle))
}

async fn bridge(
    listen: SocketAddr,
    source: BoxedSource,
    source_shutdown: ShutdownHandle,
    ingest_config: IngestConfig,
) -> CliResult<i32> {
    let store = Arc::new(LatestValueStore::new());

    // A failed bind drops `source` on return, which releases the port.
    let listener = sensorbridge_service::bind(listen)
        .await
        .map_err(|err| service_error("http bind failed", err))?;

    let ingest = spawn_ingest(source, ingest_config, Arc::clone(&store))
        .map_err(|err| service_error("ingestion start failed", err))?;

    let shutdown = CancellationToken::new();
    tokio::spawn(cancel_on_signal(shutdown.clone()));

    let served = sensorbridge_service::serve(listener, store, shutdown.clone()).await;

    shutdown.cancel();
    source_shutdown.shutdown();
    match tokio::task::spawn_blocking(move || ingest.join()).await {
        Ok(Ok(stats)) => info!(
            lines = stats.lines,
            records = stats.records,
            "ingestion thread finished"
        ),
        Ok(Err(_)) => error!("ingestion thread panicked"),
        Err(err) => warn!(error = %err, "failed to join ingestion thread"),
    }

    served.map_err(|err| service_error("http service failed", err))?;
    Ok(SUCCESS)
}

async fn cancel_on_signal(shutdown: CancellationToken) {
    match wait_for_signal().await {
        Ok(signal) => {
            info!(signal, "shutdown requested");
            shutdown.cancel();
        }
        Err(err) => warn!(error = %err, "cannot listen for shutdown signals; stop the process another way"),
    }
}

#[cfg(unix)]
async fn wait_for_signal() -> std::io::Result<&'static str> {
    use tokio::signal::unix::{signal, SignalKind};

    let mut terminate = signal(SignalKind::terminate())?;
    tokio::select! {
        res = tokio::signal::ctrl_c() => res.map(|()| "SIGINT"),
        _ = terminate.recv() => Ok("SIGTERM"),
    }
}

#[cfg(not(unix))]
async fn wait_for_signal() -> std::io::Result<&'static str> {
    tokio::signal::ctrl_c().await.map(|()| "ctrl-c")
}

/// Parse `3s`, `500ms` or a bare number of seconds.
fn parse_duration(input: &str, allow_zero: bool) -> CliResult<Duration> {
    let input = input.trim();
    if input.is_empty() {
        return Err(CliError::new(USAGE, "duration must not be empty"));
    }

    let (number, millis) = if let Some(num) = input.strip_suffix("ms") {
        (num, true)
    } else if let Some(num) = input.strip_suffix('s') {
        (num, false)
    } else {
        (input, false)
    };

    let value: u64 = number
        .trim()
        .parse()
        .map_err(|_| CliError::new(USAGE, format!("invalid duration: {input}")))?;

    if value == 0 && !allow_zero {
        return Err(CliError::new(USAGE, format!("duration must be greater than zero: {input}")));
    }

    if millis {
        Ok(Duration::from_millis(value))
    } else {
        Ok(Duration::from_secs(value))
    }
}
