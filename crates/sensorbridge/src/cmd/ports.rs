use crate::cmd::PortsArgs;
use crate::exit::{port_error, CliResult, SUCCESS};
use crate::output::{print_ports, OutputFormat};

pub fn run(_args: PortsArgs, format: OutputFormat) -> CliResult<i32> {
    let ports =
        sensorbridge_port::list_ports().map_err(|err| port_error("port enumeration failed", err))?;
    tracing::debug!(count = ports.len(), "enumerated serial ports");

    print_ports(&ports, format);
    Ok(SUCCESS)
}
