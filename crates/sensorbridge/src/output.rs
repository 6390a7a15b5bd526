use std::io::IsTerminal;

use clap::ValueEnum;
use comfy_table::{presets::UTF8_FULL, ContentArrangement, Table};
use sensorbridge_port::PortInfo;
use serde::Serialize;

#[derive(Clone, Debug, Copy, ValueEnum)]
pub enum OutputFormat {
    Json,
    Table,
    Pretty,
}

impl OutputFormat {
    pub fn default_for_stdout() -> Self {
        if std::io::stdout().is_terminal() {
            Self::Table
        } else {
            Self::Json
        }
    }
}

#[derive(Serialize)]
struct PortsOutput<'a> {
    count: usize,
    ports: &'a [PortInfo],
}

pub fn print_ports(ports: &[PortInfo], format: OutputFormat) {
    match format {
        OutputFormat::Json => {
            let out = PortsOutput {
                count: ports.len(),
                ports,
            };
            println!(
                "{}",
                serde_json::to_string(&out).unwrap_or_else(|_| "{}".to_string())
            );
        }
        OutputFormat::Table => {
            if ports.is_empty() {
                println!("no serial ports found");
                return;
            }
            let mut table = Table::new();
            table
                .load_preset(UTF8_FULL)
                .set_content_arrangement(ContentArrangement::Dynamic)
                .set_header(vec!["PORT", "TYPE", "VID:PID", "MANUFACTURER", "PRODUCT"]);
            for port in ports {
                table.add_row(vec![
                    port.name.clone(),
                    port.port_type.to_string(),
                    usb_id(port),
                    port.manufacturer.clone().unwrap_or_default(),
                    port.product.clone().unwrap_or_default(),
                ]);
            }
            println!("{table}");
        }
        OutputFormat::Pretty => {
            for port in ports {
                println!(
                    "{} type={} id={} product={}",
                    port.name,
                    port.port_type,
                    usb_id(port),
                    port.product.as_deref().unwrap_or("-")
                );
            }
        }
    }
}

fn usb_id(port: &PortInfo) -> String {
    match (port.vid, port.pid) {
        (Some(vid), Some(pid)) => format!("{vid:04x}:{pid:04x}"),
        _ => "-".to_string(),
    }
}
