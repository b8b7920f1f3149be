use std::io::IsTerminal;

use clap::ValueEnum;
use comfy_table::{presets::UTF8_FULL, ContentArrangement, Table};
use rs485prims_frame::address_name;
use rs485prims_session::{AnalogKind, AnalogReading, DigitalChannels, HealthEvent, DIGITAL_CHANNELS};
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

/// Print one result. `rows` is the human-readable rendering of `value`.
pub fn print_record<T: Serialize>(value: &T, rows: &[(&str, String)], format: OutputFormat) {
    match format {
        OutputFormat::Json => print_json(value),
        OutputFormat::Table => {
            let mut table = new_table(vec!["FIELD", "VALUE"]);
            for (field, text) in rows {
                table.add_row(vec![field.to_string(), text.clone()]);
            }
            println!("{table}");
        }
        OutputFormat::Pretty => {
            let width = rows.iter().map(|(field, _)| field.len()).max().unwrap_or(0);
            for (field, text) in rows {
                println!("{:width$}  {text}", format!("{field}:"), width = width + 1);
            }
        }
    }
}

#[derive(Serialize)]
struct ChannelsOutput<'a> {
    address: u8,
    peer: &'static str,
    kind: &'a str,
    active: &'a DigitalChannels,
    raw: String,
}

/// Print a 56-channel bitfield. Tables show an 8-wide grid, one row per byte.
pub fn print_channels(address: u8, kind: &str, channels: &DigitalChannels, format: OutputFormat) {
    match format {
        OutputFormat::Json => print_json(&ChannelsOutput {
            address,
            peer: address_name(address),
            kind,
            active: channels,
            raw: hex(channels.as_bytes()),
        }),
        OutputFormat::Table => {
            let mut header = vec!["CH".to_string()];
            header.extend((0..8).map(|bit| format!("+{bit}")));
            let mut table = new_table(header);
            for base in (0..DIGITAL_CHANNELS).step_by(8) {
                let mut row = vec![format!("{base:02}")];
                for ch in base..base + 8 {
                    row.push(on_off(channels.get(ch)).to_string());
                }
                table.add_row(row);
            }
            println!("{table}");
        }
        OutputFormat::Pretty => {
            let active = channels.active();
            let list = if active.is_empty() {
                "none".to_string()
            } else {
                active
                    .iter()
                    .map(usize::to_string)
                    .collect::<Vec<_>>()
                    .join(",")
            };
            println!(
                "{} {kind}: {}/{} on [{list}]",
                address_name(address),
                active.len(),
                DIGITAL_CHANNELS
            );
        }
    }
}

#[derive(Serialize)]
struct AnalogRow {
    group: AnalogKind,
    channel: usize,
    raw: Option<u16>,
    value: f32,
    unit: &'static str,
}

pub fn print_analog(address: u8, groups: &[(AnalogKind, &[AnalogReading])], format: OutputFormat) {
    let rows: Vec<AnalogRow> = groups
        .iter()
        .flat_map(|(kind, readings)| {
            readings
                .iter()
                .enumerate()
                .map(move |(channel, r)| AnalogRow {
                    group: *kind,
                    channel,
                    raw: r.raw,
                    value: r.value,
                    unit: kind.unit(),
                })
        })
        .collect();

    match format {
        OutputFormat::Json => {
            #[derive(Serialize)]
            struct AnalogOutput<'a> {
                address: u8,
                peer: &'static str,
                readings: &'a [AnalogRow],
            }
            print_json(&AnalogOutput {
                address,
                peer: address_name(address),
                readings: &rows,
            });
        }
        OutputFormat::Table => {
            let mut table = new_table(vec!["GROUP", "CH", "RAW", "VALUE"]);
            for row in &rows {
                table.add_row(vec![
                    format!("{:?}", row.group).to_lowercase(),
                    row.channel.to_string(),
                    row.raw
                        .map(|r| r.to_string())
                        .unwrap_or_else(|| "-".to_string()),
                    format!("{:.3} {}", row.value, row.unit),
                ]);
            }
            println!("{table}");
        }
        OutputFormat::Pretty => {
            for row in &rows {
                let raw = row.raw.map(|r| format!(" (raw {r})")).unwrap_or_default();
                println!(
                    "{:?}[{:02}] = {:.3} {}{raw}",
                    row.group, row.channel, row.value, row.unit
                );
            }
        }
    }
}

/// Monitor output is a stream: JSON is one object per line.
pub fn print_health(event: &HealthEvent, format: OutputFormat) {
    match format {
        OutputFormat::Json => print_json(event),
        OutputFormat::Table | OutputFormat::Pretty => match event {
            HealthEvent::Up {
                address,
                peer_id,
                health,
                status,
            } => {
                let detail = status
                    .map(|s| {
                        format!(
                            " uptime={} errors={} rx={} tx={}",
                            s.uptime_hms(),
                            s.error_count,
                            s.rx_packets,
                            s.tx_packets
                        )
                    })
                    .unwrap_or_default();
                println!(
                    "{:<15} {address:#04x} up   id={peer_id} health={health}%{detail}",
                    address_name(*address)
                );
            }
            HealthEvent::Down { address } => {
                println!("{:<15} {address:#04x} down", address_name(*address));
            }
        },
    }
}

pub fn on_off(on: bool) -> &'static str {
    if on {
        "on"
    } else {
        "."
    }
}

pub fn hex(bytes: &[u8]) -> String {
    bytes.iter().map(|b| format!("{b:02x}")).collect()
}

fn print_json<T: Serialize + ?Sized>(value: &T) {
    println!(
        "{}",
        serde_json::to_string(value).unwrap_or_else(|_| "{}".to_string())
    );
}

fn new_table<T: Into<comfy_table::Cell>>(header: Vec<T>) -> Table {
    let mut table = Table::new();
    table
        .load_preset(UTF8_FULL)
        .set_content_arrangement(ContentArrangement::Dynamic)
        .set_header(header);
    table
}
