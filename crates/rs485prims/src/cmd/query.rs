use std::time::Instant;

use rs485prims_frame::address_name;
use serde::Serialize;

use crate::cmd::AddressArgs;
use crate::exit::{no_response, session_error, CliResult, SUCCESS};
use crate::output::{print_record, OutputFormat};

#[derive(Serialize)]
struct PingOutput {
    address: u8,
    peer: &'static str,
    reachable: bool,
    latency_ms: f64,
}

pub fn ping(args: AddressArgs, format: OutputFormat) -> CliResult<i32> {
    let session = args.bus.connect()?;
    let start = Instant::now();
    let reachable = session
        .ping(args.address)
        .map_err(|err| session_error("ping failed", err))?;
    if !reachable {
        return Err(no_response("ping response", args.address));
    }

    let latency_ms = (start.elapsed().as_secs_f64() * 1000.0 * 100.0).round() / 100.0;
    let out = PingOutput {
        address: args.address,
        peer: address_name(args.address),
        reachable,
        latency_ms,
    };
    print_record(
        &out,
        &[
            ("peer", peer_label(args.address)),
            ("reachable", "yes".to_string()),
            ("latency", format!("{latency_ms:.2}ms")),
        ],
        format,
    );
    Ok(SUCCESS)
}

pub fn firmware(args: AddressArgs, format: OutputFormat) -> CliResult<i32> {
    let session = args.bus.connect()?;
    let version = session
        .get_version(args.address)
        .map_err(|err| session_error("version request failed", err))?
        .ok_or_else(|| no_response("version", args.address))?;

    print_record(
        &version,
        &[
            ("peer", peer_label(args.address)),
            ("firmware", version.to_string()),
            ("peer id", format!("{:#04x}", version.peer_id)),
        ],
        format,
    );
    Ok(SUCCESS)
}

pub fn status(args: AddressArgs, format: OutputFormat) -> CliResult<i32> {
    let session = args.bus.connect()?;
    let status = session
        .get_status(args.address)
        .map_err(|err| session_error("status request failed", err))?
        .ok_or_else(|| no_response("status", args.address))?;

    print_record(
        &status,
        &[
            ("peer", peer_label(args.address)),
            ("peer id", format!("{:#04x}", status.peer_id)),
            ("health", format!("{}%", status.health)),
            ("uptime", status.uptime_hms()),
            ("errors", status.error_count.to_string()),
            ("rx packets", status.rx_packets.to_string()),
            ("tx packets", status.tx_packets.to_string()),
        ],
        format,
    );
    Ok(SUCCESS)
}

pub fn heartbeat(args: AddressArgs, format: OutputFormat) -> CliResult<i32> {
    let session = args.bus.connect()?;
    let beat = session
        .heartbeat(args.address)
        .map_err(|err| session_error("heartbeat failed", err))?
        .ok_or_else(|| no_response("heartbeat", args.address))?;

    print_record(
        &beat,
        &[
            ("peer", peer_label(args.address)),
            ("peer id", format!("{:#04x}", beat.peer_id)),
            ("health", format!("{}%", beat.health)),
        ],
        format,
    );
    Ok(SUCCESS)
}

pub fn peer_label(address: u8) -> String {
    format!("{} ({address:#04x})", address_name(address))
}
