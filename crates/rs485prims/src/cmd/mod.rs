use std::time::Duration;

use clap::{Args, Subcommand, ValueEnum};
use rs485prims_frame::{ANALOG_INPUT, DIGITAL_INPUT, DIGITAL_OUTPUT, HOST};
use rs485prims_session::{connect_with_config, Session, SessionConfig};
use rs485prims_transport::SerialConfig;

use crate::exit::{session_error, CliError, CliResult};
use crate::output::OutputFormat;

pub mod analog;
pub mod digital;
pub mod monitor;
pub mod query;
pub mod version;

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Check that a peer answers.
    Ping(AddressArgs),
    /// Show a peer's firmware version.
    Firmware(AddressArgs),
    /// Show a peer's health and traffic counters.
    Status(AddressArgs),
    /// Send one heartbeat and show the answer.
    Heartbeat(AddressArgs),
    /// Read the digital inputs.
    ReadDi(AddressArgs),
    /// Read back the digital outputs.
    ReadDo(AddressArgs),
    /// Set the digital outputs. Channels not listed are switched off.
    WriteDo(WriteDoArgs),
    /// Read analog inputs.
    Analog(AnalogArgs),
    /// Poll every peer's health until interrupted.
    Monitor(MonitorArgs),
    /// Show version information.
    Version(VersionArgs),
}

pub fn run(command: Command, format: OutputFormat) -> CliResult<i32> {
    match command {
        Command::Ping(args) => query::ping(args, format),
        Command::Firmware(args) => query::firmware(args, format),
        Command::Status(args) => query::status(args, format),
        Command::Heartbeat(args) => query::heartbeat(args, format),
        Command::ReadDi(args) => digital::read_inputs(args, format),
        Command::ReadDo(args) => digital::read_outputs(args, format),
        Command::WriteDo(args) => digital::write_outputs(args, format),
        Command::Analog(args) => analog::run(args, format),
        Command::Monitor(args) => monitor::run(args, format),
        Command::Version(args) => version::run(args),
    }
}

/// Serial port options shared by every bus command.
#[derive(Args, Debug)]
pub struct BusArgs {
    /// Serial port device (e.g. /dev/ttyUSB0, COM3).
    #[arg(long, short = 'p', env = "RS485_PORT")]
    pub port: String,
    /// Baud rate.
    #[arg(long, env = "RS485_BAUD", default_value_t = rs485prims_transport::DEFAULT_BAUD_RATE)]
    pub baud: u32,
    /// Response timeout per request (e.g. 1s, 250ms).
    #[arg(long, default_value = "1s", value_parser = parse_duration)]
    pub timeout: Duration,
    /// Host address to send from.
    #[arg(long, default_value_t = HOST, value_parser = parse_address)]
    pub host: u8,
}

impl BusArgs {
    pub fn session_config(&self) -> SessionConfig {
        let defaults = SessionConfig::default();
        SessionConfig {
            host_address: self.host,
            serial: SerialConfig::with_baud_rate(self.baud),
            default_timeout: self.timeout,
            // Output writes keep their extra margin over ordinary requests.
            write_timeout: self.timeout.max(defaults.write_timeout),
            ..defaults
        }
    }

    pub fn connect(&self) -> CliResult<Session> {
        connect_with_config(&self.port, self.session_config())
            .map_err(|err| session_error("connect failed", err))
    }
}

#[derive(Args, Debug)]
pub struct AddressArgs {
    #[command(flatten)]
    pub bus: BusArgs,
    /// Peer address: a number (3, 0x03) or analog-input, digital-input, digital-output.
    #[arg(value_parser = parse_address)]
    pub address: u8,
}

#[derive(Args, Debug)]
pub struct WriteDoArgs {
    #[command(flatten)]
    pub bus: BusArgs,
    /// Peer address.
    #[arg(value_parser = parse_address, default_value = "digital-output")]
    pub address: u8,
    /// Channels to switch on (comma-separated, 0-55).
    #[arg(long, value_delimiter = ',')]
    pub on: Vec<usize>,
    /// Read the outputs back after writing and print them.
    #[arg(long)]
    pub verify: bool,
}

#[derive(Copy, Clone, Debug, PartialEq, Eq, ValueEnum)]
pub enum AnalogSelection {
    Current,
    Voltage,
    Temperature,
    All,
}

#[derive(Args, Debug)]
pub struct AnalogArgs {
    #[command(flatten)]
    pub bus: BusArgs,
    /// Peer address.
    #[arg(value_parser = parse_address, default_value = "analog-input")]
    pub address: u8,
    /// Which analog group to read.
    #[arg(long, value_enum, default_value = "all")]
    pub kind: AnalogSelection,
}

#[derive(Args, Debug)]
pub struct MonitorArgs {
    #[command(flatten)]
    pub bus: BusArgs,
    /// Time between polling rounds (e.g. 2s, 500ms).
    #[arg(long, default_value = "2s", value_parser = parse_duration)]
    pub interval: Duration,
    /// Exit after N polling rounds.
    #[arg(long)]
    pub count: Option<usize>,
    /// Peers to poll (comma-separated). Default: all known peers.
    #[arg(long, value_delimiter = ',', value_parser = parse_address)]
    pub peers: Vec<u8>,
}

#[derive(Args, Debug)]
pub struct VersionArgs {
    /// Show extended build provenance.
    #[arg(long)]
    pub extended: bool,
}

pub fn parse_duration(input: &str) -> Result<Duration, CliError> {
    let input = input.trim();
    if input.is_empty() {
        return Err(CliError::usage("duration must not be empty"));
    }

    let (number, unit) = if let Some(num) = input.strip_suffix("ms") {
        (num, "ms")
    } else if let Some(num) = input.strip_suffix('s') {
        (num, "s")
    } else {
        (input, "s")
    };

    let value: u64 = number
        .trim()
        .parse()
        .map_err(|_| CliError::usage(format!("invalid duration: {input}")))?;

    if value == 0 {
        return Err(CliError::usage("duration must be greater than zero"));
    }

    Ok(match unit {
        "ms" => Duration::from_millis(value),
        _ => Duration::from_secs(value),
    })
}

pub fn parse_address(input: &str) -> Result<u8, CliError> {
    let input = input.trim().to_ascii_lowercase();
    let named = match input.as_str() {
        "analog-input" | "analog" | "ai" => Some(ANALOG_INPUT),
        "digital-input" | "di" => Some(DIGITAL_INPUT),
        "digital-output" | "do" => Some(DIGITAL_OUTPUT),
        "host" => Some(HOST),
        _ => None,
    };
    if let Some(address) = named {
        return Ok(address);
    }

    let parsed = match input.strip_prefix("0x") {
        Some(hex) => u8::from_str_radix(hex, 16),
        None => input.parse(),
    };
    parsed.map_err(|_| CliError::usage(format!("invalid address: {input}")))
}
