use rs485prims_session::AnalogKind;

use crate::cmd::{AnalogArgs, AnalogSelection};
use crate::exit::{no_response, session_error, CliResult, SUCCESS};
use crate::output::{print_analog, OutputFormat};

pub fn run(args: AnalogArgs, format: OutputFormat) -> CliResult<i32> {
    let session = args.bus.connect()?;

    let kind = match args.kind {
        AnalogSelection::Current => AnalogKind::Current,
        AnalogSelection::Voltage => AnalogKind::Voltage,
        AnalogSelection::Temperature => AnalogKind::Temperature,
        AnalogSelection::All => {
            let snapshot = session
                .read_all_analog(args.address)
                .map_err(|err| session_error("analog read failed", err))?
                .ok_or_else(|| no_response("analog readings", args.address))?;
            let groups: Vec<_> = AnalogKind::ALL
                .iter()
                .map(|&kind| (kind, snapshot.group(kind)))
                .collect();
            print_analog(args.address, &groups, format);
            return Ok(SUCCESS);
        }
    };

    let readings = session
        .read_analog_channels(args.address, kind)
        .map_err(|err| session_error("analog read failed", err))?
        .ok_or_else(|| no_response("analog readings", args.address))?;
    print_analog(args.address, &[(kind, readings.as_slice())], format);
    Ok(SUCCESS)
}
