use rs485prims_session::{DigitalChannels, DIGITAL_CHANNELS};
use tracing::info;

use crate::cmd::{AddressArgs, WriteDoArgs};
use crate::exit::{no_response, session_error, CliError, CliResult, NO_RESPONSE, SUCCESS};
use crate::output::{print_channels, OutputFormat};

pub fn read_inputs(args: AddressArgs, format: OutputFormat) -> CliResult<i32> {
    let session = args.bus.connect()?;
    let inputs = session
        .read_digital_inputs(args.address)
        .map_err(|err| session_error("input read failed", err))?
        .ok_or_else(|| no_response("digital inputs", args.address))?;

    print_channels(args.address, "inputs", &inputs, format);
    Ok(SUCCESS)
}

pub fn read_outputs(args: AddressArgs, format: OutputFormat) -> CliResult<i32> {
    let session = args.bus.connect()?;
    let outputs = session
        .read_digital_outputs(args.address)
        .map_err(|err| session_error("output read failed", err))?
        .ok_or_else(|| no_response("digital outputs", args.address))?;

    print_channels(args.address, "outputs", &outputs, format);
    Ok(SUCCESS)
}

pub fn write_outputs(args: WriteDoArgs, format: OutputFormat) -> CliResult<i32> {
    let outputs = requested_outputs(&args.on)?;
    let session = args.bus.connect()?;

    let acknowledged = session
        .write_digital_outputs(args.address, &outputs)
        .map_err(|err| session_error("output write failed", err))?;
    if !acknowledged {
        return Err(no_response("write acknowledgement", args.address));
    }
    info!(
        address = args.address,
        active = outputs.count_active(),
        "outputs written"
    );

    if !args.verify {
        print_channels(args.address, "outputs", &outputs, format);
        return Ok(SUCCESS);
    }

    let readback = session
        .read_digital_outputs(args.address)
        .map_err(|err| session_error("output read failed", err))?
        .ok_or_else(|| no_response("digital outputs", args.address))?;
    print_channels(args.address, "outputs", &readback, format);

    if readback != outputs {
        return Err(CliError::new(
            NO_RESPONSE,
            format!(
                "read-back differs: wrote {:?}, peer reports {:?}",
                outputs.active(),
                readback.active()
            ),
        ));
    }
    Ok(SUCCESS)
}

fn requested_outputs(on: &[usize]) -> CliResult<DigitalChannels> {
    if let Some(bad) = on.iter().find(|&&ch| ch >= DIGITAL_CHANNELS) {
        return Err(CliError::usage(format!(
            "channel {bad} out of range (0-{})",
            DIGITAL_CHANNELS - 1
        )));
    }
    Ok(DigitalChannels::from_active(on))
}
