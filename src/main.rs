//! Driver binary: open the configured serial port, publish decoded records
//! as JSON lines on stdout, exit when the session ends.

use imu_driver::{AcquisitionLoop, DriverConfig, JsonLineSink, SerialChannel};
use log::{error, info};
use std::env;
use std::io;
use std::process::ExitCode;

fn main() -> ExitCode {
    env_logger::init();

    let config = match parse_args(env::args().skip(1)) {
        Ok(config) => config,
        Err(message) => {
            eprintln!("{}", message);
            eprintln!("usage: imu-driver [--config <path>] [<port>]");
            return ExitCode::from(2);
        }
    };

    let channel = match SerialChannel::open(config.channel_config()) {
        Ok(channel) => channel,
        Err(e) => {
            error!("failed to open {}: {}", config.port, e);
            return ExitCode::FAILURE;
        }
    };

    info!(
        "acquiring from {} at {} baud, frame {}",
        config.port, config.baud_rate, config.frame_id
    );

    let mut runner = AcquisitionLoop::new(
        Box::new(channel),
        config.parser(),
        config.assembler(),
    )
    .with_rate_command(config.output_rate_command.clone().into_bytes());

    let mut sink = JsonLineSink::new(io::stdout().lock());
    let report = runner.run(&mut sink);

    info!(
        "session ended: {} lines read, {} records published, {} rejected",
        report.lines_read, report.records_published, report.lines_rejected
    );

    if report.is_clean_shutdown() {
        ExitCode::SUCCESS
    } else {
        ExitCode::FAILURE
    }
}

/// Resolve the configuration: file if `--config` is given, defaults
/// otherwise; a positional port argument overrides the configured port.
fn parse_args(mut args: impl Iterator<Item = String>) -> Result<DriverConfig, String> {
    let mut config_path: Option<String> = None;
    let mut port: Option<String> = None;
    let mut verify_checksum = false;

    while let Some(arg) = args.next() {
        match arg.as_str() {
            "--config" => {
                config_path = Some(args.next().ok_or("--config requires a path")?);
            }
            "--verify-checksum" => verify_checksum = true,
            _ if arg.starts_with('-') => return Err(format!("unknown option: {}", arg)),
            _ => port = Some(arg),
        }
    }

    let mut config = match config_path {
        Some(path) => DriverConfig::from_file(path).map_err(|e| e.to_string())?,
        None => DriverConfig::default(),
    };
    if let Some(port) = port {
        config.port = port;
    }
    if verify_checksum {
        config.verify_checksum = true;
    }
    config.validate().map_err(|e| e.to_string())?;
    Ok(config)
}
