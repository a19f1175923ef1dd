//! Bench probe for a serial-attached gimbal.
//!
//! Opens the port, runs the identity handshake, prints the firmware
//! version, and optionally moves the gimbal and streams `DATA` samples.
//!
//! ```text
//! gimbal-probe --port /dev/ttyACM0 --position 45 --samples 20
//! RUST_LOG=gimbal::wire=info,debug gimbal-probe --config bench.json
//! ```
//!
//! Besides stderr, every run appends the gimbal's diagnostic log
//! (`SENT:`/`RECV:` lines, handshake and channel errors) to
//! `<log-dir>/gimbal.<date>.log`.

use std::path::PathBuf;
use std::process::ExitCode;

use clap::Parser;
use gimbal::prelude::*;

mod logging;

#[derive(Debug, Parser)]
#[command(about = "Handshake with a gimbal controller and read it back", long_about = None)]
struct Cli {
    /// JSON config file (`serial` and `session` sections).
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Serial device; overrides the config file.
    #[arg(short, long)]
    port: Option<String>,

    /// Baud rate; overrides the config file.
    #[arg(short, long)]
    baud: Option<u32>,

    /// Enable the motor and move to this angle (degrees).
    #[arg(long, allow_negative_numbers = true)]
    position: Option<f64>,

    /// Number of DATA samples to print before disconnecting.
    #[arg(short, long, default_value_t = 0)]
    samples: u32,

    /// Directory for the rolling diagnostic log.
    #[arg(long, default_value = ".")]
    log_dir: PathBuf,

    /// Log to stderr only.
    #[arg(long)]
    no_log_file: bool,
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();
    let log_dir = (!cli.no_log_file).then_some(cli.log_dir.as_path());
    let _log_guard = match logging::init(log_dir) {
        Ok(guard) => guard,
        Err(err) => {
            eprintln!("gimbal-probe: cannot open log in {}: {err}", cli.log_dir.display());
            return ExitCode::FAILURE;
        }
    };

    match run(cli).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            tracing::error!(error = %err, "probe failed");
            eprintln!("gimbal-probe: {err}");
            ExitCode::FAILURE
        }
    }
}

async fn run(cli: Cli) -> Result<(), GimbalError> {
    let mut config = match &cli.config {
        Some(path) => GimbalConfig::from_json_file(path)?,
        None => GimbalConfig::default(),
    };
    if let Some(port) = cli.port {
        config.serial.path = port;
    }
    if let Some(baud) = cli.baud {
        config.serial.baud_rate = baud;
    }

    println!("connecting to {} ...", config.serial.path);
    let mut session = connect_serial(&config).await?;
    let version = session.get_version().await?;
    println!("{} firmware {version}", config.session.expected_device);

    let result = exercise(&mut session, cli.position, cli.samples).await;
    session.disconnect().await;
    result
}

async fn exercise(
    session: &mut Session<SerialChannel>,
    position: Option<f64>,
    samples: u32,
) -> Result<(), GimbalError> {
    if let Some(degrees) = position {
        session.set_enable(true).await?;
        session.set_position(degrees).await?;
        println!("moving to {degrees:.0} deg");
    }

    for _ in 0..samples {
        let sample = session.read_sample().await?;
        println!("{:>12} us  {:>8.2} deg", sample.timestamp_us, sample.angle_deg);
    }
    Ok(())
}
