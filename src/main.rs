//! CLI entry point for luxd.
//!
//! ```bash
//! # on the board, as root
//! luxd
//!
//! # anywhere, no hardware or root needed
//! luxd --mock
//!
//! # trigger a dump
//! pkill -USR1 luxd-buffer
//! ```

use clap::Parser;
use luxd::config::Config;
use luxd::error::AppResult;
use luxd::hardware::adc::Mcp3002;
use luxd::hardware::gpio::Gpio;
use luxd::hardware::mock::MockLightSensor;
use luxd::hardware::spi::Spi0;
use luxd::hardware::SampleSource;
use luxd::{logging, pipeline};
use std::path::PathBuf;
use std::process::ExitCode;
use tracing::{info, warn};

#[derive(Parser)]
#[command(name = "luxd")]
#[command(about = "Buffered light-level acquisition daemon", long_about = None)]
struct Cli {
    /// Path to the configuration file (default: luxd.toml)
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Run against a simulated sensor instead of the SPI hardware
    #[arg(long)]
    mock: bool,
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    match run(cli).await {
        // the pipeline loops are infinite; reaching here at all is a failure
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            // the subscriber may not be installed yet if config loading was
            // the thing that failed
            eprintln!("luxd: fatal: {err}");
            ExitCode::from(err.exit_code().clamp(0, 255) as u8)
        }
    }
}

async fn run(cli: Cli) -> AppResult<()> {
    let mut config = Config::load(cli.config.as_deref())?;
    logging::init(&config.application.log_level)?;

    let source: Box<dyn SampleSource> = if cli.mock {
        // no hardware was mapped, so there is no privilege to shed
        if config.consumer.uid.take().is_some() {
            warn!("mock run: skipping privilege drop");
        }
        info!("using simulated light sensor");
        Box::new(MockLightSensor::new())
    } else {
        let gpio = Gpio::map()?;
        let spi = Spi0::map(gpio)?;
        info!("peripheral registers mapped");
        Box::new(Mcp3002::with_clock(spi, config.acquisition.spi_clock))
    };

    pipeline::run(&config, source).await
}
