//! satlink CLI tool
//!
//! Builds the satellite link configuration and prints its tables.
//!
//! # Usage
//!
//! ```bash
//! satlink -c config/link.yaml waveforms --symbol-rate 250000
//! satlink bbframes --symbol-rate 1e7
//! satlink carriers
//! satlink best-waveform --cno-db 64.5 --symbol-rate 250000
//! ```

mod scenario;

use std::path::PathBuf;
use std::process::ExitCode;

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};
use satlink_common::{
    db_to_linear, init_logging, CarrierBandwidthType, LogLevel, LONG_BURST_LENGTH,
    SHORT_BURST_LENGTH,
};

use scenario::Scenario;

#[derive(Parser, Debug)]
#[command(name = "satlink")]
#[command(author, version, about, long_about = None)]
pub struct Args {
    /// Path to the link configuration file (YAML)
    #[arg(short = 'c', long = "config", value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// Log level (trace, debug, info, warn, error)
    #[arg(short = 'l', long = "log-level", default_value = "warn")]
    pub log_level: LogLevel,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Print the DVB-RCS2 waveform table
    Waveforms {
        /// Carrier symbol rate in baud
        #[arg(long, default_value_t = 250_000.0)]
        symbol_rate: f64,
        /// Carrier roll-off factor
        #[arg(long, default_value_t = 0.2)]
        roll_off: f64,
    },
    /// Print the DVB-S2 BBFrame table
    Bbframes {
        /// Forward-link symbol rate in baud
        #[arg(long, default_value_t = 10_000_000.0)]
        symbol_rate: f64,
    },
    /// Print the return-link carrier layout
    Carriers,
    /// Select the best waveform for a C/N0 (ACM enabled for the query)
    BestWaveform {
        /// C/N0 in dBHz
        #[arg(long)]
        cno_db: f64,
        /// Carrier symbol rate in baud
        #[arg(long, default_value_t = 250_000.0)]
        symbol_rate: f64,
        /// Carrier roll-off factor
        #[arg(long, default_value_t = 0.2)]
        roll_off: f64,
        /// Use long bursts instead of short ones
        #[arg(long)]
        long: bool,
    },
}

fn main() -> ExitCode {
    let args = Args::parse();
    init_logging(args.log_level);

    match run(args) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("ERROR: {:#}", e);
            ExitCode::FAILURE
        }
    }
}

fn run(args: Args) -> Result<()> {
    let mut scenario = Scenario::load(args.config.as_deref())?;

    match args.command {
        Command::Waveforms {
            symbol_rate,
            roll_off,
        } => {
            check_symbol_rate(symbol_rate)?;
            let conf = scenario.waveform_conf()?;
            print!(
                "{}",
                conf.dump(carrier_bandwidth_hz(symbol_rate, roll_off), symbol_rate)
            );
        }
        Command::Bbframes { symbol_rate } => {
            check_symbol_rate(symbol_rate)?;
            let conf = scenario.bb_frame_conf(symbol_rate)?;
            print!("{}", conf.dump());
        }
        Command::Carriers => print_carriers(&scenario)?,
        Command::BestWaveform {
            cno_db,
            symbol_rate,
            roll_off,
            long,
        } => {
            check_symbol_rate(symbol_rate)?;
            scenario.config.waveform.acm_enabled = true;
            let conf = scenario.waveform_conf()?;
            let burst_length = if long {
                LONG_BURST_LENGTH
            } else {
                SHORT_BURST_LENGTH
            };
            match conf.best_waveform_id(db_to_linear(cno_db), symbol_rate, burst_length)? {
                Some(id) => {
                    let wf = conf.waveform(id)?;
                    println!(
                        "{}",
                        wf.dump(carrier_bandwidth_hz(symbol_rate, roll_off), symbol_rate)
                    );
                }
                None => bail!(
                    "No waveform with {} symbol bursts closes the link at {} dBHz",
                    burst_length,
                    cno_db
                ),
            }
        }
    }
    Ok(())
}

fn check_symbol_rate(symbol_rate: f64) -> Result<()> {
    if !(symbol_rate > 0.0 && symbol_rate.is_finite()) {
        bail!("Symbol rate must be positive, got {}", symbol_rate);
    }
    Ok(())
}

/// Carrier bandwidth occupied by `symbol_rate` with `roll_off`.
fn carrier_bandwidth_hz(symbol_rate: f64, roll_off: f64) -> f64 {
    symbol_rate * (1.0 + roll_off)
}

fn print_carriers(scenario: &Scenario) -> Result<()> {
    let sequence = scenario.sequence()?;
    let superframe = sequence
        .superframe_conf(0)
        .context("No superframe configured")?;

    println!(
        "Superframe: {} frames, {} carriers, {} RA channels, duration {:.6} s",
        superframe.frame_count(),
        superframe.carrier_count(),
        superframe.ra_channel_count(),
        superframe.duration_s()
    );
    for carrier in 0..sequence.carrier_count() {
        let frame = superframe.carrier_frame(carrier)?;
        let ra = match superframe.ra_channel(carrier)? {
            Some(ra) => format!("RA {ra}"),
            None => "DA".to_string(),
        };
        println!(
            "Carrier {:4} frame {:2} {:>6} center {:14.1} Hz allocated {:12.1} Hz symbol rate {:12.1} Bd",
            carrier,
            frame,
            ra,
            sequence.carrier_frequency_hz(carrier)?,
            sequence.carrier_bandwidth_hz(carrier, CarrierBandwidthType::Allocated)?,
            sequence.carrier_bandwidth_hz(carrier, CarrierBandwidthType::Effective)?,
        );
    }
    Ok(())
}
