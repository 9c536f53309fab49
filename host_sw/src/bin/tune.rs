//! Tune a TEA5757 radio module wired to Linux GPIO lines.
//!
//! All logic lives in the `tea5757` crate; this binary only maps command-line
//! arguments onto it.

use clap::{Parser, Subcommand, ValueEnum};
use gpiocdev::line::Value;
use log::info;

use host_sw::delay::HostDelay;
use host_sw::linux_gpio::{BidiLine, InputLine, OutputLine};
use tea5757::{Band, PortConfig, SearchDirection, SearchLevel, Tea5757, Tea5757BitBang};

#[derive(Parser)]
#[command(name = "tune", about = "Drive a TEA5757 tuner module over GPIO")]
struct Cli {
    /// GPIO character device the module is wired to.
    #[arg(long, default_value = "/dev/gpiochip0")]
    chip: String,

    /// MO_ST (stereo indicator) line offset.
    #[arg(long)]
    mo_st: u32,

    /// CLOCK line offset.
    #[arg(long)]
    clock: u32,

    /// DATA line offset.
    #[arg(long)]
    data: u32,

    /// WRITE_ENABLE line offset.
    #[arg(long)]
    wr_en: u32,

    /// Raw port-configuration mask; defaults to the Philips DVD module value.
    #[arg(long)]
    port_config: Option<u32>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Tune to an FM frequency, in 0.1 MHz steps (880..=1080).
    PresetFm { frequency: u16 },
    /// Tune to an AM frequency, in 10 kHz steps (53..=170).
    PresetAm { frequency: u16 },
    /// Search for the next station.
    Search {
        #[arg(value_enum)]
        band: BandArg,
        /// Stop level, 1 (weakest) to 4 (strongest signals only).
        #[arg(long, default_value_t = 2, value_parser = clap::value_parser!(u8).range(1..=4))]
        level: u8,
        /// Search towards decreasing frequency.
        #[arg(long)]
        down: bool,
    },
    /// Read back the PLL divider (0 in preset mode or when nothing was found).
    Status,
    /// Report whether a stereo pilot is detected.
    Stereo,
}

#[derive(Copy, Clone, ValueEnum)]
enum BandArg {
    Fm,
    Am,
}

impl From<BandArg> for Band {
    fn from(band: BandArg) -> Self {
        match band {
            BandArg::Fm => Band::Fm,
            BandArg::Am => Band::Am,
        }
    }
}

fn search_level(level: u8) -> SearchLevel {
    match level {
        1 => SearchLevel::Level1,
        2 => SearchLevel::Level2,
        3 => SearchLevel::Level3,
        _ => SearchLevel::Level4,
    }
}

fn wire_err<E: std::fmt::Debug>(e: E) -> Box<dyn std::error::Error> {
    format!("bus transfer failed: {e:?}").into()
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    env_logger::init();
    let cli = Cli::parse();

    let mo_st = InputLine::open(&cli.chip, cli.mo_st)?;
    let clock = OutputLine::open(&cli.chip, cli.clock, Value::Inactive)?;
    let data = BidiLine::open(&cli.chip, cli.data)?;
    let wr_en = OutputLine::open(&cli.chip, cli.wr_en, Value::Inactive)?;

    let bus = Tea5757BitBang::new(mo_st, clock, data, wr_en, HostDelay).map_err(wire_err)?;
    let mut radio = match cli.port_config {
        Some(bits) => Tea5757::with_port_config(bus, PortConfig::new(bits)),
        None => Tea5757::new(bus),
    };

    match cli.command {
        Command::PresetFm { frequency } => {
            radio.preset(Band::Fm, frequency).map_err(wire_err)?;
            info!("tuned FM to {}.{} MHz", frequency / 10, frequency % 10);
        }
        Command::PresetAm { frequency } => {
            radio.preset(Band::Am, frequency).map_err(wire_err)?;
            info!("tuned AM to {} kHz", frequency as u32 * 10);
        }
        Command::Search { band, level, down } => {
            let direction = if down {
                SearchDirection::Down
            } else {
                SearchDirection::Up
            };
            radio
                .search(band.into(), search_level(level), direction)
                .map_err(wire_err)?;
            info!("search started");
        }
        Command::Status => {
            let divider = radio.pll_frequency().map_err(wire_err)?;
            println!("{divider}");
        }
        Command::Stereo => {
            let stereo = radio.is_stereo().map_err(wire_err)?;
            println!("{}", if stereo { "stereo" } else { "mono" });
        }
    }

    Ok(())
}
