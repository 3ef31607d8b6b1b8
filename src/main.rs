//! mechgrid: headless driver for the mech puzzle engine.
//!
//! Plays levels with a greedy bot on a virtual clock and prints a summary.

mod autoplay;

use std::time::Duration;

use anyhow::{Result, bail};
use clap::{Parser, ValueEnum};
use tracing::Level;
use tracing_subscriber::prelude::*;

use mechgrid::{ColorWeights, GameConfig, Pilot};

fn main() -> Result<()> {
    let args = Args::parse();
    init_tracing(args.verbose);

    if args.levels == 0 {
        bail!("--levels must be at least 1");
    }
    let config = args.game_config();
    let report = autoplay::run(&args, config);
    println!("{report}");
    Ok(())
}

fn init_tracing(verbose: u8) {
    let level = match verbose {
        0 => Level::WARN,
        1 => Level::INFO,
        2 => Level::DEBUG,
        _ => Level::TRACE,
    };
    tracing_subscriber::registry()
        .with(tracing_subscriber::fmt::layer().with_target(false))
        .with(tracing_subscriber::filter::LevelFilter::from_level(level))
        .init();
}

/// Mech puzzle engine driven by a greedy autoplayer.
#[derive(Debug, Parser)]
#[command(
    name = "mechgrid",
    version,
    about = "Falling-pair mech puzzle engine with a headless greedy autoplayer.",
    long_about = "Drops colored gun-icon pairs onto a grid of mech enemies. Four or more \
        in a row or column clear; clearing mechs scores. Bomb-colored runs leave a bomb \
        that detonates after a delay, and gear tiles refill the energy meter.\n\n\
        The bot plays on a virtual clock, so runs are reproducible with --seed."
)]
pub struct Args {
    /// Seed for the random source. Uses OS entropy if not set.
    #[arg(short, long, value_name = "N")]
    pub seed: Option<u64>,

    /// Level to start at.
    #[arg(short, long, default_value = "1", value_name = "N")]
    pub level: u32,

    /// Pilot perk.
    #[arg(short, long, default_value = "none")]
    pub pilot: PilotArg,

    /// Stop after this many pieces.
    #[arg(long, default_value = "500", value_name = "N")]
    pub max_pieces: u32,

    /// Stop after clearing this many levels.
    #[arg(long, default_value = "3", value_name = "N")]
    pub levels: u32,

    /// Energy meter capacity in ms of virtual time. 0 disables the meter.
    #[arg(long, default_value = "0", value_name = "MS")]
    pub energy_ms: u64,

    /// Virtual time the bot spends per piece.
    #[arg(long, default_value = "250", value_name = "MS")]
    pub think_ms: u64,

    /// Extra draw weight for gear tiles.
    #[arg(long, default_value = "0", value_name = "W")]
    pub gear_weight: u32,

    /// Extra draw weight for bomb tiles.
    #[arg(long, default_value = "0", value_name = "W")]
    pub bomb_weight: u32,

    /// More output (-v info, -vv debug, -vvv trace).
    #[arg(short, long, action = clap::ArgAction::Count)]
    pub verbose: u8,
}

impl Args {
    fn game_config(&self) -> GameConfig {
        let defaults = GameConfig::default();
        GameConfig {
            initial_level: self.level.max(1),
            pilot: self.pilot.into(),
            color_weights: ColorWeights {
                gear: defaults.color_weights.gear.saturating_add(self.gear_weight),
                bomb: defaults.color_weights.bomb.saturating_add(self.bomb_weight),
                ..defaults.color_weights
            },
            ..defaults
        }
    }

    pub fn think_time(&self) -> Duration {
        Duration::from_millis(self.think_ms.max(1))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, ValueEnum)]
pub enum PilotArg {
    #[default]
    None,
    /// More bomb tiles.
    Gerdy,
    /// Second chance on overflow.
    Hop,
    /// More gear tiles.
    Reggie,
}

impl From<PilotArg> for Pilot {
    fn from(arg: PilotArg) -> Self {
        match arg {
            PilotArg::None => Self::None,
            PilotArg::Gerdy => Self::Gerdy,
            PilotArg::Hop => Self::Hop,
            PilotArg::Reggie => Self::Reggie,
        }
    }
}
