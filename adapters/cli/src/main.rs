#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Command-line adapter that lists the Reflex Rush levels and simulates
//! play-throughs with the autopilot.

mod session;
mod settings;

use std::{path::PathBuf, time::Duration};

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use reflex_rush_catalog::LevelCatalog;
use reflex_rush_core::{LevelDescriptor, RedStrategy};
use reflex_rush_system_autopilot::{
    Config as AutopilotConfig, DEFAULT_PRESSES_PER_SECOND, DEFAULT_REACTION_DELAY,
};
use tracing_subscriber::EnvFilter;

use crate::{
    session::{Pacing, Simulation, Summary},
    settings::{FileConfig, Overrides},
};

#[derive(Parser, Debug)]
#[command(name = "reflex-rush", version, about = "Reflex Rush level engine")]
struct Cli {
    /// TOML file with an [engine] table and optional [[levels]].
    #[arg(long, global = true)]
    config: Option<PathBuf>,
    /// Tracing filter directive, e.g. `debug` or `reflex_rush_engine=trace`.
    #[arg(long, global = true)]
    log_filter: Option<String>,
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Prints the level catalog.
    Levels {
        /// Prints the catalog as a TOML document instead of a table.
        #[arg(long)]
        toml: bool,
    },
    /// Plays one session with the autopilot and prints the outcome.
    Play(PlayArgs),
}

#[derive(clap::Args, Debug)]
struct PlayArgs {
    /// Seed shared by the red schedule and the autopilot.
    #[arg(long)]
    seed: Option<u64>,
    /// Level to start on.
    #[arg(long)]
    start_level: Option<u32>,
    /// Frame step in milliseconds.
    #[arg(long, default_value_t = 16, value_parser = clap::value_parser!(u64).range(1..))]
    frame_ms: u64,
    /// Press attempts per second while green.
    #[arg(long, default_value_t = DEFAULT_PRESSES_PER_SECOND)]
    presses_per_second: f64,
    /// Milliseconds before the autopilot notices a red button.
    #[arg(long, default_value_t = DEFAULT_REACTION_DELAY.as_millis() as u64)]
    reaction_ms: u64,
    /// Probability of pressing anyway once red was noticed.
    #[arg(long, default_value_t = 0.0)]
    mistake_rate: f64,
    /// Paces frames by the wall clock instead of simulating instantly.
    #[arg(long)]
    realtime: bool,
    /// Prints the summary as JSON.
    #[arg(long)]
    json: bool,
}

/// Entry point for the Reflex Rush command-line interface.
fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logging(cli.log_filter.as_deref())?;

    let file = match &cli.config {
        Some(path) => FileConfig::load(path)?,
        None => FileConfig::default(),
    };
    let catalog = file.catalog()?;

    match cli.command {
        Command::Levels { toml } => {
            if toml {
                print!("{}", catalog.to_toml_string()?);
            } else {
                print_levels(&catalog);
            }
        }
        Command::Play(args) => play(&file, catalog, &args)?,
    }

    Ok(())
}

fn init_logging(filter: Option<&str>) -> Result<()> {
    let filter = match filter {
        Some(directives) => EnvFilter::try_new(directives)
            .with_context(|| format!("invalid log filter `{directives}`"))?,
        None => EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
    };
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
    Ok(())
}

fn play(file: &FileConfig, catalog: LevelCatalog, args: &PlayArgs) -> Result<()> {
    let engine_config = file.engine_config(Overrides {
        seed: args.seed,
        start_level: args.start_level,
    });
    let (engine_config, seed) = settings::with_session_seed(engine_config);
    let autopilot_config = AutopilotConfig::new(seed)
        .with_presses_per_second(args.presses_per_second)
        .with_reaction_delay(Duration::from_millis(args.reaction_ms))
        .with_mistake_rate(args.mistake_rate);

    let frame = Duration::from_millis(args.frame_ms);
    let pacing = if args.realtime {
        Pacing::Realtime(frame)
    } else {
        Pacing::Fixed(frame)
    };

    let summary = Simulation::new(catalog, engine_config, autopilot_config).run(pacing);
    if args.json {
        println!(
            "{}",
            serde_json::to_string_pretty(&summary).context("failed to render summary")?
        );
    } else {
        print_summary(&summary);
    }
    Ok(())
}

fn print_levels(catalog: &LevelCatalog) {
    println!("{:>5}  {:>8}  {:>6}  red", "level", "required", "time");
    for descriptor in catalog.iter() {
        println!(
            "{:>5}  {:>8}  {:>5.1}s  {}",
            descriptor.level(),
            descriptor.required_progress(),
            descriptor.time_limit().as_secs_f64(),
            describe_red(descriptor),
        );
    }
}

fn describe_red(descriptor: &LevelDescriptor) -> String {
    match descriptor.red_strategy() {
        RedStrategy::FixedWindows { windows } if windows.is_empty() => "never".to_owned(),
        RedStrategy::FixedWindows { windows } => windows
            .iter()
            .map(|window| {
                format!(
                    "{:.1}s-{:.1}s",
                    window.start().as_secs_f64(),
                    window.end().as_secs_f64()
                )
            })
            .collect::<Vec<_>>()
            .join(", "),
        RedStrategy::ScheduledRandom {
            count,
            bias_toward_end,
        } => {
            let bias = if *bias_toward_end { ", late" } else { "" };
            format!("{count} random{bias}")
        }
        RedStrategy::CyclicPredictable => "1s of every 4s".to_owned(),
    }
}

fn print_summary(summary: &Summary) {
    let stats = &summary.stats;
    println!("outcome:          {}", summary.outcome);
    println!("seed:             {}", summary.seed);
    println!("level:            {}", summary.level);
    println!("score:            {}", summary.score);
    println!("frames:           {}", summary.frames);
    println!("levels completed: {}", stats.levels_completed);
    println!("presses:          {}", stats.total_presses);
    println!("penalties:        {}", stats.penalties);
}
