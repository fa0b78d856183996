use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use std::time::Duration;

use towntune_clock::{OffsetResolver, Region};
use towntune_engine::logging::{init_logging, init_logging_from_env, parse_mode, LoggingMode};
use towntune_engine::{EngineConfig, TrackLibrary};

pub mod regions;
pub mod simulate;

use regions::{format_offset, RegionRow};
use simulate::SimulationConfig;

/// TownTune operator tool
///
/// Inspects the region and DST tables, checks the hourly audio library and
/// dry-runs the reconciliation engine without a chat platform.
#[derive(Parser, Debug)]
#[command(name = "towntune")]
#[command(about = "Hourly playback reconciliation - operator tool")]
#[command(version)]
pub struct Args {
    /// Logging mode (silent, development, debug); defaults to TOWNTUNE_LOG_MODE
    #[arg(long, global = true)]
    pub log_mode: Option<String>,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// List every known region with its current offset and local hour
    Regions {
        /// Print JSON instead of a table
        #[arg(long)]
        json: bool,

        /// Evaluate at this RFC 3339 instant instead of now
        #[arg(long)]
        at: Option<String>,
    },

    /// Show the local hour and track for one region
    Hour {
        /// Region label, e.g. us-east
        #[arg(short, long)]
        region: String,

        /// Evaluate at this RFC 3339 instant instead of now
        #[arg(long)]
        at: Option<String>,

        /// Directory holding the hourly tracks
        #[arg(long, default_value = "audio")]
        audio_dir: PathBuf,

        /// Track file extension
        #[arg(long, default_value = "mp3")]
        extension: String,
    },

    /// Verify that all 24 hourly tracks exist
    CheckTracks {
        /// Directory holding the hourly tracks
        #[arg(long, default_value = "audio")]
        audio_dir: PathBuf,

        /// Track file extension
        #[arg(long, default_value = "mp3")]
        extension: String,
    },

    /// Dry-run the engine against the in-memory backend
    Simulate {
        /// Region label for every simulated group
        #[arg(short, long, default_value = "us-east")]
        region: String,

        /// Number of simulated groups
        #[arg(short, long, default_value = "1")]
        groups: usize,

        /// Number of ticks to run
        #[arg(short, long, default_value = "5")]
        ticks: u32,

        /// Tick interval in milliseconds
        #[arg(long, default_value = "250")]
        interval_ms: u64,

        /// Pin every group to this hour (0-23)
        #[arg(long)]
        test_hour: Option<i64>,

        /// Simulated track length in milliseconds; tracks never end when unset
        #[arg(long)]
        track_ms: Option<u64>,
    },
}

impl Args {
    fn logging_mode(&self) -> Result<Option<LoggingMode>> {
        match &self.log_mode {
            Some(name) => parse_mode(name)
                .map(Some)
                .ok_or_else(|| {
                    anyhow::anyhow!(
                        "Invalid log mode '{}'. Valid modes: silent, development, debug",
                        name
                    )
                }),
            None => Ok(None),
        }
    }
}

fn parse_instant(at: Option<&str>) -> Result<DateTime<Utc>> {
    match at {
        Some(text) => Ok(DateTime::parse_from_rfc3339(text)
            .with_context(|| format!("Invalid RFC 3339 timestamp: {}", text))?
            .with_timezone(&Utc)),
        None => Ok(Utc::now()),
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    let logging = match args.logging_mode()? {
        Some(mode) => init_logging(mode),
        None => init_logging_from_env(LoggingMode::Silent),
    };
    logging.context("Failed to initialize logging")?;

    match args.command {
        Command::Regions { json, at } => {
            let now = parse_instant(at.as_deref())?;
            let rows = regions::rows(now);
            if json {
                println!("{}", serde_json::to_string_pretty(&rows)?);
            } else {
                print!("{}", regions::render_table(&rows));
            }
        }
        Command::Hour {
            region,
            at,
            audio_dir,
            extension,
        } => {
            let now = parse_instant(at.as_deref())?;
            let region: Region = region.parse()?;
            let resolver = OffsetResolver::new();
            let row = RegionRow::resolve(&resolver, region, now);
            let track = TrackLibrary::new(audio_dir, extension)
                .track_for(resolver.local_hour(region, now));

            println!(
                "{}: {} ({}, DST {}) -> {}, track {}",
                region,
                format_offset(row.offset),
                row.zone.unwrap_or("no DST zone"),
                if row.dst_active { "active" } else { "inactive" },
                row.label,
                track
            );
        }
        Command::CheckTracks {
            audio_dir,
            extension,
        } => {
            let library = TrackLibrary::new(&audio_dir, extension);
            let missing = library.missing_tracks();
            if missing.is_empty() {
                println!("All 24 tracks present in {}", audio_dir.display());
            } else {
                for track in &missing {
                    println!("missing: {}", track);
                }
                anyhow::bail!("{} of 24 tracks missing in {}", missing.len(), audio_dir.display());
            }
        }
        Command::Simulate {
            region,
            groups,
            ticks,
            interval_ms,
            test_hour,
            track_ms,
        } => {
            let engine = EngineConfig::from_env()
                .context("Invalid engine configuration")?
                .with_tick_interval(Duration::from_millis(interval_ms));

            let summary = simulate::run(SimulationConfig {
                region,
                groups,
                ticks,
                test_hour,
                track_length: track_ms.map(Duration::from_millis),
                engine,
            })
            .await?;

            println!(
                "{} ticks, {} stream starts, {} stops",
                summary.reports.len(),
                summary.starts,
                summary.stops
            );
        }
    }

    Ok(())
}
