//! testplan CLI - Vehicle Test Plan Scheduler
//!
//! Command-line interface for editing test plans, deriving their schedules,
//! reporting overlaps and exporting the planning.

mod commands;
mod config;

use std::path::PathBuf;

use anyhow::Result;
use chrono::NaiveDate;
use clap::{Parser, Subcommand, ValueEnum};
use testplan_core::ModeSelection;
use testplan_store::StoreKind;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use crate::config::{AppConfig, Overrides};

#[derive(Parser)]
#[command(name = "testplan")]
#[command(author, version, about = "Vehicle test plan scheduler", long_about = None)]
struct Cli {
    /// Configuration file (TOML)
    #[arg(long, global = true, env = "TESTPLAN_CONFIG", value_name = "FILE")]
    config: Option<PathBuf>,

    /// Directory holding the stored plans
    #[arg(long, global = true, env = "TESTPLAN_DATA_DIR", value_name = "DIR")]
    data_dir: Option<PathBuf>,

    /// Storage backend (json, sqlite)
    #[arg(long, global = true, value_name = "KIND")]
    store: Option<StoreKind>,

    /// Scheduling mode selection (auto, sequential, explicit)
    #[arg(long, global = true, value_name = "MODE")]
    mode: Option<ModeSelection>,

    /// Verbose output (-v info, -vv debug, -vvv trace)
    #[arg(short, long, global = true, action = clap::ArgAction::Count)]
    verbose: u8,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Create an empty test plan
    Init {
        /// Project name
        project: String,
    },

    /// List stored projects
    List,

    /// Add a vehicle to a plan
    AddVehicle {
        project: String,
        /// Vehicle identifier
        id: String,
        /// Start-of-production milestone (YYYY-MM-DD)
        #[arg(long)]
        sopm: Option<NaiveDate>,
        /// Last-revision milestone (YYYY-MM-DD)
        #[arg(long)]
        lrm: Option<NaiveDate>,
        #[arg(long)]
        vin: Option<String>,
        #[arg(long)]
        chassis: Option<String>,
    },

    /// Remove a vehicle and its tests
    RemoveVehicle { project: String, id: String },

    /// Change a vehicle's milestones; dates not given are kept
    Milestones {
        project: String,
        id: String,
        #[arg(long)]
        sopm: Option<NaiveDate>,
        #[arg(long)]
        lrm: Option<NaiveDate>,
        /// Remove the vehicle's LRM
        #[arg(long, conflicts_with = "lrm")]
        clear_lrm: bool,
    },

    /// Add a test to one vehicle or to every vehicle
    AddTest {
        project: String,
        /// Test name
        name: String,
        /// Duration in days
        #[arg(short, long)]
        duration: i64,
        /// Target vehicle
        #[arg(long, required_unless_present = "all", conflicts_with = "all")]
        vehicle: Option<String>,
        /// Add the test to every vehicle of the plan
        #[arg(long)]
        all: bool,
        /// Responsible party
        #[arg(short, long, default_value = "")]
        responsible: String,
        /// Explicit start date (YYYY-MM-DD)
        #[arg(long)]
        start: Option<NaiveDate>,
    },

    /// Remove a test from a vehicle
    RemoveTest {
        project: String,
        vehicle: String,
        name: String,
    },

    /// Change a test's duration
    SetDuration {
        project: String,
        vehicle: String,
        name: String,
        /// New duration in days
        #[arg(allow_negative_numbers = true)]
        days: i64,
    },

    /// Pin a test to a start date; omit the date to clear it
    SetStart {
        project: String,
        vehicle: String,
        name: String,
        start: Option<NaiveDate>,
    },

    /// Move a test within its vehicle's sequence
    MoveTest {
        project: String,
        vehicle: String,
        name: String,
        /// New position, 1 being the first test
        position: usize,
    },

    /// Derive and show the schedule
    Schedule {
        project: String,
        /// Output format
        #[arg(short, long, value_enum, default_value_t = OutputFormat::Table)]
        format: OutputFormat,
        /// Flag test ends a week ahead instead of the configured window
        #[arg(long)]
        milestone_view: bool,
        /// Reference date for alerts (defaults to the current date)
        #[arg(long)]
        today: Option<NaiveDate>,
    },

    /// Report overlapping tests
    Overlaps {
        project: String,
        /// Output format
        #[arg(short, long, value_enum, default_value_t = OutputFormat::Table)]
        format: OutputFormat,
        /// Reference date for alerts (defaults to the current date)
        #[arg(long)]
        today: Option<NaiveDate>,
    },

    /// Export the planning to a file
    Export {
        project: String,
        /// Export format
        #[arg(short, long, value_enum)]
        format: ExportFormat,
        /// Output file path
        #[arg(short, long)]
        output: PathBuf,
        /// Reference date for alerts (defaults to the current date)
        #[arg(long)]
        today: Option<NaiveDate>,
    },

    /// Import a plan from a flat CSV file
    Import {
        /// CSV file with one row per vehicle and test
        #[arg(value_name = "CSV")]
        file: PathBuf,
        /// Name of the project to create
        #[arg(long)]
        project: String,
    },
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
pub(crate) enum OutputFormat {
    Table,
    Json,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
pub(crate) enum ExportFormat {
    Xlsx,
    Csv,
    Svg,
    Html,
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    // Logs go to stderr so stdout stays usable in pipes
    let default_level = match cli.verbose {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));
    tracing_subscriber::registry()
        .with(fmt::layer().with_writer(std::io::stderr))
        .with(filter)
        .init();

    let Some(command) = cli.command else {
        println!("testplan - Vehicle Test Plan Scheduler");
        println!("Run with --help for usage information");
        return Ok(());
    };

    let settings = AppConfig::load(cli.config.as_deref())?.resolve(Overrides {
        store: cli.store,
        data_dir: cli.data_dir,
        mode: cli.mode,
        milestone_view: matches!(
            command,
            Commands::Schedule {
                milestone_view: true,
                ..
            }
        ),
    });
    tracing::debug!(
        store = %settings.store,
        data_dir = %settings.data_dir.display(),
        "resolved settings"
    );

    let ctx = commands::Context::open(&settings)?;

    match command {
        Commands::Init { project } => commands::init(&ctx, &project),
        Commands::List => commands::list(&ctx),
        Commands::AddVehicle {
            project,
            id,
            sopm,
            lrm,
            vin,
            chassis,
        } => commands::add_vehicle(&ctx, &project, &id, sopm, lrm, vin, chassis),
        Commands::RemoveVehicle { project, id } => commands::remove_vehicle(&ctx, &project, &id),
        Commands::Milestones {
            project,
            id,
            sopm,
            lrm,
            clear_lrm,
        } => commands::milestones(&ctx, &project, &id, sopm, lrm, clear_lrm),
        Commands::AddTest {
            project,
            name,
            duration,
            vehicle,
            all: _,
            responsible,
            start,
        } => commands::add_test(
            &ctx,
            &project,
            commands::NewTest {
                name,
                duration,
                responsible,
                start,
            },
            vehicle,
        ),
        Commands::RemoveTest {
            project,
            vehicle,
            name,
        } => commands::remove_test(&ctx, &project, &vehicle, &name),
        Commands::SetDuration {
            project,
            vehicle,
            name,
            days,
        } => commands::set_duration(&ctx, &project, &vehicle, &name, days),
        Commands::SetStart {
            project,
            vehicle,
            name,
            start,
        } => commands::set_start(&ctx, &project, &vehicle, &name, start),
        Commands::MoveTest {
            project,
            vehicle,
            name,
            position,
        } => commands::move_test(&ctx, &project, &vehicle, &name, position),
        Commands::Schedule {
            project,
            format,
            today,
            ..
        } => commands::schedule(&ctx, &project, format, today),
        Commands::Overlaps {
            project,
            format,
            today,
        } => commands::overlaps(&ctx, &project, format, today),
        Commands::Export {
            project,
            format,
            output,
            today,
        } => commands::export(&ctx, &project, format, &output, today),
        Commands::Import { file, project } => commands::import(&ctx, &file, &project),
    }
}
