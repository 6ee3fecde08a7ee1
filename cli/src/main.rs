mod commands;
mod config;
mod server;

use anyhow::Result;
use chrono::Local;
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use std::process;
use tracing_subscriber::{EnvFilter, fmt, prelude::*};

use crate::commands::{
    cmd_export, cmd_import, cmd_meal_delete, cmd_meal_list, cmd_meal_log, cmd_profile_set,
    cmd_profile_show, cmd_stats, cmd_summary, cmd_timer, cmd_water_add, cmd_water_show, cmd_week,
    cmd_workout_delete, cmd_workout_list, cmd_workout_log,
};
use crate::config::Config;
use fitlog_core::metrics::{DEFAULT_WINDOW_DAYS, MAX_WINDOW_DAYS};
use fitlog_core::service::FitlogService;

const DEFAULT_LOG_LEVEL: &str = "warn";

#[derive(Parser)]
#[command(
    name = "fitlog",
    version,
    about = "A simple fitness tracker CLI: workouts, meals, water and a workout timer"
)]
struct Cli {
    /// Log filter (e.g. "info", "fitlog_core=debug"); falls back to `RUST_LOG`
    #[arg(long, global = true, value_name = "FILTER")]
    log_level: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Log, list and delete workouts
    Workout {
        #[command(subcommand)]
        command: WorkoutCommands,
    },
    /// Log, list and delete meals
    Meal {
        #[command(subcommand)]
        command: MealCommands,
    },
    /// Track water intake
    Water {
        #[command(subcommand)]
        command: WaterCommands,
    },
    /// Show the daily dashboard (defaults to today)
    Summary {
        /// Date to show (YYYY-MM-DD or today/yesterday/tomorrow)
        date: Option<String>,
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
    /// Show per-day workout minutes, calories and water for the last N days
    Week {
        /// Number of days in the window (at most 366)
        #[arg(
            short,
            long,
            default_value_t = DEFAULT_WINDOW_DAYS,
            value_parser = clap::value_parser!(u32).range(..=i64::from(MAX_WINDOW_DAYS))
        )]
        days: u32,
        /// Last day of the window (default: today)
        #[arg(long)]
        date: Option<String>,
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
    /// Show all-time activity stats
    Stats {
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
    /// Show or change the profile and daily goals
    Profile {
        #[command(subcommand)]
        command: ProfileCommands,
    },
    /// Run a workout stopwatch in the terminal
    Timer {
        /// Log the session as a workout with this exercise name
        #[arg(long, value_name = "EXERCISE")]
        log: Option<String>,
        /// Date to log the session for (default: today)
        #[arg(long)]
        date: Option<String>,
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
    /// Export all data as JSON (or CSV with --csv)
    Export {
        /// Write CSV rows instead of the JSON backup format
        #[arg(long)]
        csv: bool,
        /// Write to a file instead of stdout
        #[arg(short, long, value_name = "PATH")]
        output: Option<PathBuf>,
    },
    /// Import a JSON export (entries already present are skipped)
    Import {
        /// Path to the JSON export file
        file: PathBuf,
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
    /// Start the REST API server
    Serve {
        /// Port to listen on
        #[arg(short, long, default_value = "8080")]
        port: u16,
        /// Address to bind to (default: 127.0.0.1, use 0.0.0.0 to expose to network)
        #[arg(short, long, default_value = "127.0.0.1")]
        bind: String,
        /// Disable API key authentication (for development/testing)
        #[arg(long)]
        no_auth: bool,
    },
}

#[derive(Subcommand)]
enum WorkoutCommands {
    /// Log a workout
    Log {
        /// Exercise name
        exercise: String,
        /// Duration in minutes
        minutes: i64,
        /// Date to log for (YYYY-MM-DD or today/yesterday/tomorrow, default: today)
        #[arg(long)]
        date: Option<String>,
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
    /// List workouts for a day
    List {
        /// Date to list (default: today)
        date: Option<String>,
        /// Show the most recently logged workouts instead
        #[arg(long, conflicts_with = "date")]
        recent: bool,
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
    /// Delete a workout by ID
    Delete {
        /// Workout ID
        id: i64,
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
}

#[derive(Subcommand)]
enum MealCommands {
    /// Log a meal
    Log {
        /// Meal name
        name: String,
        /// Calories
        calories: i64,
        /// Date to log for (YYYY-MM-DD or today/yesterday/tomorrow, default: today)
        #[arg(long)]
        date: Option<String>,
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
    /// List meals for a day
    List {
        /// Date to list (default: today)
        date: Option<String>,
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
    /// Delete a meal by ID
    Delete {
        /// Meal ID
        id: i64,
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
}

#[derive(Subcommand)]
enum WaterCommands {
    /// Add water intake (quick amounts: 250, 500, 750, 1000)
    Add {
        /// Amount in ml
        amount_ml: i64,
        /// Date to log for (default: today)
        #[arg(long)]
        date: Option<String>,
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
    /// Show water progress for a day
    Show {
        /// Date to show (default: today)
        date: Option<String>,
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
}

#[derive(Subcommand)]
enum ProfileCommands {
    /// Show the profile
    Show {
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
    /// Update the profile; unspecified fields keep their value
    Set {
        /// Display name
        #[arg(long)]
        name: Option<String>,
        /// Daily calorie goal (at least 500)
        #[arg(long)]
        calorie_goal: Option<i64>,
        /// Daily water goal in ml (at least 500)
        #[arg(long)]
        water_goal: Option<i64>,
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    let level = resolve_log_level(cli.log_level.as_deref(), std::env::var("RUST_LOG").ok());
    if let Err(e) = init_logging(&level) {
        eprintln!("Error: {e:#}");
        process::exit(1);
    }

    if let Err(e) = run(cli).await {
        eprintln!("Error: {e:#}");
        process::exit(1);
    }
}

/// `--log-level` wins over `RUST_LOG`, which wins over the default.
fn resolve_log_level(flag: Option<&str>, env: Option<String>) -> String {
    flag.map(str::to_string)
        .or(env.filter(|v| !v.trim().is_empty()))
        .unwrap_or_else(|| DEFAULT_LOG_LEVEL.to_string())
}

fn init_logging(level: &str) -> Result<()> {
    let filter = EnvFilter::try_new(level)
        .or_else(|_| EnvFilter::try_new(DEFAULT_LOG_LEVEL))
        .map_err(|e| anyhow::anyhow!("invalid log level: {e}"))?;

    tracing_subscriber::registry()
        .with(fmt::layer().with_writer(std::io::stderr).with_target(true))
        .with(filter)
        .init();

    Ok(())
}

async fn run(cli: Cli) -> Result<()> {
    let config = Config::load()?;
    let svc = FitlogService::new(&config.db_path)?;
    let today = Local::now().date_naive();

    match cli.command {
        Commands::Workout { command } => match command {
            WorkoutCommands::Log {
                exercise,
                minutes,
                date,
                json,
            } => cmd_workout_log(&svc, &exercise, minutes, date, today, json),
            WorkoutCommands::List { date, recent, json } => {
                cmd_workout_list(&svc, date, recent, today, json)
            }
            WorkoutCommands::Delete { id, json } => cmd_workout_delete(&svc, id, json),
        },
        Commands::Meal { command } => match command {
            MealCommands::Log {
                name,
                calories,
                date,
                json,
            } => cmd_meal_log(&svc, &name, calories, date, today, json),
            MealCommands::List { date, json } => cmd_meal_list(&svc, date, today, json),
            MealCommands::Delete { id, json } => cmd_meal_delete(&svc, id, json),
        },
        Commands::Water { command } => match command {
            WaterCommands::Add {
                amount_ml,
                date,
                json,
            } => cmd_water_add(&svc, amount_ml, date, today, json),
            WaterCommands::Show { date, json } => cmd_water_show(&svc, date, today, json),
        },
        Commands::Summary { date, json } => cmd_summary(&svc, date, today, json),
        Commands::Week { days, date, json } => cmd_week(&svc, days, date, today, json),
        Commands::Stats { json } => cmd_stats(&svc, json),
        Commands::Profile { command } => match command {
            ProfileCommands::Show { json } => cmd_profile_show(&svc, json),
            ProfileCommands::Set {
                name,
                calorie_goal,
                water_goal,
                json,
            } => cmd_profile_set(&svc, name, calorie_goal, water_goal, json),
        },
        Commands::Timer { log, date, json } => cmd_timer(&svc, log, date, today, json).await,
        Commands::Export { csv, output } => cmd_export(&svc, csv, output.as_deref()),
        Commands::Import { file, json } => cmd_import(&svc, &file, json),
        Commands::Serve {
            port,
            bind,
            no_auth,
        } => {
            let api_key = if no_auth {
                None
            } else {
                let (key, _) = config.load_or_create_api_key()?;
                Some(key)
            };
            server::start_server(svc, port, &bind, api_key).await
        }
    }
}
