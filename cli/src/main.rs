mod commands;
mod config;
mod server;

use std::path::PathBuf;
use std::process;

use anyhow::Result;
use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use crate::commands::{
    ExportKind, FoodArgs, cmd_export, cmd_food_add, cmd_food_delete, cmd_food_edit,
    cmd_food_list, cmd_food_saved, cmd_food_search, cmd_settings_clear, cmd_settings_set,
    cmd_settings_show, cmd_summary, cmd_weight_add, cmd_weight_delete, cmd_weight_history,
    cmd_weight_latest, cmd_weight_list,
};
use crate::config::Config;
use fitlog_core::TrackerService;

const DEFAULT_LOG_FILTER: &str = "fitlog=info,fitlog_core=info";

#[derive(Parser)]
#[command(
    name = "fitlog",
    version,
    about = "Track food, weight, and macro targets"
)]
struct Cli {
    /// Path to the SQLite database (default: <data dir>/fitlog.db)
    #[arg(long, global = true, env = "FITLOG_DB", value_name = "PATH")]
    db: Option<PathBuf>,
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Log and browse foods
    Food {
        #[command(subcommand)]
        command: FoodCommands,
    },
    /// Track body weight
    Weight {
        #[command(subcommand)]
        command: WeightCommands,
    },
    /// Manage TDEE and goal
    Settings {
        #[command(subcommand)]
        command: SettingsCommands,
    },
    /// Show a day's foods, totals, and targets (defaults to today)
    Summary {
        /// Date to show (YYYY-MM-DD or today/yesterday/tomorrow, default: today)
        date: Option<String>,
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
    /// Export data as CSV
    Export {
        /// What to export
        #[arg(value_enum)]
        kind: ExportKind,
        /// Write to a file instead of stdout
        #[arg(short, long, value_name = "PATH")]
        output: Option<PathBuf>,
        /// Print a JSON report to stderr
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
enum FoodCommands {
    /// Log a food. Values missing on the command line come from the saved food
    Add {
        /// Food name
        name: String,
        /// Calories
        #[arg(long)]
        calories: Option<f64>,
        /// Protein in grams
        #[arg(long)]
        protein: Option<f64>,
        /// Carbs in grams
        #[arg(long)]
        carbs: Option<f64>,
        /// Fat in grams
        #[arg(long)]
        fat: Option<f64>,
        /// Date to log for (YYYY-MM-DD or today/yesterday/tomorrow, default: today)
        #[arg(long)]
        date: Option<String>,
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
    /// Replace a logged food's name and values
    Edit {
        /// Entry ID
        id: i64,
        /// Food name
        name: String,
        #[arg(long)]
        calories: f64,
        #[arg(long)]
        protein: f64,
        #[arg(long)]
        carbs: f64,
        #[arg(long)]
        fat: f64,
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
    /// Delete a logged food by ID
    Delete {
        /// Entry ID
        id: i64,
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
    /// List foods logged on a date (default: today)
    List {
        /// Date (YYYY-MM-DD or today/yesterday/tomorrow, default: today)
        date: Option<String>,
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
    /// List saved foods
    Saved {
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
    /// Search saved foods by name
    Search {
        /// Substring to match
        query: String,
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
}

#[derive(Subcommand)]
enum WeightCommands {
    /// Log a weight entry
    Add {
        /// Weight in lbs
        value: f64,
        /// morning or night
        #[arg(short, long, default_value = "morning")]
        time: String,
        /// Date (YYYY-MM-DD or today/yesterday/tomorrow, default: today)
        #[arg(long)]
        date: Option<String>,
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
    /// Delete a weight entry by ID
    Delete {
        /// Weight entry ID
        id: i64,
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
    /// List weights of one time of day next to the matching calorie intake
    List {
        /// morning or night
        #[arg(short, long, default_value = "morning")]
        time: String,
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
    /// Show the most recent weight
    Latest {
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
    /// Show every weight entry, newest first
    History {
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
}

#[derive(Subcommand)]
enum SettingsCommands {
    /// Set TDEE and goal
    Set {
        /// Total daily energy expenditure in kcal
        tdee: i64,
        /// Mild Cut, Moderate Cut, Aggressive Cut, Maintenance, Lean Bulk, Aggressive Bulk
        goal: String,
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
    /// Show settings and the resulting macro targets
    Show {
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
    /// Remove the stored settings
    Clear {
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
}

fn init_tracing() {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_LOG_FILTER));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

#[tokio::main]
async fn main() {
    init_tracing();
    let cli = Cli::parse();

    if let Err(e) = run(cli).await {
        eprintln!("Error: {e:#}");
        process::exit(1);
    }
}

async fn run(cli: Cli) -> Result<()> {
    let config = Config::load(cli.db)?;
    let svc = TrackerService::open(&config.db_path)?;

    match cli.command {
        Commands::Food { command } => match command {
            FoodCommands::Add {
                name,
                calories,
                protein,
                carbs,
                fat,
                date,
                json,
            } => {
                let args = FoodArgs {
                    calories,
                    protein,
                    carbs,
                    fat,
                };
                cmd_food_add(&svc, &name, &args, date, json)
            }
            FoodCommands::Edit {
                id,
                name,
                calories,
                protein,
                carbs,
                fat,
                json,
            } => cmd_food_edit(&svc, id, &name, calories, protein, carbs, fat, json),
            FoodCommands::Delete { id, json } => cmd_food_delete(&svc, id, json),
            FoodCommands::List { date, json } => cmd_food_list(&svc, date, json),
            FoodCommands::Saved { json } => cmd_food_saved(&svc, json),
            FoodCommands::Search { query, json } => cmd_food_search(&svc, &query, json),
        },
        Commands::Weight { command } => match command {
            WeightCommands::Add {
                value,
                time,
                date,
                json,
            } => cmd_weight_add(&svc, value, &time, date, json),
            WeightCommands::Delete { id, json } => cmd_weight_delete(&svc, id, json),
            WeightCommands::List { time, json } => cmd_weight_list(&svc, &time, json),
            WeightCommands::Latest { json } => cmd_weight_latest(&svc, json),
            WeightCommands::History { json } => cmd_weight_history(&svc, json),
        },
        Commands::Settings { command } => match command {
            SettingsCommands::Set { tdee, goal, json } => {
                cmd_settings_set(&svc, tdee, &goal, json)
            }
            SettingsCommands::Show { json } => cmd_settings_show(&svc, json),
            SettingsCommands::Clear { json } => cmd_settings_clear(&svc, json),
        },
        Commands::Summary { date, json } => cmd_summary(&svc, date, json),
        Commands::Export { kind, output, json } => {
            cmd_export(&svc, kind, output.as_deref(), json)
        }
        Commands::Serve {
            port,
            bind,
            no_auth,
        } => {
            let api_key = if no_auth {
                None
            } else {
                Some(config.load_or_create_api_key()?)
            };
            server::start_server(svc, port, &bind, api_key).await
        }
    }
}
