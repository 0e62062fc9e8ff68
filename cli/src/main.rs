mod commands;
mod config;
mod server;

use std::path::PathBuf;
use std::process;

use anyhow::Result;
use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use crate::commands::{
    cmd_allowance, cmd_choose, cmd_complete, cmd_config_set_tolerance, cmd_config_show,
    cmd_custom, cmd_day, cmd_delete, cmd_plan_activate, cmd_plan_import, cmd_plan_list,
    cmd_plan_show, cmd_reconcile, cmd_update,
};
use crate::config::Config;
use mealcoach_core::service::LedgerService;

#[derive(Parser)]
#[command(
    name = "mealcoach",
    version,
    about = "Track what clients eat against their trainer's meal plan",
    long_about = "Track what clients eat against their trainer's meal plan.\n\n\
        Choices are recorded against the client's active plan; meals whose \
        targets are reached are marked complete automatically."
)]
struct Cli {
    /// Client whose ledger to operate on
    #[arg(short, long, global = true, default_value = "default")]
    client: String,
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Manage the client's meal plans
    Plan {
        #[command(subcommand)]
        command: PlanCommands,
    },
    /// Record a quantity of a food option from the active plan
    Choose {
        /// Food option ID (see `plan show`)
        option_id: i64,
        /// Quantity eaten (e.g. "150g", "150,5", "80")
        quantity: String,
        /// Meal slot the choice belongs to (defaults to the option's slot)
        #[arg(short, long)]
        slot: Option<i64>,
        /// Date (YYYY-MM-DD or today/yesterday/tomorrow, default: today)
        #[arg(long)]
        date: Option<String>,
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
    /// Record a food that is not in the plan, with its absolute macros
    Custom {
        /// Food name
        name: String,
        /// Meal slot to count it toward (omit to count toward the day only)
        #[arg(short, long)]
        slot: Option<i64>,
        /// Calories
        #[arg(long, default_value = "0")]
        calories: f64,
        /// Protein in grams
        #[arg(short, long, default_value = "0")]
        protein: f64,
        /// Carbs in grams
        #[arg(long, default_value = "0")]
        carbs: f64,
        /// Fat in grams
        #[arg(short, long, default_value = "0")]
        fat: f64,
        /// Date (YYYY-MM-DD or today/yesterday/tomorrow, default: today)
        #[arg(long)]
        date: Option<String>,
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
    /// Change the quantity of a recorded choice
    Update {
        /// Choice ID
        choice_id: i64,
        /// New quantity (e.g. "200g")
        quantity: String,
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
    /// Delete a recorded choice
    Delete {
        /// Choice ID
        choice_id: i64,
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
    /// Show the day: per-meal totals, targets, completion and choices
    Day {
        /// Date (YYYY-MM-DD or today/yesterday/tomorrow, default: today)
        date: Option<String>,
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
    /// Show how many grams each option in a category may still take
    Allowance {
        /// Meal slot ID
        slot_id: i64,
        /// Macro category: protein, carb, fat
        macro_type: String,
        /// Date (YYYY-MM-DD or today/yesterday/tomorrow, default: today)
        #[arg(long)]
        date: Option<String>,
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
    /// Mark a meal as eaten
    Complete {
        /// Meal slot ID
        slot_id: i64,
        /// Date (YYYY-MM-DD or today/yesterday/tomorrow, default: today)
        #[arg(long)]
        date: Option<String>,
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
    /// Clear a meal's completion
    Uncomplete {
        /// Meal slot ID
        slot_id: i64,
        /// Date (YYYY-MM-DD or today/yesterday/tomorrow, default: today)
        #[arg(long)]
        date: Option<String>,
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
    /// Re-derive automatic completions for a day
    Reconcile {
        /// Date (YYYY-MM-DD or today/yesterday/tomorrow, default: today)
        date: Option<String>,
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
    /// Show or change settings
    Config {
        #[command(subcommand)]
        command: ConfigCommands,
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
enum PlanCommands {
    /// Import a meal plan from a JSON file and make it active
    Import {
        /// Path to the plan JSON file
        file: PathBuf,
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
    /// Show the active meal plan
    Show {
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
    /// List all plans for the client
    List {
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
    /// Make a previously imported plan the active one
    Activate {
        /// Plan ID
        plan_id: i64,
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
}

#[derive(Subcommand)]
enum ConfigCommands {
    /// Show data paths and current settings
    Show {
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
    /// Set how far below a target (in grams or kcal) still counts as reached
    SetTolerance {
        /// Tolerance value (non-negative)
        tolerance: f64,
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
}

fn init_tracing() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::from_default_env()
                .add_directive("mealcoach=info".parse()?)
                .add_directive("mealcoach_core=warn".parse()?),
        )
        .with_writer(std::io::stderr)
        .init();
    Ok(())
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    if let Err(e) = init_tracing() {
        eprintln!("Error: {e:#}");
        process::exit(1);
    }

    if let Err(e) = run(cli).await {
        eprintln!("Error: {e:#}");
        process::exit(1);
    }
}

async fn run(cli: Cli) -> Result<()> {
    let config = Config::load()?;
    let svc = LedgerService::new(&config.db_path)?;
    let client = cli.client.as_str();

    match cli.command {
        Commands::Plan { command } => match command {
            PlanCommands::Import { file, json } => cmd_plan_import(&svc, client, &file, json),
            PlanCommands::Show { json } => cmd_plan_show(&svc, client, json),
            PlanCommands::List { json } => cmd_plan_list(&svc, client, json),
            PlanCommands::Activate { plan_id, json } => {
                cmd_plan_activate(&svc, client, plan_id, json)
            }
        },
        Commands::Choose {
            option_id,
            quantity,
            slot,
            date,
            json,
        } => cmd_choose(&svc, client, option_id, &quantity, slot, date, json),
        Commands::Custom {
            name,
            slot,
            calories,
            protein,
            carbs,
            fat,
            date,
            json,
        } => cmd_custom(
            &svc, client, &name, slot, calories, protein, carbs, fat, date, json,
        ),
        Commands::Update {
            choice_id,
            quantity,
            json,
        } => cmd_update(&svc, choice_id, &quantity, json),
        Commands::Delete { choice_id, json } => cmd_delete(&svc, choice_id, json),
        Commands::Day { date, json } => cmd_day(&svc, client, date, json),
        Commands::Allowance {
            slot_id,
            macro_type,
            date,
            json,
        } => cmd_allowance(&svc, client, slot_id, &macro_type, date, json),
        Commands::Complete {
            slot_id,
            date,
            json,
        } => cmd_complete(&svc, client, slot_id, true, date, json),
        Commands::Uncomplete {
            slot_id,
            date,
            json,
        } => cmd_complete(&svc, client, slot_id, false, date, json),
        Commands::Reconcile { date, json } => cmd_reconcile(&svc, client, date, json),
        Commands::Config { command } => match command {
            ConfigCommands::Show { json } => cmd_config_show(&svc, &config, client, json),
            ConfigCommands::SetTolerance { tolerance, json } => {
                cmd_config_set_tolerance(&svc, tolerance, json)
            }
        },
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
