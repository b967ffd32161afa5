use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

mod commands;

#[derive(Parser)]
#[command(name = "dayplan", version, about = "Single-day task block planner")]
struct Cli {
    /// Print machine-readable JSON instead of text
    #[arg(long, global = true)]
    json: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Task management
    Task {
        #[command(subcommand)]
        action: commands::task::TaskAction,
    },
    /// Settings management
    Settings {
        #[command(subcommand)]
        action: commands::settings::SettingsAction,
    },
    /// Build and edit the day's schedule
    Plan {
        #[command(subcommand)]
        action: commands::plan::PlanAction,
    },
    /// Import calendar events or external to-dos
    Import {
        #[command(subcommand)]
        action: commands::import::ImportAction,
    },
    /// Export the schedule
    Export {
        #[command(subcommand)]
        action: commands::export::ExportAction,
    },
}

fn init_logging() {
    let filter = EnvFilter::try_from_env("DAYPLAN_LOG").unwrap_or_else(|_| EnvFilter::new("warn"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

fn main() {
    init_logging();

    let cli = Cli::parse();
    let json = cli.json;
    let result = match cli.command {
        Commands::Task { action } => commands::task::run(action, json),
        Commands::Settings { action } => commands::settings::run(action, json),
        Commands::Plan { action } => commands::plan::run(action, json),
        Commands::Import { action } => commands::import::run(action, json),
        Commands::Export { action } => commands::export::run(action),
    };

    if let Err(e) = result {
        eprintln!("error: {e}");
        std::process::exit(1);
    }
}
