//! # Support Monitor CLI

use clap::{Parser, Subcommand};
use std::path::PathBuf;
use std::process::ExitCode;
use supmon_agent::commands::{self, OutputFormat, OutputOptions};
use supmon_base::config::constants::scheduling::DAEMON_POLL_INTERVAL;
use supmon_base::config::{LoggingPreferences, MonitorConfig};
use supmon_base::logging;
use supmon_base::{log_error, log_info};

#[derive(Parser)]
#[command(name = "supmon", version, about = "Scheduled self-reporting support monitor")]
struct Cli {
    /// TOML configuration file (overrides SUPMON_CONFIG)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[arg(long, value_enum, default_value_t = OutputFormat::Table, global = true)]
    format: OutputFormat,

    /// Pretty-print JSON output
    #[arg(long, global = true)]
    pretty: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Compile and post a report, waiting for the endpoint's answer
    Update,
    /// Show endpoint, secret, last run and next scheduled run
    Info,
    /// Print the compiled report without sending it
    Report,
    /// Register the periodic event
    Schedule,
    /// Remove the periodic event
    Unschedule,
    /// Run the catch-up check and the periodic loop
    Run {
        /// Check once and exit instead of looping
        #[arg(long)]
        once: bool,
    },
    /// Unschedule and delete all stored state
    Uninstall,
}

fn init_logging() -> Result<(), String> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info"))
        .format_target(false)
        .init();

    logging::config::init_runtime_preferences(LoggingPreferences::default().with_log_facade())?;
    logging::init_global_logging()
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    if let Err(e) = init_logging() {
        eprintln!("Error: cannot initialize logging: {}", e);
        return ExitCode::FAILURE;
    }

    let config = match MonitorConfig::load(cli.config.as_deref()) {
        Ok(config) => config,
        Err(e) => {
            log_error!(logging::codes::system::CONFIGURATION_ERROR, "Cannot load configuration",
                "error" => &e
            );
            eprintln!("Error: {}", e);
            return ExitCode::FAILURE;
        }
    };

    let monitor = match supmon_agent::build_monitor(&config) {
        Ok(monitor) => monitor,
        Err(e) => {
            eprintln!("Error: {}", e.user_message());
            return ExitCode::FAILURE;
        }
    };

    let options = OutputOptions::new(cli.format, cli.pretty);
    log_info!("Support monitor starting",
        "endpoint" => monitor.api_endpoint().unwrap_or("none")
    );

    let result = match cli.command {
        Command::Update => commands::update(&monitor, &options),
        Command::Info => commands::info(&monitor, &options),
        Command::Report => commands::report(&monitor, &options),
        Command::Schedule => commands::schedule(&monitor),
        Command::Unschedule => commands::unschedule(&monitor),
        Command::Run { once } => commands::run(&monitor, once, DAEMON_POLL_INTERVAL),
        Command::Uninstall => commands::uninstall(&monitor),
    };

    match result {
        Ok(text) => {
            println!("{}", text);
            ExitCode::SUCCESS
        }
        Err(e) => {
            eprintln!("Error: {}", e.user_message());
            ExitCode::FAILURE
        }
    }
}
