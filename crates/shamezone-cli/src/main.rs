use clap::{Parser, Subcommand};
use shamezone_core::Config;
use tracing_subscriber::EnvFilter;

mod app;
mod commands;

#[derive(Parser)]
#[command(name = "shamezone-cli", version, about = "ShameZone CLI")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Goal management
    Goal {
        #[command(subcommand)]
        action: commands::goal::GoalAction,
    },
    /// Goals crushed, streak and missed days
    Stats,
    /// Tone, reminder time and test mode
    Settings {
        #[command(subcommand)]
        action: commands::settings::SettingsAction,
    },
    /// Reminder schedule
    Notify {
        #[command(subcommand)]
        action: commands::notify::NotifyAction,
    },
    /// Configuration management
    Config {
        #[command(subcommand)]
        action: commands::config::ConfigAction,
    },
    /// First-run flag
    Onboarding {
        #[command(subcommand)]
        action: commands::onboarding::OnboardingAction,
    },
}

/// Log to stderr. SHAMEZONE_LOG wins over the configured level.
fn init_tracing() {
    let level = Config::load_or_default().log.level;
    let filter = EnvFilter::try_from_env("SHAMEZONE_LOG")
        .unwrap_or_else(|_| EnvFilter::new(level));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .try_init();
}

fn main() {
    init_tracing();

    let cli = Cli::parse();
    let result = match cli.command {
        Commands::Goal { action } => commands::goal::run(action),
        Commands::Stats => commands::stats::run(),
        Commands::Settings { action } => commands::settings::run(action),
        Commands::Notify { action } => commands::notify::run(action),
        Commands::Config { action } => commands::config::run(action),
        Commands::Onboarding { action } => commands::onboarding::run(action),
    };

    if let Err(e) = result {
        eprintln!("error: {e}");
        std::process::exit(1);
    }
}
