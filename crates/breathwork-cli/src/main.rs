use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

mod bell;
mod commands;

#[derive(Parser)]
#[command(name = "breathwork", version, about = "Breathwork CLI")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run a live breathing session in the terminal
    Run(commands::run::RunArgs),
    /// Breathing patterns
    Pattern {
        #[command(subcommand)]
        action: commands::pattern::PatternAction,
    },
    /// Progressive disclosure stages
    Stage {
        #[command(subcommand)]
        action: commands::stage::StageAction,
    },
    /// Configuration management
    Config {
        #[command(subcommand)]
        action: commands::config::ConfigAction,
    },
}

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let result = match cli.command {
        Commands::Run(args) => commands::run::run(args),
        Commands::Pattern { action } => commands::pattern::run(action),
        Commands::Stage { action } => commands::stage::run(action),
        Commands::Config { action } => commands::config::run(action),
    };

    if let Err(e) = result {
        eprintln!("error: {e}");
        std::process::exit(1);
    }
}
