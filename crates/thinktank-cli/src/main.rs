//! ThinkTank CLI - run debates between philosophical personalities
//!
//! # Usage
//!
//! ```bash
//! # Debate with chosen personalities
//! thinktank debate "Is free will an illusion?" --debaters socrates,nietzsche
//!
//! # Everyone debates, offline, with the mock provider
//! thinktank debate "What is justice?" --provider mock --model mock-1
//!
//! # Manage personalities
//! thinktank personalities list
//! thinktank personalities add hypatia.json
//!
//! # Show the debate formats
//! thinktank formats
//! ```

use std::path::PathBuf;

use anyhow::Result;
use clap::{Parser, Subcommand};
use colored::Colorize;

mod commands;

use commands::{debate, formats, personalities};

/// ThinkTank - philosophical debates between LLM personalities
#[derive(Parser)]
#[command(
    name = "thinktank",
    version,
    about = "ThinkTank CLI - Debates between AI personalities",
    long_about = "ThinkTank stages structured debates between personalities,\n\
                  each voiced by its preferred language model, with an\n\
                  impartial moderator opening, closing and judging."
)]
struct Cli {
    /// Increase verbosity (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    /// Directory of personality JSON files
    #[arg(
        long,
        global = true,
        env = "THINKTANK_PERSONALITIES_DIR",
        default_value = "personalities"
    )]
    personalities_dir: PathBuf,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run a debate on a topic
    #[command(name = "debate")]
    Debate(debate::DebateArgs),

    /// Personality management
    #[command(name = "personalities")]
    Personalities(personalities::PersonalitiesArgs),

    /// List the debate formats
    #[command(name = "formats")]
    Formats(formats::FormatsArgs),
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    setup_logging(cli.verbose);

    match cli.command {
        Commands::Debate(args) => debate::run(args, &cli.personalities_dir).await,
        Commands::Personalities(args) => personalities::run(args, &cli.personalities_dir).await,
        Commands::Formats(args) => formats::run(args),
    }
}

/// Setup logging based on verbosity level
fn setup_logging(verbosity: u8) {
    use tracing_subscriber::EnvFilter;

    let filter = match verbosity {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    };

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(filter)))
        .with_writer(std::io::stderr)
        .init();
}

/// Print a success message with a checkmark
pub fn print_success(msg: &str) {
    println!("{} {}", "✓".green().bold(), msg);
}

/// Print a warning message
pub fn print_warning(msg: &str) {
    println!("{} {}", "⚠".yellow().bold(), msg);
}
