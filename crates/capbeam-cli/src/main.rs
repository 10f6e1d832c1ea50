//! capbeam command-line interface.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use capbeam_common::{CaptionConfig, LogFormat, LogLevel};
use clap::{CommandFactory, Parser, Subcommand};
use tracing::error;

mod decode;

use decode::DecodeCommand;

const DEFAULT_CONFIG: &str = "capbeam.toml";

#[derive(Parser)]
#[command(name = "capbeam")]
#[command(about = "Caption decoding with batched beam search")]
#[command(long_about = r#"
capbeam turns per-step word scores into ranked captions.

A transition table in JSON stands in for the captioning network; a vocabulary
file maps token ids to words.

Examples:
  capbeam decode --model model.json --vocab vocab.json --inputs img-1,img-2
  capbeam decode --model model.json --vocab vocab.json --inputs img-1 --beam-size 1
  capbeam config show
"#)]
#[command(version)]
struct Cli {
    /// Configuration file path
    #[arg(short, long, value_name = "PATH", global = true, default_value = DEFAULT_CONFIG)]
    config: PathBuf,

    /// Log level (trace, debug, info, warn, error)
    #[arg(long, value_name = "LEVEL", global = true)]
    log_level: Option<LogLevel>,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Caption a list of inputs
    Decode(DecodeCommand),

    /// Configuration management
    Config {
        #[command(subcommand)]
        action: ConfigAction,
    },
}

#[derive(Subcommand)]
enum ConfigAction {
    /// Show the effective configuration
    Show,
}

fn main() {
    let cli = Cli::parse();

    if let Err(e) = run(cli) {
        error!("Command failed: {}", e);
        eprintln!("error: {e}");
        for cause in e.chain().skip(1) {
            eprintln!("  caused by: {cause}");
        }
        std::process::exit(1);
    }
}

fn run(cli: Cli) -> Result<()> {
    let mut config = load_configuration(&cli.config)?;
    if let Some(level) = cli.log_level {
        config.logging.level = level;
    }
    setup_logging(&config);

    match cli.command {
        Some(Commands::Decode(cmd)) => cmd.execute(&config),
        Some(Commands::Config { action: ConfigAction::Show }) => show_config(&config),
        None => {
            Cli::command().print_help()?;
            Ok(())
        }
    }
}

/// Defaults, then the TOML file, then `CAPBEAM_*` variables.
fn load_configuration(path: &Path) -> Result<CaptionConfig> {
    let mut config = CaptionConfig::from_toml(path)
        .with_context(|| format!("Failed to load configuration from {}", path.display()))?;
    config.apply_env().context("Failed to apply environment overrides")?;
    Ok(config)
}

/// Install the global subscriber. Logs go to stderr so stdout stays
/// machine-readable.
fn setup_logging(config: &CaptionConfig) {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(config.logging.level.to_string()));

    let subscriber = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr);

    match config.logging.format {
        LogFormat::Json => {
            subscriber.json().with_timer(tracing_subscriber::fmt::time::uptime()).init();
        }
        LogFormat::Compact => subscriber.compact().init(),
        LogFormat::Pretty => subscriber.pretty().init(),
    }
}

fn show_config(config: &CaptionConfig) -> Result<()> {
    let text = config.to_toml().context("Failed to serialize configuration")?;
    println!("{}", text);
    Ok(())
}
