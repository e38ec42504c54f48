//! Command-line front end: hands a selection to the engine and prints the
//! result as JSON on stdout. Logs go to stderr.

use std::path::PathBuf;
use std::process::ExitCode;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand, ValueEnum};
use serde::Serialize;
use tracing::{error, info};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use packdrop_core::{
    load_config, load_default_config, validate_config, Action, ArchiveFormat, Config, Engine,
    OutputFormat, RunResult, Selection,
};

/// Environment variable naming the configuration file.
const CONFIG_ENV: &str = "PACKDROP_CONFIG";

/// Archive and convert selected files
#[derive(Parser)]
#[command(name = "packdrop")]
#[command(author, version, about, long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Configuration file (defaults to $PACKDROP_CONFIG, then built-in defaults)
    #[arg(long, short = 'c', global = true)]
    config: Option<PathBuf>,
}

#[derive(Subcommand)]
enum Commands {
    /// Compress the selection into one archive next to it
    Archive {
        /// Archive format: zip, tar.gz or tar.xz
        #[arg(long, short = 'f', default_value = "zip")]
        format: ArchiveFormat,

        /// Items to archive; all must share one folder
        #[arg(required = true)]
        paths: Vec<PathBuf>,
    },

    /// Convert audio files or a single video to another format
    Convert {
        /// Target format, e.g. aiff, m4a, wav, mp4, mov, m4v
        #[arg(long, short = 't')]
        to: String,

        /// Files to convert
        #[arg(required = true)]
        paths: Vec<PathBuf>,
    },

    /// List the formats offered for a selection
    Formats {
        /// What the formats are for
        #[arg(value_enum)]
        action: ActionArg,

        /// Selected items
        #[arg(required = true)]
        paths: Vec<PathBuf>,
    },
}

#[derive(Clone, Copy, ValueEnum)]
enum ActionArg {
    Archive,
    Convert,
}

impl From<ActionArg> for Action {
    fn from(arg: ActionArg) -> Self {
        match arg {
            ActionArg::Archive => Action::Archive,
            ActionArg::Convert => Action::Convert,
        }
    }
}

#[derive(Serialize)]
struct OfferedFormat {
    name: String,
    label: &'static str,
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    let config = resolve_config(cli.config.as_ref());
    let level = config
        .as_ref()
        .map(|c| c.logging.level.clone())
        .unwrap_or_else(|_| "info".to_string());

    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level)))
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let outcome = match config {
        Ok(config) => run(cli.command, config).await,
        Err(e) => Err(e),
    };

    match outcome {
        Ok(true) => ExitCode::SUCCESS,
        Ok(false) => ExitCode::FAILURE,
        Err(e) => {
            error!("Fatal error: {:#}", e);
            ExitCode::from(2)
        }
    }
}

fn resolve_config(explicit: Option<&PathBuf>) -> Result<Config> {
    let path = explicit
        .cloned()
        .or_else(|| std::env::var(CONFIG_ENV).ok().map(PathBuf::from));

    let config = match path {
        Some(path) => load_config(&path)
            .with_context(|| format!("Failed to load config from {:?}", path))?,
        None => load_default_config().context("Failed to load default config")?,
    };
    validate_config(&config).context("Configuration validation failed")?;
    Ok(config)
}

/// Returns whether the command succeeded.
async fn run(command: Commands, config: Config) -> Result<bool> {
    let engine = Engine::new(config);

    match command {
        Commands::Archive { format, paths } => {
            let result = match selection(&paths) {
                Ok(selection) => engine.run(selection, OutputFormat::Archive(format)).await,
                Err(result) => result,
            };
            print_json(&result)?;
            Ok(result.is_success())
        }
        Commands::Convert { to, paths } => {
            let result = match (selection(&paths), OutputFormat::conversion_target(&to)) {
                (Ok(selection), Ok(format)) => engine.run(selection, format).await,
                (Err(result), _) => result,
                (_, Err(e)) => RunResult::failure(
                    format!("\"{to}\" is not a format files can be converted to."),
                    e.to_string(),
                ),
            };
            print_json(&result)?;
            Ok(result.is_success())
        }
        Commands::Formats { action, paths } => {
            let selection = match selection(&paths) {
                Ok(selection) => selection,
                Err(result) => {
                    print_json(&result)?;
                    return Ok(false);
                }
            };
            match engine.offered_formats(&selection, action.into()).await {
                Ok(formats) => {
                    info!(count = formats.len(), "Offered formats");
                    let offered: Vec<OfferedFormat> = formats
                        .iter()
                        .map(|f| OfferedFormat {
                            name: f.to_string(),
                            label: f.label(),
                        })
                        .collect();
                    print_json(&offered)?;
                    Ok(true)
                }
                Err(e) => {
                    print_json(&RunResult::failure(e.user_message(), e.diagnostics()))?;
                    Ok(false)
                }
            }
        }
    }
}

/// Makes the paths absolute and validates them as a selection.
fn selection(paths: &[PathBuf]) -> std::result::Result<Selection, RunResult> {
    let absolute = paths
        .iter()
        .map(std::path::absolute)
        .collect::<std::io::Result<Vec<_>>>()
        .map_err(|e| RunResult::failure("The selection could not be read.", e.to_string()))?;

    Selection::new(absolute).map_err(|e| RunResult::failure(e.user_message(), e.to_string()))
}

fn print_json<T: Serialize>(value: &T) -> Result<()> {
    let json = serde_json::to_string_pretty(value).context("Failed to serialize output")?;
    println!("{json}");
    Ok(())
}
