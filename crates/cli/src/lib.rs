mod script;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand, ValueEnum};
use std::ffi::OsString;
use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};
use takeoff_core::{export_line_items_csv, CanvasConfig, CsvExportConfig};
use takeoff_storage::ConfigStore;
use tracing::warn;

pub use script::{replay, Report, Script};

#[derive(Debug, Parser)]
#[command(name = "takeoff")]
#[command(about = "Takeoff canvas CLI")]
pub struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Debug, Subcommand)]
enum Commands {
    /// Replay a scripted canvas session and print the resulting estimate.
    Replay {
        #[arg(value_name = "SCRIPT")]
        script: PathBuf,
        #[arg(long, value_enum, default_value_t = OutputFormat::Json)]
        format: OutputFormat,
        /// Canvas config file; the saved user config is used when absent.
        #[arg(long, value_name = "FILE")]
        config: Option<PathBuf>,
        /// Fail on the first rejected calibration instead of carrying on.
        #[arg(long)]
        strict: bool,
        /// CSV delimiter.
        #[arg(long, default_value_t = ',')]
        delimiter: char,
        /// Omit the CSV header row.
        #[arg(long)]
        no_headers: bool,
    },
    /// Inspect or create the canvas configuration.
    Config {
        #[command(subcommand)]
        action: ConfigAction,
    },
    /// Print CLI version.
    Version,
}

#[derive(Debug, Subcommand)]
enum ConfigAction {
    /// Print the effective configuration as JSON.
    Show {
        #[arg(long, value_name = "FILE")]
        config: Option<PathBuf>,
    },
    /// Write the default configuration.
    Init {
        /// Directory to write into instead of the user data directory.
        #[arg(long, value_name = "DIR")]
        dir: Option<PathBuf>,
        /// Overwrite an existing file.
        #[arg(long)]
        force: bool,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum OutputFormat {
    Json,
    Csv,
}

/// Install the stderr log subscriber; `RUST_LOG` overrides the `warn` default
pub fn init_logging() {
    use tracing_subscriber::EnvFilter;

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));
    // A subscriber may already be installed when embedded in a test harness
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .try_init();
}

pub fn run<I, T>(args: I) -> Result<()>
where
    I: IntoIterator<Item = T>,
    T: Into<OsString> + Clone,
{
    let cli = Cli::parse_from(args);

    match cli.command {
        Commands::Replay { script, format, config, strict, delimiter, no_headers } => {
            let csv = CsvExportConfig {
                include_headers: !no_headers,
                delimiter: csv_delimiter(delimiter)?,
                page_filter: None,
            };
            run_replay(&script, format, config.as_deref(), strict, &csv)
        }
        Commands::Config { action: ConfigAction::Show { config } } => {
            run_config_show(config.as_deref())
        }
        Commands::Config { action: ConfigAction::Init { dir, force } } => {
            run_config_init(dir.as_deref(), force)
        }
        Commands::Version => {
            println!("{}", env!("CARGO_PKG_VERSION"));
            Ok(())
        }
    }
}

fn run_replay(
    path: &Path,
    format: OutputFormat,
    config: Option<&Path>,
    strict: bool,
    csv: &CsvExportConfig,
) -> Result<()> {
    let bytes =
        fs::read(path).with_context(|| format!("failed to read script {}", path.display()))?;
    let script: Script = serde_json::from_slice(&bytes)
        .with_context(|| format!("failed to parse script {}", path.display()))?;

    let config = resolve_config(config)?;
    let report = replay(&script, config, strict)?;

    match format {
        OutputFormat::Json => {
            let json = serde_json::to_string_pretty(&report)?;
            println!("{json}");
        }
        OutputFormat::Csv => {
            let stdout = std::io::stdout();
            let mut handle = stdout.lock();
            export_line_items_csv(&mut handle, &report.line_items, csv)
                .context("failed to write CSV")?;
            handle.flush()?;
        }
    }

    Ok(())
}

fn run_config_show(config: Option<&Path>) -> Result<()> {
    let config = resolve_config(config)?;
    let json = serde_json::to_string_pretty(&config)?;
    println!("{json}");
    Ok(())
}

fn run_config_init(dir: Option<&Path>, force: bool) -> Result<()> {
    let store = match dir {
        Some(dir) => ConfigStore::with_root(dir),
        None => ConfigStore::from_default_project()?,
    };

    let path = store.config_path();
    if path.exists() && !force {
        anyhow::bail!("config already exists: {} (use --force to overwrite)", path.display());
    }

    store
        .save(&CanvasConfig::default())
        .with_context(|| format!("failed to write config to {}", path.display()))?;
    println!("{}", path.display());
    Ok(())
}

fn resolve_config(path: Option<&Path>) -> Result<CanvasConfig> {
    if let Some(path) = path {
        return takeoff_storage::load_file(path)
            .with_context(|| format!("failed to load config {}", path.display()));
    }

    match ConfigStore::from_default_project() {
        Ok(store) => store
            .load()
            .with_context(|| format!("failed to load config {}", store.config_path().display())),
        Err(error) => {
            warn!(%error, "using default canvas config");
            Ok(CanvasConfig::default())
        }
    }
}

fn csv_delimiter(delimiter: char) -> Result<u8> {
    u8::try_from(delimiter)
        .ok()
        .filter(u8::is_ascii)
        .with_context(|| format!("delimiter must be a single ASCII character, got {delimiter:?}"))
}
