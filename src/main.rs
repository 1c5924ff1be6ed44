//! llmdash - LLM usage dashboard
//!
//! Serves token and cost aggregates from the `llm` tool's log database.
//!
//! ## Usage
//!
//! ```bash
//! # Serve on 127.0.0.1:5000 using ~/.config/llmdash/config.yaml if present
//! llmdash
//!
//! # Point at another log database and port
//! llmdash --db ./logs.db --port 8080
//!
//! # With verbose logging
//! llmdash -v
//! ```

use std::path::PathBuf;
use std::process::ExitCode;

use clap::Parser;
use llmdash_config::{ConfigOverrides, DashboardConfig};
use llmdash_core::{DashError, LogGuard, init_logging};
use tracing::{error, info};

/// LLM usage dashboard
///
/// Reads usage-bearing responses from the llm log database and serves
/// per-model and per-date token and cost summaries as JSON.
#[derive(Parser, Debug)]
#[command(name = "llmdash")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Configuration file (defaults to ~/.config/llmdash/config.yaml)
    #[arg(long)]
    config: Option<PathBuf>,

    /// Path to the llm logs.db
    #[arg(long)]
    db: Option<PathBuf>,

    /// Interface to bind
    #[arg(long)]
    host: Option<String>,

    /// Port to listen on
    #[arg(short, long)]
    port: Option<u16>,

    /// Directory for log files (defaults to ~/.config/llmdash/logs/)
    #[arg(long)]
    log_dir: Option<PathBuf>,

    /// Enable verbose logging (increases log level)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Disable the permissive CORS layer
    #[arg(long)]
    no_cors: bool,
}

impl Cli {
    fn overrides(&self) -> ConfigOverrides {
        ConfigOverrides {
            store_path: self.db.clone(),
            host: self.host.clone(),
            port: self.port,
            log_dir: self.log_dir.clone(),
            verbose: self.verbose > 0,
            no_cors: self.no_cors,
        }
    }
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    let config = match load_config(&cli) {
        Ok(config) => config,
        Err(e) => return report(&e),
    };

    let _guard = match setup_logging(&config) {
        Ok(guard) => guard,
        Err(e) => {
            eprintln!("Failed to initialize logging: {}", e);
            return ExitCode::from(1);
        }
    };

    info!(store = %config.store.path.display(), "Starting llmdash");

    match run_server(&config) {
        Ok(()) => {
            info!("llmdash exited normally");
            ExitCode::SUCCESS
        }
        Err(e) => {
            error!("llmdash error: {}", e);
            report(&e)
        }
    }
}

/// Load, override, resolve and validate configuration.
fn load_config(cli: &Cli) -> llmdash_core::Result<DashboardConfig> {
    let mut config = DashboardConfig::load(cli.config.as_deref())?;
    config.apply_overrides(cli.overrides());
    config.resolve_paths();
    config.validate()?;
    Ok(config)
}

fn setup_logging(config: &DashboardConfig) -> llmdash_core::Result<LogGuard> {
    init_logging(config.logging.dir.clone(), config.logging.verbose)
}

fn run_server(config: &DashboardConfig) -> llmdash_core::Result<()> {
    let runtime = tokio::runtime::Runtime::new()
        .map_err(|e| DashError::internal(format!("failed to start async runtime: {}", e)))?;
    runtime.block_on(llmdash_server::serve(config))
}

/// Print an error and its guidance to stderr.
fn report(err: &DashError) -> ExitCode {
    eprintln!("Error: {}", err);
    if let Some(hint) = err.guidance() {
        eprintln!("  {}", hint);
    }
    ExitCode::from(1)
}
