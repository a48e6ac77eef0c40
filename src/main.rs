//! dealx-mcp: MCP server for searching ads on the DealX marketplace
//!
//! Speaks JSON-RPC 2.0 on stdin/stdout and forwards `search_ads` calls to
//! the DealX search API. Logs go to stderr.

use std::path::PathBuf;
use std::process::ExitCode;

use clap::Parser;
use tracing::{error, info, warn, Level};
use tracing_subscriber::EnvFilter;

use dealx_mcp::config;
use dealx_mcp::dealx::DealxClient;
use dealx_mcp::mcp::server::McpServer;
use dealx_mcp::tools::ToolRegistry;

/// MCP server for searching ads on the DealX marketplace.
///
/// The API base URL comes from the configuration file, overridden by the
/// `DEALX_API_URL` environment variable.
#[derive(Parser, Debug)]
#[command(name = "dealx-mcp")]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Path to configuration file
    #[arg(value_name = "CONFIG_FILE")]
    config: Option<PathBuf>,

    /// Increase logging verbosity (-v for info, -vv for debug, -vvv for trace)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Decrease logging verbosity (only show errors)
    #[arg(short, long)]
    quiet: bool,
}

/// Determines the log level from CLI arguments.
#[allow(clippy::match_same_arms)] // Explicit "warn" arm for clarity
fn get_log_level(verbose: u8, quiet: bool, config_level: &str) -> Level {
    if quiet {
        return Level::ERROR;
    }

    match verbose {
        0 => match config_level.to_lowercase().as_str() {
            "trace" => Level::TRACE,
            "debug" => Level::DEBUG,
            "info" => Level::INFO,
            "warn" => Level::WARN,
            "error" => Level::ERROR,
            _ => Level::WARN,
        },
        1 => Level::INFO,
        2 => Level::DEBUG,
        _ => Level::TRACE,
    }
}

/// Initialises the tracing subscriber for logging.
fn init_tracing(level: Level) {
    let filter = EnvFilter::from_default_env().add_directive(level.into());

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();
}

/// Entry point for the dealx-mcp server.
fn main() -> ExitCode {
    let args = Args::parse();

    let cfg = match config::load_config(args.config.as_deref()) {
        Ok(cfg) => cfg,
        Err(e) => {
            eprintln!("Configuration error: {e}");
            return ExitCode::FAILURE;
        }
    };

    init_tracing(get_log_level(args.verbose, args.quiet, &cfg.logging.level));

    if let Err(e) = cfg.validate() {
        warn!(error = %e, "Searches will fail until the API base URL is fixed");
    }

    info!(
        version = env!("CARGO_PKG_VERSION"),
        base_url = %cfg.api.base_url,
        "Starting dealx-mcp server"
    );

    let client = DealxClient::new(cfg.api.base_url.clone());
    let server = McpServer::new(ToolRegistry::with_defaults(client));

    let runtime = match tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
    {
        Ok(rt) => rt,
        Err(e) => {
            error!(error = %e, "Failed to create Tokio runtime");
            return ExitCode::FAILURE;
        }
    };

    info!("DealX MCP server running on stdio");

    let outcome = runtime.block_on(server.run());

    // The stdin reader may still be parked in a blocking read; do not wait for it
    runtime.shutdown_background();

    match outcome {
        Ok(()) => {
            info!("Server shut down gracefully");
            ExitCode::SUCCESS
        }
        Err(e) => {
            error!(error = %e, "Server error");
            ExitCode::FAILURE
        }
    }
}
