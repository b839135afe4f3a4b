/// Main entry point for the GitHub file manager MCP server
///
/// This file sets up logging, parses command line arguments, and starts the MCP server.
/// The server listens for JSON-RPC requests over stdin/stdout following the MCP protocol.

use clap::Parser;
use std::path::PathBuf;
use tracing::info;
use tracing_subscriber::EnvFilter;

use github_file_manager_mcp::config::{load_env_file, mask};
use github_file_manager_mcp::{Config, ConfigOverrides, FileManagerServer};

/// Command line arguments for the GitHub file manager MCP server
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Env file to read GITHUB_TOKEN and GITHUB_API_URL from
    #[arg(long, default_value = ".env")]
    env_file: PathBuf,

    /// GitHub token (overrides GITHUB_TOKEN)
    #[arg(long)]
    github_token: Option<String>,

    /// GitHub API base URL (overrides GITHUB_API_URL)
    #[arg(long)]
    github_api_url: Option<String>,

    /// Server name reported to clients
    #[arg(long)]
    server_name: Option<String>,

    /// Enable debug logging
    #[arg(short, long)]
    debug: bool,

    /// Enable verbose output (implies debug)
    #[arg(short, long)]
    verbose: bool,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args = Args::parse();

    // Set up logging based on command line flags; RUST_LOG wins when set
    let log_level = if args.verbose {
        "debug"
    } else if args.debug {
        "info"
    } else {
        "warn"
    };

    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(format!("github_file_manager_mcp={}", log_level)));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr) // Send logs to stderr, not stdout
        .init();

    info!("Starting GitHub file manager MCP server");

    let loaded = load_env_file(&args.env_file)?;
    info!("Loaded {} variables from {}", loaded, args.env_file.display());

    let config = Config::resolve(ConfigOverrides {
        github_token: args.github_token,
        github_api_url: args.github_api_url,
        server_name: args.server_name,
    });

    if let Some(token) = &config.github.token {
        info!("Using GitHub token {}", mask(token));
    }

    // Create and start the server
    let server = FileManagerServer::new(config)?;

    // Run the MCP server - this will handle JSON-RPC communication over stdin/stdout
    server.run().await?;

    info!("GitHub file manager MCP server shutdown complete");
    Ok(())
}
