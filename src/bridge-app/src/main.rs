//! Slack-Cloudinary bridge MCP server binary.

use std::process::ExitCode;
use std::time::Duration;

use clap::Parser;
use tracing::{error, info};

use bridge_app::logging::setup_logging;
use bridge_app::{BridgeOptions, Credentials, DEFAULT_HTTP_TIMEOUT_SECS, build_server, connect};
use bridge_cloudinary::DEFAULT_API_BASE;

#[derive(Parser)]
#[command(name = "slack-cloudinary-bridge")]
#[command(about = "MCP server that copies private Slack images to Cloudinary")]
#[command(version)]
struct Args {
    /// Log level
    #[arg(long, default_value = "info")]
    log_level: String,

    /// Enable JSON logging
    #[arg(long)]
    json_logs: bool,

    /// Timeout in seconds for each outbound HTTP request
    #[arg(
        long,
        env = "BRIDGE_HTTP_TIMEOUT_SECS",
        default_value_t = DEFAULT_HTTP_TIMEOUT_SECS,
        value_parser = clap::value_parser!(u64).range(1..)
    )]
    timeout_secs: u64,

    /// Cloudinary API host
    #[arg(long, env = "CLOUDINARY_API_BASE", default_value = DEFAULT_API_BASE)]
    cloudinary_api_base: String,
}

#[tokio::main]
async fn main() -> ExitCode {
    // Process environment takes precedence over .env entries.
    let dotenv = dotenvy::dotenv();
    let args = Args::parse();

    setup_logging(&args.log_level, args.json_logs);
    if let Ok(path) = dotenv {
        info!(path = %path.display(), "Loaded .env file");
    }

    let options = BridgeOptions {
        http_timeout: Duration::from_secs(args.timeout_secs),
        cloudinary_api_base: args.cloudinary_api_base,
    };

    let bridge = match connect(Credentials::from_env(), &options) {
        Ok(bridge) => bridge,
        Err(e) => {
            error!("Failed to build HTTP clients: {e:#}");
            return ExitCode::FAILURE;
        }
    };

    let server = match build_server(bridge) {
        Ok(server) => server,
        Err(e) => {
            error!("Failed to build MCP server: {e:#}");
            return ExitCode::FAILURE;
        }
    };

    if let Err(e) = server.run_stdio().await {
        error!("Server error: {e:#}");
        return ExitCode::FAILURE;
    }

    info!("Server stopped");
    ExitCode::SUCCESS
}
