//! Content saver
//!
//! Accepts a document from a browser editor and commits it to a GitHub
//! repository.
//!
//! ```text
//!     POST /save ─▶ cors ─▶ rate limit ─▶ validate ─▶ password ─▶ commit ─▶ GitHub
//!     GET  /save ─▶ cors ─▶ health report
//! ```

use std::path::PathBuf;
use std::process::ExitCode;

use clap::{Parser, Subcommand};

use content_saver::config::load_config;
use content_saver::health;
use content_saver::lifecycle;
use content_saver::observability::logging::init_logging;

#[derive(Parser)]
#[command(name = "content-saver")]
#[command(about = "Save documents from a browser editor into a GitHub repository", long_about = None)]
#[command(version)]
struct Cli {
    /// Optional TOML config file; environment variables override it
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the HTTP server (default)
    Serve {
        /// Override the listen address
        #[arg(short, long)]
        bind: Option<String>,
    },
    /// Print the configuration health report
    Health {
        /// Query a running server instead of the local configuration
        #[arg(short, long)]
        url: Option<String>,
    },
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    let mut config = match load_config(cli.config.as_deref()) {
        Ok(config) => config,
        Err(e) => {
            init_logging("content_saver=info");
            tracing::error!(error = %e, "Failed to load configuration");
            return ExitCode::FAILURE;
        }
    };
    init_logging(&config.observability.log_level);

    match cli.command.unwrap_or(Commands::Serve { bind: None }) {
        Commands::Serve { bind } => {
            if let Some(bind) = bind {
                config.listener.bind_address = bind;
            }
            tracing::info!(version = env!("CARGO_PKG_VERSION"), "content-saver starting");
            match lifecycle::run(config).await {
                Ok(()) => ExitCode::SUCCESS,
                Err(e) => {
                    tracing::error!(error = %e, "Server exited with error");
                    ExitCode::FAILURE
                }
            }
        }
        Commands::Health { url: Some(url) } => match remote_health(&url).await {
            Ok(ready) => exit_for(ready),
            Err(e) => {
                eprintln!("Error: {e}");
                ExitCode::FAILURE
            }
        },
        Commands::Health { url: None } => {
            let status = health::report(&config);
            match serde_json::to_string_pretty(&status) {
                Ok(json) => println!("{json}"),
                Err(e) => eprintln!("Error: {e}"),
            }
            exit_for(status.is_ready())
        }
    }
}

async fn remote_health(url: &str) -> Result<bool, reqwest::Error> {
    let res = reqwest::get(url).await?;
    let ready = res.status().is_success();
    let body: serde_json::Value = res.json().await?;
    match serde_json::to_string_pretty(&body) {
        Ok(json) => println!("{json}"),
        Err(_) => println!("{body}"),
    }
    Ok(ready)
}

fn exit_for(ready: bool) -> ExitCode {
    if ready {
        ExitCode::SUCCESS
    } else {
        ExitCode::FAILURE
    }
}
