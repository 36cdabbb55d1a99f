mod scan_cmd;
mod settings;
mod status_cmd;
mod terminal_output;

use std::path::PathBuf;

use anyhow::Result;
use clap::{Parser, Subcommand};
use tracing::{info, instrument, warn};

use listscan_config::{collect_redacted_paths, load_and_prepare, redact};
use listscan_gateway::{start_server, ConfigReloader, GatewayState};
use listscan_logging::init_logger;

use scan_cmd::{OutputFormat, ScanArgs};
use settings::ServerSettings;

#[derive(Parser)]
#[command(name = "listscan")]
#[command(about = "listscan: handwritten list recognition with multi-sample consolidation")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Start the HTTP server
    Serve {
        /// Port to bind the HTTP server to
        #[arg(short, long)]
        port: Option<u16>,
        /// Recognition config document
        #[arg(short, long)]
        config: Option<PathBuf>,
    },
    /// Recognize one image file locally
    Scan {
        /// PNG or JPEG file to read
        image: PathBuf,
        /// Parallel recognition samples (1-10)
        #[arg(short = 'n', long)]
        concurrency: Option<i64>,
        /// Enable model reasoning on recognition calls
        #[arg(long)]
        thinking: bool,
        #[arg(short, long, value_enum, default_value_t = OutputFormat::Ndjson)]
        format: OutputFormat,
        /// Recognition config document
        #[arg(short, long)]
        config: Option<PathBuf>,
    },
    /// Print the effective settings and config, credentials redacted
    Config {
        /// Recognition config document
        #[arg(short, long)]
        config: Option<PathBuf>,
    },
    /// Check whether a local server is running
    Status,
}

#[tokio::main]
async fn main() -> Result<()> {
    let settings = ServerSettings::from_env();
    let cli = Cli::parse();

    init_logger(&settings.log_dir, &settings.log_level);

    match cli.command {
        Commands::Serve { port, config } => {
            let settings = ServerSettings {
                port: port.unwrap_or(settings.port),
                config_path: config.unwrap_or(settings.config_path),
                ..settings
            };
            run_server(settings).await?;
        }
        Commands::Scan {
            image,
            concurrency,
            thinking,
            format,
            config,
        } => {
            let args = ScanArgs {
                image,
                concurrency,
                thinking,
                format,
                config_path: config.unwrap_or_else(|| settings.config_path.clone()),
            };
            if !scan_cmd::run(&settings, args).await? {
                std::process::exit(1);
            }
        }
        Commands::Config { config } => {
            let settings = ServerSettings {
                config_path: config.unwrap_or(settings.config_path),
                ..settings
            };
            print_config(&settings).await?;
        }
        Commands::Status => {
            if !status_cmd::run(&settings).await? {
                std::process::exit(1);
            }
        }
    }

    Ok(())
}

#[instrument(skip_all, fields(port = settings.port, bind = %settings.bind_address))]
async fn run_server(settings: ServerSettings) -> Result<()> {
    info!(
        config = %settings.config_path.display(),
        public_dir = %settings.public_dir.display(),
        "Starting listscan gateway"
    );

    let config = load_and_prepare(&settings.config_path).await;
    let model = settings.vision_model();
    match &model {
        Some(_) => info!(api_base = %settings.api_base, "Vision model client ready"),
        None => warn!("DASHSCOPE_API_KEY is not set; recognition requests will fail with NO_API_KEY"),
    }

    let state = GatewayState::new(config, model)
        .with_access_token(settings.access_token.clone())
        .with_public_dir(&settings.public_dir);

    if let Err(e) = ConfigReloader::new(&settings.config_path, state.config.clone()).watch() {
        warn!(error = %format!("{e:#}"), "Config hot reload disabled");
    }

    start_server(settings.socket_addr()?, state).await
}

async fn print_config(settings: &ServerSettings) -> Result<()> {
    let config = load_and_prepare(&settings.config_path).await;
    let snapshot = serde_json::json!({
        "settings": settings,
        "config": config,
    });
    println!("{}", serde_json::to_string_pretty(&redact(&snapshot))?);

    let masked = collect_redacted_paths(&snapshot);
    if !masked.is_empty() {
        eprintln!("redacted: {}", masked.join(", "));
    }
    Ok(())
}
