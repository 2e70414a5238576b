use clap::{Parser, Subcommand};
use clicklink::config::{Config, LogFormat};
use clicklink::server;
use tracing::Level;
use tracing_subscriber::EnvFilter;

/// clicklink - A URL shortener with click analytics
#[derive(Parser, Debug)]
#[command(name = "clicklink")]
#[command(version = "1.0.0")]
#[command(about = "A URL shortener with expiring links and click analytics", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Start the web server
    Server {
        /// Host to bind to (overrides SERVER_HOST env var)
        #[arg(long)]
        host: Option<String>,

        /// Port to bind to (overrides SERVER_PORT env var)
        #[arg(long)]
        port: Option<u16>,
    },
}

fn init_tracing(format: LogFormat) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(Level::INFO.to_string()));

    match format {
        LogFormat::Pretty => tracing_subscriber::fmt().with_env_filter(filter).init(),
        LogFormat::Json => tracing_subscriber::fmt()
            .json()
            .with_env_filter(filter)
            .init(),
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // Load configuration; the log format is part of it
    let mut config = Config::from_env()?;
    init_tracing(config.logging.format);

    match cli.command {
        Commands::Server { host, port } => {
            let overridden = host.is_some() || port.is_some();
            if let Some(host) = host {
                config.server.host = host;
            }
            if let Some(port) = port {
                config.server.port = port;
            }

            // Re-compute base_url after CLI overrides unless it was pinned
            if overridden && std::env::var_os("BASE_URL").is_none() {
                config.url.base_url =
                    format!("http://{}:{}", config.server.host, config.server.port);
            }

            server::run_server(config).await?;
        }
    }

    Ok(())
}
