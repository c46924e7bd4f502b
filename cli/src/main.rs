//! Google Threat Intelligence expansion CLI
//!
//! Runs the expansion module outside of misp-modules.
//!
//! # Usage
//!
//! ```bash
//! gti-expansion query --type sha256 --value ed01ebfbc9eb5bbea545af4d01bf5f1071661840480439c6e5babe8e080e41aa
//! gti-expansion query --type url --value http://47.21.48.182:60813/Mozi.a --format table
//! gti-expansion run -f request.json
//! gti-expansion config set api_key <key>
//! ```

use clap::{Parser, Subcommand};
use colored::Colorize;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

mod commands;
mod config;
mod output;

#[derive(Parser)]
#[command(name = "gti-expansion")]
#[command(author = "Google Threat Intelligence team")]
#[command(version)]
#[command(about = "Enrich observables with Google Threat Intelligence", long_about = None)]
pub struct Cli {
    /// API endpoint URL
    #[arg(long, env = "GTI_API_URL", default_value = gti_expansion::client::DEFAULT_API_URL)]
    api_url: String,

    /// API key for authentication
    #[arg(long, env = "GTI_API_KEY", hide_env_values = true)]
    api_key: Option<String>,

    /// Results limit forwarded as event_limit
    #[arg(long)]
    event_limit: Option<u32>,

    /// Proxy host, e.g. http://proxy.local
    #[arg(long, env = "GTI_PROXY_HOST")]
    proxy_host: Option<String>,

    #[arg(long, env = "GTI_PROXY_PORT")]
    proxy_port: Option<u16>,

    #[arg(long, env = "GTI_PROXY_USERNAME")]
    proxy_username: Option<String>,

    #[arg(long, env = "GTI_PROXY_PASSWORD", hide_env_values = true)]
    proxy_password: Option<String>,

    /// Request timeout in seconds
    #[arg(long, default_value_t = 60)]
    timeout: u64,

    /// Output format
    #[arg(long, short, default_value = "json")]
    format: output::OutputFormat,

    /// Profile name from config file
    #[arg(long, short)]
    profile: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Enrich a single observable
    Query {
        /// MISP attribute type (domain, hostname, ip-src, ip-dst, md5, sha1, sha256, url)
        #[arg(long = "type", short = 't')]
        attribute_type: String,
        /// Observable value
        #[arg(long, short)]
        value: String,
    },
    /// Run a raw module request read from a file ("-" for stdin)
    Run {
        #[arg(short, long, default_value = "-")]
        file: String,
    },
    /// Print supported input types
    Introspection,
    /// Print module metadata
    Info,
    /// Configure CLI
    Config {
        #[command(subcommand)]
        action: ConfigCommands,
    },
}

#[derive(Subcommand)]
pub enum ConfigCommands {
    /// Set configuration value
    Set { key: String, value: String },
    /// Get configuration value
    Get { key: String },
    /// List all configuration
    List,
    /// Initialize configuration
    Init,
}

#[tokio::main]
async fn main() {
    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::new(
            std::env::var("RUST_LOG").unwrap_or_else(|_| "info".into()),
        ))
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let cli = Cli::parse();

    let result = match &cli.command {
        Commands::Query { attribute_type, value } => {
            commands::query::handle_query(&cli, attribute_type, value).await
        }
        Commands::Run { file } => commands::query::handle_run(&cli, file).await,
        Commands::Introspection => {
            cli.format.print(&gti_expansion::introspection());
            Ok(())
        }
        Commands::Info => {
            cli.format.print(&gti_expansion::version());
            Ok(())
        }
        Commands::Config { action } => commands::config::handle(action, cli.profile.as_deref()),
    };

    if let Err(e) = result {
        eprintln!("{} {:#}", "Error:".red().bold(), e);
        std::process::exit(1);
    }
}
