//! Binary entry point for vigil.
//!
//! Loads configuration from the environment (and a `.env` file when
//! present), wires the vault, store, sink, and relay together, and runs
//! the webhook server.

#![deny(clippy::all)]
#![warn(clippy::pedantic)]
#![warn(missing_docs)]
// Allow print_stderr in main binary for CLI output
#![allow(clippy::print_stderr)]
#![allow(clippy::print_stdout)]
// Allow multiple crate versions from transitive dependencies
#![allow(clippy::multiple_crate_versions)]

use clap::{Parser, Subcommand};
use secrecy::ExposeSecret;
use std::process::ExitCode;
use std::sync::Arc;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use vigil::config::VigilConfig;
use vigil::security::CredentialVault;
use vigil::server::{self, AppState};
use vigil::sink::CliqSink;
use vigil::store::SqliteConfigStore;
use vigil::RelayService;

/// Vigil - DevOps webhook-to-chat alert relay for Zoho Cliq.
#[derive(Parser)]
#[command(name = "vigil")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Enable verbose output.
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

/// Available commands.
#[derive(Subcommand)]
enum Commands {
    /// Run the webhook server.
    Serve {
        /// Listen address; overrides `SERVER_HOST`.
        #[arg(long)]
        host: Option<std::net::IpAddr>,

        /// Listen port; overrides `SERVER_PORT`.
        #[arg(short, long)]
        port: Option<u16>,
    },

    /// Generate a fresh credential encryption key for `ENCRYPTION_KEY`.
    GenerateKey,
}

/// Main entry point.
fn main() -> ExitCode {
    let cli = Cli::parse();

    // A missing .env file is fine; the environment may be set directly.
    dotenvy::dotenv().ok();

    init_tracing(cli.verbose);

    match run_command(&cli.command) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("Error: {e}");
            ExitCode::FAILURE
        },
    }
}

fn init_tracing(verbose: bool) {
    let default_filter = if verbose { "vigil=debug,info" } else { "vigil=info,warn" };
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(default_filter));

    tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer().with_target(false))
        .init();
}

/// Runs the selected command.
fn run_command(command: &Commands) -> vigil::Result<()> {
    match command {
        Commands::Serve { host, port } => cmd_serve(*host, *port),
        Commands::GenerateKey => {
            println!("{}", CredentialVault::generate_key_b64());
            Ok(())
        },
    }
}

fn cmd_serve(host: Option<std::net::IpAddr>, port: Option<u16>) -> vigil::Result<()> {
    let config = VigilConfig::from_env()?;

    let vault = Arc::new(CredentialVault::from_key_or_generate(
        config
            .encryption_key
            .as_ref()
            .map(ExposeSecret::expose_secret),
    )?);

    let store = Arc::new(SqliteConfigStore::open(&config.database_path, vault)?);
    let sink = Arc::new(CliqSink::new(config.cliq_webhook_url.clone()));
    let relay = Arc::new(RelayService::new(store, sink));

    if config.github_webhook_secret.is_none() {
        tracing::warn!(
            "GITHUB_WEBHOOK_SECRET not set; GitHub signatures will not be verified"
        );
    }

    let state = AppState {
        relay,
        github_secret: config.github_webhook_secret.clone(),
        hardened: config.is_hardened(),
    };

    let addr = std::net::SocketAddr::new(
        host.unwrap_or(config.host),
        port.unwrap_or(config.port),
    );
    server::run(state, addr)
}
