//! couchctl: a single-client TCP remote control for the desktop
//!
//! One peer connects and sends newline-delimited text commands:
//! - `open <service>` / `close <service>` for facebook, youtube, github —
//!   launches or kills an isolated kiosk-mode browser session
//! - `vol+` / `vol-` — system volume via media keys
//! - `exit` — ends the session and the process
//!
//! Each message gets a short acknowledgement. Exactly one client is
//! accepted per process lifetime; configuration via CLI arguments or
//! TOML file.

mod command;
mod config;
mod effects;
mod endpoint;
mod server;

use config::Config;
use endpoint::Endpoint;
use server::Server;
use tracing::info;
use tracing_subscriber::EnvFilter;

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Load configuration
    let config = Config::load()?;

    // Initialize logging
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&config.log_level));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .init();

    info!(
        bind = %config.bind,
        port = config.port,
        browser = %config.browser,
        profile_base = %config.profile_base.display(),
        "Starting couchctl server"
    );

    // Socket setup and accept failures are fatal (exit code 1); a finished
    // session loop is a clean shutdown (exit code 0).
    let endpoint = Endpoint::bind(&config)?;
    info!(address = %endpoint.local_addr()?, "Server listening");

    let server = Server::new(&config);
    server.run(endpoint).await?;

    Ok(())
}
