//! Person Service
//!
//! Runs the person service until interrupted.

use anyhow::{Context, Result};
use person_service::{logging, PersonServer, ServerConfig};

#[tokio::main]
async fn main() -> Result<()> {
    let config = ServerConfig::from_env().context("Failed to load configuration")?;

    // Initialize structured logging with tracing
    logging::init_tracing(config.log_format);

    let server = PersonServer::new(config);
    server.start().await?;

    Ok(())
}
