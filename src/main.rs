//! skiffd - a small password-gated IRC chat server.

use skiffd::config::Config;
use skiffd::server::Server;
use tracing::info;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_target(true)
        .init();

    let config = match Config::from_args(std::env::args().skip(1)) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("{e}");
            eprintln!("Usage: skiffd <port> <password>");
            std::process::exit(2);
        }
    };

    info!(port = config.port, "starting skiffd");

    let server = Server::bind(&config).await?;
    server.run().await;

    Ok(())
}
