//! One-shot push notification sender.
//!
//! Thin wrapper over the library: connect, send one message, stop, report
//! the termination reason.

use std::time::Duration;

use anyhow::Result;
use camino::Utf8PathBuf;
use clap::Parser;
use tracing_subscriber::EnvFilter;

use apnc::{
    config::ConnectionConfig,
    connection,
    message::NotificationMessage,
    payload::Alert,
    token::DeviceToken,
};

#[derive(Parser)]
#[command(author, version, about)]
struct Cli {
    /// Gateway host.
    #[arg(long, default_value = "gateway.push.apple.com")]
    host: String,

    /// Gateway port.
    #[arg(long, default_value_t = 2195)]
    port: u16,

    /// PEM file holding the client certificate and private key.
    #[arg(long)]
    cert: Utf8PathBuf,

    /// Handshake timeout in seconds.
    #[arg(long, default_value_t = 30)]
    timeout: u64,

    /// Device token as 64 hex characters.
    token: DeviceToken,

    /// Alert text.
    #[arg(long)]
    alert: Option<String>,

    /// Badge count.
    #[arg(long)]
    badge: Option<i64>,

    /// Sound name.
    #[arg(long)]
    sound: Option<String>,
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();
    let cli = Cli::parse();

    let config = ConnectionConfig::new(
        cli.host,
        cli.port,
        cli.cert,
        Duration::from_secs(cli.timeout),
    )?;
    let handle = connection::connect(&config).await?;

    let mut message = NotificationMessage::new(cli.token);
    message.alert = cli.alert.map(Alert::Text);
    message.badge = cli.badge;
    message.sound = cli.sound;

    handle.send(message).await?;
    handle.stop().await?;
    let reason = handle.join().await;
    tracing::info!(%reason, "session ended");
    Ok(())
}
