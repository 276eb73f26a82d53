use std::sync::Arc;

use mailin_embedded::{Server, SslConfig};

use signal_gateway::classify::CHAT_DOMAIN;
use signal_gateway::config::GatewayConfig;
use signal_gateway::delivery::{SignalClient, SmtpRelay};
use signal_gateway::gateway::GatewayHandler;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Install rustls crypto provider before any TLS usage
    rustls::crypto::ring::default_provider()
        .install_default()
        .expect("Failed to install rustls crypto provider");

    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .with_target(false)
        .init();

    // Configuration is all-or-nothing: bail before binding anything.
    let config = GatewayConfig::from_env().unwrap_or_else(|e| {
        eprintln!("Error: {e}");
        eprintln!("  required: SIGNAL_REST_URL SENDER_NUMBER SMTP_HOST SMTP_USER SMTP_PASSWORD");
        std::process::exit(1);
    });

    eprintln!("signal-gateway v{}", env!("CARGO_PKG_VERSION"));
    eprintln!("   Listening:  {}", config.listen_addr);
    eprintln!("   Signal API: {}", config.signal_rest_url);
    eprintln!("   Relay:      {}:{}", config.smtp_host, config.smtp_port);

    let chat = Arc::new(SignalClient::new(&config));
    let mail = Arc::new(SmtpRelay::new(&config));
    let handler = GatewayHandler::new(chat, mail, tokio::runtime::Handle::current());

    let listen_addr = config.listen_addr.clone();
    tokio::task::spawn_blocking(move || -> anyhow::Result<()> {
        let mut server = Server::new(handler);
        server.with_name(CHAT_DOMAIN);
        server
            .with_ssl(SslConfig::None)
            .map_err(|e| anyhow::anyhow!("SSL config error: {e}"))?;
        server
            .with_addr(&listen_addr)
            .map_err(|e| anyhow::anyhow!("Listener config error: {e}"))?;

        tracing::info!(addr = %listen_addr, "SMTP listener started");
        server
            .serve()
            .map_err(|e| anyhow::anyhow!("Server error: {e}"))?;
        Ok(())
    })
    .await??;

    Ok(())
}
