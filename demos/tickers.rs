//! Subscribes to two ticker topics and logs every update.
//!
//! Run with: `cargo run --example tickers`
//! Set `RUST_LOG=wsfeed=debug` for stage-by-stage connection logs.

use tracing::info;
use tracing_subscriber::EnvFilter;
use wsfeed::{Endpoint, Session, SessionConfig, Subscribe};

fn init_logging() {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("wsfeed=info,tickers=info"));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .init();
}

#[tokio::main]
async fn main() -> wsfeed::Result<()> {
    init_logging();

    let messages = [
        Subscribe::new("market.btcusdt.detail", "id1").to_text()?,
        Subscribe::new("market.ethusdt.detail", "id2").to_text()?,
    ];

    let mut session = Session::wss(
        Endpoint::new("api.huobi.br.com", "https"),
        messages,
        wsfeed::tls::webpki_client_config(),
        SessionConfig::new(),
    )?
    .on_message(|text| info!(payload = text, "ticker"));

    let shutdown = session.shutdown_token();
    tokio::spawn(async move {
        tokio::signal::ctrl_c().await.ok();
        info!("Ctrl+C received, shutting down");
        shutdown.cancel();
    });

    session.run().await
}
