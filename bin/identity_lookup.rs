//! # Identity Lookup
//!
//! One-shot lookup of an address: RNS identity and stRIF staking analytics,
//! printed as the JSON envelopes served to front-ends.
//!
//! ## Usage
//!
//! ```bash
//! cargo run --bin identity_lookup -- 0x5db91e24bd32059584bbdb831a901f1199f3d459
//! cargo run --bin identity_lookup -- <ADDRESS> --identity-only --config ./Config.toml
//! ```

use anyhow::Result;
use clap::Parser;
use rootstock_identity_sdk::{IdentityAndStakingService, Settings};
use serde_json::json;

#[derive(Debug, Parser)]
#[command(name = "identity_lookup", about = "Resolve a Rootstock address to its RNS name and staking history")]
struct Cli {
    /// Address to look up (0x + 40 hex digits)
    address: String,

    /// Configuration file (optional; defaults apply when missing)
    #[arg(long, default_value = "Config.toml")]
    config: String,

    /// Only resolve the RNS identity
    #[arg(long, conflicts_with = "staking_only")]
    identity_only: bool,

    /// Only compute staking analytics
    #[arg(long)]
    staking_only: bool,

    /// Expose Prometheus metrics on this address while running
    #[cfg(feature = "observability")]
    #[arg(long)]
    metrics_addr: Option<std::net::SocketAddr>,
}

#[tokio::main]
async fn main() -> Result<()> {
    // Load environment variables from .env file
    dotenv::dotenv().ok();

    // With observability on, tracing-subscriber also captures `log` records.
    #[cfg(not(feature = "observability"))]
    env_logger::init();
    #[cfg(feature = "observability")]
    tracing_subscriber::fmt().json().init();

    let cli = Cli::parse();

    #[cfg(feature = "observability")]
    {
        if let Some(addr) = cli.metrics_addr {
            metrics_exporter_prometheus::PrometheusBuilder::new()
                .with_http_listener(addr)
                .install()?;
        }
    }
    rootstock_identity_sdk::metrics::describe_metrics();

    let settings = Settings::from_file(&cli.config)?;
    let service = IdentityAndStakingService::from_settings(&settings)?;

    let output = if cli.identity_only {
        serde_json::to_value(service.identity_response(&cli.address).await)?
    } else if cli.staking_only {
        serde_json::to_value(service.staking_response(&cli.address).await)?
    } else {
        let (identity, staking) = tokio::join!(
            service.identity_response(&cli.address),
            service.staking_response(&cli.address)
        );
        json!({ "identity": identity, "staking": staking })
    };

    println!("{}", serde_json::to_string_pretty(&output)?);
    Ok(())
}
