use std::sync::Arc;

use anyhow::Context;
use clap::Parser;
use grist_geocoder::batch::{BatchResolver, GristSink};
use grist_geocoder::config::Config;
use grist_geocoder::geocoding::ProviderChain;
use grist_geocoder::logging;
use grist_geocoder::server::{self, AppState};
use tracing::{debug, info};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let dotenv = dotenvy::dotenv();
    let config = Config::parse();
    logging::init(&config)?;

    match dotenv {
        Ok(path) => debug!("Loaded environment from {}", path.display()),
        Err(e) if e.not_found() => debug!("No .env file found"),
        Err(e) => return Err(e).context("failed to read .env file"),
    }

    config.validate().context("invalid configuration")?;

    let agent = config.http_agent();
    let chain = ProviderChain::from_config(&config, &agent);
    info!(
        "Geocoding chain: {}",
        chain
            .provider_ids()
            .iter()
            .map(ToString::to_string)
            .collect::<Vec<_>>()
            .join(" → ")
    );

    let sink = GristSink::from_config(&config, agent);
    info!("Writing coordinates to {}", sink.url());

    let resolver = BatchResolver::new(Arc::new(chain), Arc::new(sink));
    let state = AppState::new(config.access_token.clone(), resolver);

    server::start(&config.listen_addr(), state).await
}
