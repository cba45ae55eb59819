use anyhow::Result;
use invoicer::config::ServiceConfig;
use invoicer::email::HttpEmailSender;
use invoicer::server::ServerBuilder;
use invoicer::storage::{HttpAssetFetcher, ObjectStorage, RestBackend};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let path = std::env::var("INVOICER_CONFIG")
        .ok()
        .or_else(|| std::env::args().nth(1));
    let config = match path {
        Some(path) => {
            tracing::info!("Loading configuration from {}", path);
            ServiceConfig::from_yaml_file(&path)?
        }
        None => ServiceConfig::default(),
    }
    .with_env_overrides()?;

    let mut builder = ServerBuilder::new()
        .with_config(config.clone())
        .with_asset_fetcher(HttpAssetFetcher::new()?);

    if config.backend.is_remote() {
        tracing::info!("Using hosted backend at {}", config.backend.url);
        builder = builder
            .with_backend(RestBackend::new(&config.backend)?)
            .with_blob_store(ObjectStorage::new(&config.backend)?);
    } else {
        tracing::warn!("No backend configured, orders and invoices are kept in memory");
    }

    if config.email.api_key.trim().is_empty() {
        tracing::warn!("No email API key configured, invoice emails are only recorded");
    } else {
        builder = builder.with_email_sender(HttpEmailSender::new(&config.email)?);
    }

    builder
        .with_in_memory_defaults()
        .serve(&config.server.bind)
        .await
}
