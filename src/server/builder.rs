//! ServerBuilder for fluent API to build HTTP servers

use super::exposure::RestExposure;
use super::host::{HostComponents, ServiceHost};
use crate::config::ServiceConfig;
use crate::core::service::{
    AssetFetcher, BankAccountService, BlobStore, EmailSender, OrderService, ShopService,
};
use crate::storage::{
    InMemoryBankAccountService, InMemoryBlobStore, InMemoryOrderService, InMemoryShopService,
    RecordingEmailSender, StaticAssetFetcher,
};
use anyhow::{Result, anyhow};
use axum::Router;
use std::sync::Arc;
use tokio::net::TcpListener;

/// Builder for the invoice HTTP server
///
/// # Example
///
/// ```ignore
/// let backend = RestBackend::new(&config.backend)?;
/// ServerBuilder::new()
///     .with_config(config.clone())
///     .with_backend(backend)
///     .with_blob_store(ObjectStorage::new(&config.backend)?)
///     .with_asset_fetcher(HttpAssetFetcher::new()?)
///     .with_email_sender(HttpEmailSender::new(&config.email)?)
///     .serve(&config.server.bind)
///     .await?;
/// ```
pub struct ServerBuilder {
    config: ServiceConfig,
    orders: Option<Arc<dyn OrderService>>,
    bank_accounts: Option<Arc<dyn BankAccountService>>,
    shops: Option<Arc<dyn ShopService>>,
    blobs: Option<Arc<dyn BlobStore>>,
    assets: Option<Arc<dyn AssetFetcher>>,
    email_sender: Option<Arc<dyn EmailSender>>,
    custom_routes: Vec<Router>,
}

impl ServerBuilder {
    /// Create a new ServerBuilder
    pub fn new() -> Self {
        Self {
            config: ServiceConfig::default(),
            orders: None,
            bank_accounts: None,
            shops: None,
            blobs: None,
            assets: None,
            email_sender: None,
            custom_routes: Vec::new(),
        }
    }

    pub fn with_config(mut self, config: ServiceConfig) -> Self {
        self.config = config;
        self
    }

    pub fn with_order_service(mut self, service: impl OrderService + 'static) -> Self {
        self.orders = Some(Arc::new(service));
        self
    }

    pub fn with_bank_account_service(mut self, service: impl BankAccountService + 'static) -> Self {
        self.bank_accounts = Some(Arc::new(service));
        self
    }

    pub fn with_shop_service(mut self, service: impl ShopService + 'static) -> Self {
        self.shops = Some(Arc::new(service));
        self
    }

    /// Use one backend for all three tables
    pub fn with_backend<B>(mut self, backend: B) -> Self
    where
        B: OrderService + BankAccountService + ShopService + 'static,
    {
        let backend = Arc::new(backend);
        self.orders = Some(backend.clone());
        self.bank_accounts = Some(backend.clone());
        self.shops = Some(backend);
        self
    }

    pub fn with_blob_store(mut self, store: impl BlobStore + 'static) -> Self {
        self.blobs = Some(Arc::new(store));
        self
    }

    pub fn with_asset_fetcher(mut self, fetcher: impl AssetFetcher + 'static) -> Self {
        self.assets = Some(Arc::new(fetcher));
        self
    }

    pub fn with_email_sender(mut self, sender: impl EmailSender + 'static) -> Self {
        self.email_sender = Some(Arc::new(sender));
        self
    }

    /// Fill every port that is still unset with its in-memory implementation
    pub fn with_in_memory_defaults(mut self) -> Self {
        if self.orders.is_none() {
            self.orders = Some(Arc::new(InMemoryOrderService::new()));
        }
        if self.bank_accounts.is_none() {
            self.bank_accounts = Some(Arc::new(InMemoryBankAccountService::new()));
        }
        if self.shops.is_none() {
            self.shops = Some(Arc::new(InMemoryShopService::new()));
        }
        if self.blobs.is_none() {
            self.blobs = Some(Arc::new(InMemoryBlobStore::default()));
        }
        if self.assets.is_none() {
            self.assets = Some(Arc::new(StaticAssetFetcher::new()));
        }
        if self.email_sender.is_none() {
            self.email_sender = Some(Arc::new(RecordingEmailSender::new()));
        }
        self
    }

    /// Add custom routes to the server
    pub fn with_custom_routes(mut self, routes: Router) -> Self {
        self.custom_routes.push(routes);
        self
    }

    /// Build the transport-agnostic host
    pub fn build_host(mut self) -> Result<ServiceHost> {
        let components = HostComponents {
            orders: self
                .orders
                .take()
                .ok_or_else(|| anyhow!("OrderService is required. Call .with_order_service()"))?,
            bank_accounts: self.bank_accounts.take().ok_or_else(|| {
                anyhow!("BankAccountService is required. Call .with_bank_account_service()")
            })?,
            shops: self
                .shops
                .take()
                .ok_or_else(|| anyhow!("ShopService is required. Call .with_shop_service()"))?,
            blobs: self
                .blobs
                .take()
                .ok_or_else(|| anyhow!("BlobStore is required. Call .with_blob_store()"))?,
            assets: self
                .assets
                .take()
                .ok_or_else(|| anyhow!("AssetFetcher is required. Call .with_asset_fetcher()"))?,
            email_sender: self
                .email_sender
                .take()
                .ok_or_else(|| anyhow!("EmailSender is required. Call .with_email_sender()"))?,
        };

        ServiceHost::from_builder_components(components, self.config)
    }

    /// Build the final REST router
    pub fn build(mut self) -> Result<Router> {
        let custom_routes = std::mem::take(&mut self.custom_routes);
        let host = Arc::new(self.build_host()?);
        RestExposure::build_router(host, custom_routes)
    }

    /// Serve the application with graceful shutdown
    ///
    /// Handles SIGTERM and SIGINT (Ctrl+C).
    pub async fn serve(self, addr: &str) -> Result<()> {
        let app = self.build()?;
        let listener = TcpListener::bind(addr).await?;

        tracing::info!("Server listening on {}", addr);

        axum::serve(listener, app)
            .with_graceful_shutdown(shutdown_signal())
            .await?;

        tracing::info!("Server shutdown complete");
        Ok(())
    }
}

impl Default for ServerBuilder {
    fn default() -> Self {
        Self::new()
    }
}

/// Wait for shutdown signal (SIGTERM or Ctrl+C)
async fn shutdown_signal() {
    use tokio::signal;

    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            tracing::error!("failed to install Ctrl+C handler: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut sigterm) => {
                sigterm.recv().await;
            }
            Err(e) => {
                tracing::error!("failed to install SIGTERM handler: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            tracing::info!("Received Ctrl+C signal, initiating graceful shutdown...");
        },
        _ = terminate => {
            tracing::info!("Received SIGTERM signal, initiating graceful shutdown...");
        },
    }
}
