//! Server host holding the services behind the HTTP exposure
//!
//! The host is transport-agnostic: it owns the configured services and is
//! shared by every handler.

use crate::config::ServiceConfig;
use crate::core::service::{
    AssetFetcher, BankAccountService, BlobStore, EmailSender, OrderService, ShopService,
};
use crate::email::InvoiceMailer;
use crate::invoice::InvoiceService;
use crate::orders::OrderWorkflow;
use anyhow::Result;
use std::sync::Arc;

/// Ports the host is assembled from
pub struct HostComponents {
    pub orders: Arc<dyn OrderService>,
    pub bank_accounts: Arc<dyn BankAccountService>,
    pub shops: Arc<dyn ShopService>,
    pub blobs: Arc<dyn BlobStore>,
    pub assets: Arc<dyn AssetFetcher>,
    pub email_sender: Arc<dyn EmailSender>,
}

/// Host context containing all service state
pub struct ServiceHost {
    /// Effective configuration
    pub config: Arc<ServiceConfig>,

    /// Invoice generation
    pub invoices: InvoiceService,

    /// Invoice delivery by email
    pub mailer: InvoiceMailer,

    /// Order workflow updates and checkout payment details
    pub orders: OrderWorkflow,
}

impl ServiceHost {
    /// Build the host from builder components
    pub fn from_builder_components(components: HostComponents, config: ServiceConfig) -> Result<Self> {
        let invoices = InvoiceService::new(
            components.orders.clone(),
            components.bank_accounts.clone(),
            components.shops.clone(),
            components.blobs.clone(),
            components.assets,
            config.invoice.clone(),
        );

        let mailer = InvoiceMailer::new(
            components.orders.clone(),
            components.shops.clone(),
            components.blobs,
            components.email_sender,
            config.email.clone(),
            config.invoice.default_language,
        )?;

        let orders = OrderWorkflow::new(
            components.orders,
            components.bank_accounts,
            components.shops,
        );

        Ok(Self {
            config: Arc::new(config),
            invoices,
            mailer,
            orders,
        })
    }
}
