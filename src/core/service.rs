//! Service traits for the backend the invoice routine talks to
//!
//! Every trait is a port onto the hosted backend: table access, object
//! storage, the transactional email API and plain HTTP fetches. The service
//! layer is agnostic to the implementation behind them.

use crate::core::model::{BankAccount, Order, OrderPatch, Shop};
use anyhow::Result;
use async_trait::async_trait;
use uuid::Uuid;

/// Access to the `orders` table
#[async_trait]
pub trait OrderService: Send + Sync {
    /// Get an order by ID
    async fn get(&self, id: &Uuid) -> Result<Option<Order>>;

    /// Write the set columns of `patch` and return the updated row
    ///
    /// Columns the patch leaves unset keep whatever value is stored, even
    /// if they changed since the caller loaded the order.
    async fn patch(&self, id: &Uuid, patch: OrderPatch) -> Result<Order>;
}

/// Access to the `bank_accounts` table
#[async_trait]
pub trait BankAccountService: Send + Sync {
    /// Get a bank account by ID
    async fn get(&self, id: &Uuid) -> Result<Option<BankAccount>>;

    /// Temporary accounts created for the given order, newest first
    async fn find_temporary_for_order(&self, order_id: &Uuid) -> Result<Vec<BankAccount>>;

    /// Insert a new bank account
    async fn create(&self, account: BankAccount) -> Result<BankAccount>;
}

/// Access to the `shops` table
#[async_trait]
pub trait ShopService: Send + Sync {
    /// Get a shop by ID
    async fn get(&self, id: &Uuid) -> Result<Option<Shop>>;
}

/// Object storage for generated documents
#[async_trait]
pub trait BlobStore: Send + Sync {
    /// Upload (or overwrite) an object and return its public URL
    async fn put(&self, key: &str, bytes: Vec<u8>, content_type: &str) -> Result<String>;

    /// Download an object by its public URL
    ///
    /// Returns `None` when nothing is stored under that URL.
    async fn fetch(&self, url: &str) -> Result<Option<Vec<u8>>>;
}

/// A file attached to an outbound email
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EmailAttachment {
    pub filename: String,
    /// Base64 encoded content
    pub content: String,
}

/// An outbound transactional email
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EmailMessage {
    pub from: String,
    pub to: Vec<String>,
    pub reply_to: Option<String>,
    pub subject: String,
    pub html: String,
    pub attachments: Vec<EmailAttachment>,
}

/// Transactional email API
#[async_trait]
pub trait EmailSender: Send + Sync {
    /// Send a message and return the provider's message ID
    async fn send(&self, message: EmailMessage) -> Result<String>;
}

/// Fetches remote assets such as shop logos
#[async_trait]
pub trait AssetFetcher: Send + Sync {
    async fn fetch(&self, url: &str) -> Result<Vec<u8>>;
}
