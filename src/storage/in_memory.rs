//! In-memory implementations of the backend ports for testing and development

use crate::core::model::{BankAccount, Order, OrderPatch, Shop};
use crate::core::service::{
    AssetFetcher, BankAccountService, BlobStore, EmailMessage, EmailSender, OrderService,
    ShopService,
};
use anyhow::{Result, anyhow};
use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, RwLock};
use uuid::Uuid;

/// In-memory `orders` table
///
/// Uses RwLock for thread-safe access.
#[derive(Clone)]
pub struct InMemoryOrderService {
    orders: Arc<RwLock<HashMap<Uuid, Order>>>,
}

impl InMemoryOrderService {
    pub fn new() -> Self {
        Self {
            orders: Arc::new(RwLock::new(HashMap::new())),
        }
    }

    /// Seed an order
    pub fn insert(&self, order: Order) {
        let mut orders = self.orders.write().unwrap_or_else(|e| e.into_inner());
        orders.insert(order.id, order);
    }
}

impl Default for InMemoryOrderService {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl OrderService for InMemoryOrderService {
    async fn get(&self, id: &Uuid) -> Result<Option<Order>> {
        let orders = self
            .orders
            .read()
            .map_err(|e| anyhow!("Failed to acquire read lock: {}", e))?;

        Ok(orders.get(id).cloned())
    }

    async fn patch(&self, id: &Uuid, patch: OrderPatch) -> Result<Order> {
        let mut orders = self
            .orders
            .write()
            .map_err(|e| anyhow!("Failed to acquire write lock: {}", e))?;

        let order = orders
            .get_mut(id)
            .ok_or_else(|| anyhow!("Order not found: {}", id))?;

        patch.apply_to(order);

        Ok(order.clone())
    }
}

/// In-memory `bank_accounts` table
#[derive(Clone)]
pub struct InMemoryBankAccountService {
    accounts: Arc<RwLock<HashMap<Uuid, BankAccount>>>,
}

impl InMemoryBankAccountService {
    pub fn new() -> Self {
        Self {
            accounts: Arc::new(RwLock::new(HashMap::new())),
        }
    }
}

impl Default for InMemoryBankAccountService {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl BankAccountService for InMemoryBankAccountService {
    async fn get(&self, id: &Uuid) -> Result<Option<BankAccount>> {
        let accounts = self
            .accounts
            .read()
            .map_err(|e| anyhow!("Failed to acquire read lock: {}", e))?;

        Ok(accounts.get(id).cloned())
    }

    async fn find_temporary_for_order(&self, order_id: &Uuid) -> Result<Vec<BankAccount>> {
        let accounts = self
            .accounts
            .read()
            .map_err(|e| anyhow!("Failed to acquire read lock: {}", e))?;

        let mut found: Vec<BankAccount> = accounts
            .values()
            .filter(|a| a.is_temporary && a.used_for_order_id.as_ref() == Some(order_id))
            .cloned()
            .collect();
        found.sort_by(|a, b| b.created_at.cmp(&a.created_at));

        Ok(found)
    }

    async fn create(&self, account: BankAccount) -> Result<BankAccount> {
        let mut accounts = self
            .accounts
            .write()
            .map_err(|e| anyhow!("Failed to acquire write lock: {}", e))?;

        accounts.insert(account.id, account.clone());

        Ok(account)
    }
}

/// In-memory `shops` table
#[derive(Clone)]
pub struct InMemoryShopService {
    shops: Arc<RwLock<HashMap<Uuid, Shop>>>,
}

impl InMemoryShopService {
    pub fn new() -> Self {
        Self {
            shops: Arc::new(RwLock::new(HashMap::new())),
        }
    }

    /// Seed a shop
    pub fn insert(&self, shop: Shop) {
        let mut shops = self.shops.write().unwrap_or_else(|e| e.into_inner());
        shops.insert(shop.id, shop);
    }
}

impl Default for InMemoryShopService {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl ShopService for InMemoryShopService {
    async fn get(&self, id: &Uuid) -> Result<Option<Shop>> {
        let shops = self
            .shops
            .read()
            .map_err(|e| anyhow!("Failed to acquire read lock: {}", e))?;

        Ok(shops.get(id).cloned())
    }
}

#[derive(Debug, Clone)]
struct StoredObject {
    bytes: Vec<u8>,
    content_type: String,
}

/// In-memory object storage
///
/// Objects are addressed as `<base_url>/<key>`; a second `put` with the
/// same key overwrites the first.
#[derive(Clone)]
pub struct InMemoryBlobStore {
    base_url: String,
    objects: Arc<RwLock<HashMap<String, StoredObject>>>,
    fail_uploads: Arc<AtomicBool>,
}

impl InMemoryBlobStore {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into().trim_end_matches('/').to_string(),
            objects: Arc::new(RwLock::new(HashMap::new())),
            fail_uploads: Arc::new(AtomicBool::new(false)),
        }
    }

    /// Make every subsequent upload fail
    pub fn fail_uploads(&self, fail: bool) {
        self.fail_uploads.store(fail, Ordering::SeqCst);
    }

    pub fn public_url(&self, key: &str) -> String {
        format!("{}/{}", self.base_url, key)
    }

    /// Content type recorded for an object
    pub fn content_type(&self, key: &str) -> Option<String> {
        let objects = self.objects.read().unwrap_or_else(|e| e.into_inner());
        objects.get(key).map(|o| o.content_type.clone())
    }

    pub fn len(&self) -> usize {
        self.objects.read().unwrap_or_else(|e| e.into_inner()).len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl Default for InMemoryBlobStore {
    fn default() -> Self {
        Self::new("memory://invoices")
    }
}

#[async_trait]
impl BlobStore for InMemoryBlobStore {
    async fn put(&self, key: &str, bytes: Vec<u8>, content_type: &str) -> Result<String> {
        if self.fail_uploads.load(Ordering::SeqCst) {
            return Err(anyhow!("storage unavailable"));
        }

        let mut objects = self
            .objects
            .write()
            .map_err(|e| anyhow!("Failed to acquire write lock: {}", e))?;

        objects.insert(
            key.to_string(),
            StoredObject {
                bytes,
                content_type: content_type.to_string(),
            },
        );

        Ok(self.public_url(key))
    }

    async fn fetch(&self, url: &str) -> Result<Option<Vec<u8>>> {
        let Some(key) = url
            .strip_prefix(self.base_url.as_str())
            .and_then(|rest| rest.strip_prefix('/'))
        else {
            return Ok(None);
        };

        let objects = self
            .objects
            .read()
            .map_err(|e| anyhow!("Failed to acquire read lock: {}", e))?;

        Ok(objects.get(key).map(|o| o.bytes.clone()))
    }
}

/// Serves assets from a fixed map, e.g. logos in tests
#[derive(Clone, Default)]
pub struct StaticAssetFetcher {
    assets: Arc<RwLock<HashMap<String, Vec<u8>>>>,
}

impl StaticAssetFetcher {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&self, url: &str, bytes: Vec<u8>) {
        let mut assets = self.assets.write().unwrap_or_else(|e| e.into_inner());
        assets.insert(url.to_string(), bytes);
    }
}

#[async_trait]
impl AssetFetcher for StaticAssetFetcher {
    async fn fetch(&self, url: &str) -> Result<Vec<u8>> {
        let assets = self
            .assets
            .read()
            .map_err(|e| anyhow!("Failed to acquire read lock: {}", e))?;

        assets
            .get(url)
            .cloned()
            .ok_or_else(|| anyhow!("asset not found: {}", url))
    }
}

/// Records outbound emails instead of sending them
#[derive(Clone, Default)]
pub struct RecordingEmailSender {
    sent: Arc<RwLock<Vec<EmailMessage>>>,
    fail: Arc<AtomicBool>,
}

impl RecordingEmailSender {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make every subsequent send fail
    pub fn fail_sends(&self, fail: bool) {
        self.fail.store(fail, Ordering::SeqCst);
    }

    pub fn sent(&self) -> Vec<EmailMessage> {
        self.sent.read().unwrap_or_else(|e| e.into_inner()).clone()
    }
}

#[async_trait]
impl EmailSender for RecordingEmailSender {
    async fn send(&self, message: EmailMessage) -> Result<String> {
        if self.fail.load(Ordering::SeqCst) {
            return Err(anyhow!("email API rejected the message"));
        }

        let mut sent = self
            .sent
            .write()
            .map_err(|e| anyhow!("Failed to acquire write lock: {}", e))?;
        sent.push(message);

        Ok(format!("mem-{}", sent.len()))
    }
}
