//! Hosted backend over HTTP
//!
//! Tables are reached through a PostgREST-style endpoint
//! (`/rest/v1/<table>?id=eq.<id>`) and objects through the storage API
//! (`/storage/v1/object/<bucket>/<key>`). Both authenticate with the
//! service key as `apikey` header and bearer token.

use crate::config::BackendConfig;
use crate::core::model::{BankAccount, Order, OrderPatch, Shop};
use crate::core::service::{AssetFetcher, BankAccountService, BlobStore, OrderService, ShopService};
use anyhow::{Context, Result, anyhow};
use async_trait::async_trait;
use reqwest::{Client, RequestBuilder, StatusCode};
use serde::Serialize;
use serde::de::DeserializeOwned;
use std::time::Duration;
use uuid::Uuid;

const ORDERS: &str = "orders";
const BANK_ACCOUNTS: &str = "bank_accounts";
const SHOPS: &str = "shops";

fn http_client() -> Result<Client> {
    Client::builder()
        .timeout(Duration::from_secs(20))
        .build()
        .context("failed to build HTTP client")
}

/// Table access against the hosted backend
#[derive(Clone)]
pub struct RestBackend {
    client: Client,
    base_url: String,
    service_key: String,
}

impl RestBackend {
    pub fn new(config: &BackendConfig) -> Result<Self> {
        if !config.is_remote() {
            return Err(anyhow!("backend url is not configured"));
        }
        Ok(Self {
            client: http_client()?,
            base_url: config.url.trim_end_matches('/').to_string(),
            service_key: config.service_key.clone(),
        })
    }

    fn table_url(&self, table: &str) -> String {
        format!("{}/rest/v1/{}", self.base_url, table)
    }

    fn authorized(&self, request: RequestBuilder) -> RequestBuilder {
        request
            .header("apikey", &self.service_key)
            .bearer_auth(&self.service_key)
    }

    async fn select<T: DeserializeOwned>(&self, table: &str, filters: &[(&str, String)]) -> Result<Vec<T>> {
        let response = self
            .authorized(self.client.get(self.table_url(table)))
            .query(&[("select", "*".to_string())])
            .query(filters)
            .send()
            .await
            .with_context(|| format!("GET {} failed", table))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(anyhow!("GET {} returned {}: {}", table, status, body));
        }

        response
            .json::<Vec<T>>()
            .await
            .with_context(|| format!("invalid {} rows", table))
    }

    async fn select_by_id<T: DeserializeOwned>(&self, table: &str, id: &Uuid) -> Result<Option<T>> {
        let rows = self.select(table, &[("id", format!("eq.{}", id))]).await?;
        Ok(rows.into_iter().next())
    }

    async fn write<B, T>(&self, request: RequestBuilder, table: &str, body: &B) -> Result<T>
    where
        B: Serialize + ?Sized,
        T: DeserializeOwned,
    {
        let response = self
            .authorized(request)
            .header("Prefer", "return=representation")
            .json(body)
            .send()
            .await
            .with_context(|| format!("write to {} failed", table))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(anyhow!("write to {} returned {}: {}", table, status, body));
        }

        let rows: Vec<T> = response
            .json()
            .await
            .with_context(|| format!("invalid {} rows", table))?;
        rows.into_iter()
            .next()
            .ok_or_else(|| anyhow!("write to {} affected no rows", table))
    }
}

#[async_trait]
impl OrderService for RestBackend {
    async fn get(&self, id: &Uuid) -> Result<Option<Order>> {
        self.select_by_id(ORDERS, id).await
    }

    async fn patch(&self, id: &Uuid, patch: OrderPatch) -> Result<Order> {
        let request = self
            .client
            .patch(self.table_url(ORDERS))
            .query(&[("id", format!("eq.{}", id))]);
        self.write(request, ORDERS, &patch).await
    }
}

#[async_trait]
impl BankAccountService for RestBackend {
    async fn get(&self, id: &Uuid) -> Result<Option<BankAccount>> {
        self.select_by_id(BANK_ACCOUNTS, id).await
    }

    async fn find_temporary_for_order(&self, order_id: &Uuid) -> Result<Vec<BankAccount>> {
        self.select(
            BANK_ACCOUNTS,
            &[
                ("is_temporary", "eq.true".to_string()),
                ("used_for_order_id", format!("eq.{}", order_id)),
                ("order", "created_at.desc".to_string()),
            ],
        )
        .await
    }

    async fn create(&self, account: BankAccount) -> Result<BankAccount> {
        let request = self.client.post(self.table_url(BANK_ACCOUNTS));
        self.write(request, BANK_ACCOUNTS, &account).await
    }
}

#[async_trait]
impl ShopService for RestBackend {
    async fn get(&self, id: &Uuid) -> Result<Option<Shop>> {
        self.select_by_id(SHOPS, id).await
    }
}

/// Object storage bucket of the hosted backend
#[derive(Clone)]
pub struct ObjectStorage {
    client: Client,
    base_url: String,
    service_key: String,
    bucket: String,
}

impl ObjectStorage {
    pub fn new(config: &BackendConfig) -> Result<Self> {
        if !config.is_remote() {
            return Err(anyhow!("backend url is not configured"));
        }
        Ok(Self {
            client: http_client()?,
            base_url: config.url.trim_end_matches('/').to_string(),
            service_key: config.service_key.clone(),
            bucket: config.bucket.clone(),
        })
    }

    fn object_url(&self, key: &str) -> String {
        format!("{}/storage/v1/object/{}/{}", self.base_url, self.bucket, key)
    }

    /// Public URL of an object in the bucket
    pub fn public_url(&self, key: &str) -> String {
        format!(
            "{}/storage/v1/object/public/{}/{}",
            self.base_url, self.bucket, key
        )
    }
}

#[async_trait]
impl BlobStore for ObjectStorage {
    async fn put(&self, key: &str, bytes: Vec<u8>, content_type: &str) -> Result<String> {
        let response = self
            .client
            .post(self.object_url(key))
            .header("apikey", &self.service_key)
            .bearer_auth(&self.service_key)
            .header("Content-Type", content_type)
            .header("x-upsert", "true")
            .body(bytes)
            .send()
            .await
            .with_context(|| format!("upload of {} failed", key))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(anyhow!("upload of {} returned {}: {}", key, status, body));
        }

        tracing::debug!(bucket = %self.bucket, key = %key, "object stored");
        Ok(self.public_url(key))
    }

    async fn fetch(&self, url: &str) -> Result<Option<Vec<u8>>> {
        let response = self
            .client
            .get(url)
            .send()
            .await
            .with_context(|| format!("download of {} failed", url))?;

        match response.status() {
            StatusCode::NOT_FOUND | StatusCode::BAD_REQUEST => Ok(None),
            status if status.is_success() => Ok(Some(response.bytes().await?.to_vec())),
            status => Err(anyhow!("download of {} returned {}", url, status)),
        }
    }
}

/// Fetches assets such as logos with a plain GET
#[derive(Clone)]
pub struct HttpAssetFetcher {
    client: Client,
}

impl HttpAssetFetcher {
    pub fn new() -> Result<Self> {
        Ok(Self {
            client: http_client()?,
        })
    }
}

#[async_trait]
impl AssetFetcher for HttpAssetFetcher {
    async fn fetch(&self, url: &str) -> Result<Vec<u8>> {
        let response = self
            .client
            .get(url)
            .send()
            .await
            .with_context(|| format!("GET {} failed", url))?
            .error_for_status()?;
        Ok(response.bytes().await?.to_vec())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config() -> BackendConfig {
        BackendConfig {
            url: "https://project.example.co/".to_string(),
            service_key: "key".to_string(),
            bucket: "invoices".to_string(),
        }
    }

    #[test]
    fn test_urls() {
        let backend = RestBackend::new(&config()).unwrap();
        assert_eq!(
            backend.table_url("orders"),
            "https://project.example.co/rest/v1/orders"
        );

        let storage = ObjectStorage::new(&config()).unwrap();
        assert_eq!(
            storage.object_url("Rechnung_1_de.pdf"),
            "https://project.example.co/storage/v1/object/invoices/Rechnung_1_de.pdf"
        );
        assert_eq!(
            storage.public_url("Rechnung_1_de.pdf"),
            "https://project.example.co/storage/v1/object/public/invoices/Rechnung_1_de.pdf"
        );
    }

    #[test]
    fn test_requires_backend_url() {
        let config = BackendConfig::default();
        assert!(RestBackend::new(&config).is_err());
        assert!(ObjectStorage::new(&config).is_err());
    }
}
